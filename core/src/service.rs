use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::debug;

use crate::db::Database;
use crate::error::{NetworkError, SyncError};
use crate::models::{FavoriteRecord, Recipe};

/// Remote recipe lookup.
///
/// The CLI implements this with reqwest against Spoonacular. Results carry no
/// favourite state; the engine merges that in. Implementations own network
/// timeouts.
pub trait RecipeSource: Send + Sync + 'static {
    fn search(&self, query: &str)
    -> impl Future<Output = Result<Vec<Recipe>, NetworkError>> + Send;
    fn popular(&self) -> impl Future<Output = Result<Vec<Recipe>, NetworkError>> + Send;
}

/// Durable set of favourite recipes keyed by id.
pub trait FavoritesStore: Send + Sync + 'static {
    /// Upsert: replaces an existing record with the same id.
    fn insert(&self, record: FavoriteRecord) -> impl Future<Output = Result<()>> + Send;
    /// No-op when the id is absent.
    fn delete(&self, id: i64) -> impl Future<Output = Result<()>> + Send;
    fn list_all(&self) -> impl Future<Output = Result<Vec<FavoriteRecord>>> + Send;
    fn list_all_ids(&self) -> impl Future<Output = Result<HashSet<i64>>> + Send;
}

/// SQLite-backed favourites. Calls run on the blocking pool.
#[derive(Clone)]
pub struct LocalFavorites {
    db: Arc<Mutex<Database>>,
}

impl LocalFavorites {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let db = db.lock().unwrap_or_else(PoisonError::into_inner);
            f(&db)
        })
        .await
        .context("favourites task failed")?
    }
}

impl FavoritesStore for LocalFavorites {
    async fn insert(&self, record: FavoriteRecord) -> Result<()> {
        self.with_db(move |db| db.insert_favourite(&record).map(|_| ()))
            .await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let removed = self.with_db(move |db| db.delete_favourite(id)).await?;
        if !removed {
            debug!(id, "delete of non-favourite recipe was a no-op");
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<FavoriteRecord>> {
        self.with_db(Database::list_favourites).await
    }

    async fn list_all_ids(&self) -> Result<HashSet<i64>> {
        self.with_db(Database::list_favourite_ids).await
    }
}

/// Perform the inverse persistence operation for `recipe` and return it with
/// the flipped flag. On error nothing may be assumed about the new state.
pub async fn toggle_favourite<S: FavoritesStore>(
    store: &S,
    recipe: &Recipe,
) -> Result<Recipe, SyncError> {
    if recipe.is_favourite {
        store
            .delete(recipe.id)
            .await
            .map_err(|e| SyncError::PersistenceDeleteFailed {
                id: recipe.id,
                reason: format!("{e:#}"),
            })?;
        Ok(recipe.clone().with_favourite(false))
    } else {
        store
            .insert(FavoriteRecord::from(recipe))
            .await
            .map_err(|e| SyncError::PersistenceInsertFailed {
                id: recipe.id,
                reason: format!("{e:#}"),
            })?;
        Ok(recipe.clone().with_favourite(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: i64, is_favourite: bool) -> Recipe {
        Recipe {
            id,
            image_url: format!("{id}.jpg"),
            title: format!("Recipe {id}"),
            ready_in_minutes: 20,
            is_favourite,
        }
    }

    /// Store whose writes always fail.
    struct BrokenStore;

    impl FavoritesStore for BrokenStore {
        async fn insert(&self, _record: FavoriteRecord) -> Result<()> {
            anyhow::bail!("database is locked")
        }
        async fn delete(&self, _id: i64) -> Result<()> {
            anyhow::bail!("database is locked")
        }
        async fn list_all(&self) -> Result<Vec<FavoriteRecord>> {
            Ok(Vec::new())
        }
        async fn list_all_ids(&self) -> Result<HashSet<i64>> {
            Ok(HashSet::new())
        }
    }

    #[tokio::test]
    async fn test_toggle_inserts_then_deletes() {
        let store = LocalFavorites::open_in_memory().unwrap();

        let on = toggle_favourite(&store, &recipe(5, false)).await.unwrap();
        assert!(on.is_favourite);
        assert_eq!(store.list_all_ids().await.unwrap(), HashSet::from([5]));
        let records = store.list_all().await.unwrap();
        assert_eq!(records[0].title, "Recipe 5");

        let off = toggle_favourite(&store, &on).await.unwrap();
        assert!(!off.is_favourite);
        assert!(store.list_all_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_preserves_fields() {
        let store = LocalFavorites::open_in_memory().unwrap();
        let before = recipe(8, false);
        let after = toggle_favourite(&store, &before).await.unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.title, before.title);
        assert_eq!(after.image_url, before.image_url);
        assert_eq!(after.ready_in_minutes, before.ready_in_minutes);
    }

    #[tokio::test]
    async fn test_toggle_reports_operation_specific_errors() {
        let err = toggle_favourite(&BrokenStore, &recipe(1, false))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::PersistenceInsertFailed { id: 1, .. }));

        let err = toggle_favourite(&BrokenStore, &recipe(1, true))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::PersistenceDeleteFailed { id: 1, .. }));
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let store = LocalFavorites::open_in_memory().unwrap();
        store.delete(99).await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
