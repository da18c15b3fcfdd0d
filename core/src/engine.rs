//! Search/load orchestration.
//!
//! [`SearchEngine`] owns the published [`BrowseState`]. Fetches and store
//! calls run as independent tasks; each one ends in a single `dispatch`, which
//! is the only place state changes. A fetch result is applied only if its
//! generation is still the latest issued for that list.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::merge::merge_favourites;
use crate::models::{FavoriteRecord, Recipe, normalize_query};
use crate::service::{FavoritesStore, RecipeSource, toggle_favourite};
use crate::state::{BrowseState, Event, ListKind, reduce};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_QUERY: &str = "chicken";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Quiet period after the last query edit before searching.
    pub debounce: Duration,
    /// Term searched when the query is blank.
    pub default_query: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            default_query: DEFAULT_QUERY.to_string(),
        }
    }
}

pub struct SearchEngine<R, S> {
    inner: Arc<Inner<R, S>>,
}

impl<R, S> Clone for SearchEngine<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<R, S> {
    source: R,
    store: S,
    config: EngineConfig,
    state: watch::Sender<BrowseState>,
    pending_search: Mutex<Option<JoinHandle<()>>>,
    toggle_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
    /// Bumped after every committed favourite write.
    favourites_epoch: AtomicU64,
}

impl<R: RecipeSource, S: FavoritesStore> SearchEngine<R, S> {
    pub fn new(source: R, store: S, config: EngineConfig) -> Self {
        let (state, _) = watch::channel(BrowseState::default());
        Self {
            inner: Arc::new(Inner {
                source,
                store,
                config,
                state,
                pending_search: Mutex::new(None),
                toggle_locks: Mutex::new(HashMap::new()),
                favourites_epoch: AtomicU64::new(0),
            }),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BrowseState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> BrowseState {
        self.inner.state.borrow().clone()
    }

    /// Initial load: popular, the default search, and favourites.
    pub fn start(&self) -> JoinHandle<()> {
        let handles: Vec<JoinHandle<()>> = ListKind::ALL
            .into_iter()
            .map(|list| self.spawn_fetch(list))
            .collect();
        tokio::spawn(join_all(handles))
    }

    /// Record a query edit and schedule a debounced search.
    ///
    /// The text is published immediately. A pending search from an earlier
    /// edit is cancelled before it reaches the network.
    pub fn set_query(&self, text: impl Into<String>) {
        let next = self.inner.dispatch(Event::QueryChanged(text.into()));
        let generation = next.query.generation;
        let delay = self.inner.config.debounce;
        let engine = self.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let current = engine.inner.state.borrow().query.generation;
            if current != generation {
                debug!(generation, current, "debounced search overtaken by newer query");
                return;
            }
            // Detached so cancelling the timer never aborts an issued request
            drop(engine.spawn_fetch(ListKind::Search));
        });

        self.inner.replace_pending_search(Some(task));
    }

    /// Set the query and search right away, skipping the debounce.
    pub fn search_now(&self, text: impl Into<String>) -> JoinHandle<()> {
        self.inner.replace_pending_search(None);
        self.inner.dispatch(Event::QueryChanged(text.into()));
        self.spawn_fetch(ListKind::Search)
    }

    /// Reset the query and reload the default search.
    pub fn clear_search(&self) -> JoinHandle<()> {
        self.search_now(String::new())
    }

    pub fn load_popular(&self) -> JoinHandle<()> {
        self.spawn_fetch(ListKind::Popular)
    }

    pub fn load_favourites(&self) -> JoinHandle<()> {
        self.spawn_fetch(ListKind::Favorites)
    }

    /// Refetch popular and the current search, and re-flag what is already
    /// published against the store.
    pub fn refresh(&self) -> JoinHandle<()> {
        self.inner.replace_pending_search(None);
        let handles = vec![
            self.spawn_fetch(ListKind::Popular),
            self.spawn_fetch(ListKind::Search),
        ];
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = inner.reconcile().await {
                warn!(error = %e, "couldn't reconcile favourites during refresh");
            }
            join_all(handles).await;
        })
    }

    /// Re-flag published recipes and rebuild the favourites list from the
    /// store without refetching remote lists.
    pub async fn reconcile_favourites(&self) -> Result<(), SyncError> {
        self.inner.reconcile().await
    }

    /// Flip a recipe's favourite state.
    ///
    /// The published lists change before the store is written and are put
    /// back if the write fails. Toggles of the same id run one after another;
    /// each sees the outcome of the one before it.
    pub async fn toggle_favourite(&self, recipe: Recipe) -> Result<Recipe, SyncError> {
        let id = recipe.id;
        let lock = self.inner.toggle_lock(id);
        let result = {
            let _guard = lock.lock().await;
            let current = self
                .inner
                .state
                .borrow()
                .favourite_flag(id)
                .unwrap_or(recipe.is_favourite);
            self.inner.apply_favourite(recipe, current, !current).await
        };
        drop(lock);
        self.inner.release_toggle_lock(id);
        result
    }

    /// Unfavourite regardless of the published flag.
    pub async fn remove_favourite(&self, recipe: Recipe) -> Result<Recipe, SyncError> {
        let id = recipe.id;
        let lock = self.inner.toggle_lock(id);
        let result = {
            let _guard = lock.lock().await;
            let current = self
                .inner
                .state
                .borrow()
                .favourite_flag(id)
                .unwrap_or(recipe.is_favourite);
            self.inner.apply_favourite(recipe, current, false).await
        };
        drop(lock);
        self.inner.release_toggle_lock(id);
        result
    }

    pub fn dismiss_notice(&self) {
        self.inner.dispatch(Event::NoticeDismissed);
    }

    fn spawn_fetch(&self, list: ListKind) -> JoinHandle<()> {
        let issued = self.inner.dispatch(Event::FetchIssued(list));
        let generation = issued.list(list).generation;
        let term = normalize_query(&issued.query.text, &self.inner.config.default_query);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run_fetch(list, generation, term).await })
    }
}

impl<R: RecipeSource, S: FavoritesStore> Inner<R, S> {
    /// Replace the published state with `reduce(current, event)`.
    fn dispatch(&self, event: Event) -> BrowseState {
        let mut published = BrowseState::default();
        self.state.send_if_modified(|current| {
            let next = reduce(current, event);
            if next == *current {
                published = next;
                return false;
            }
            published = next.clone();
            *current = next;
            true
        });
        published
    }

    fn epoch(&self) -> u64 {
        self.favourites_epoch.load(Ordering::SeqCst)
    }

    fn replace_pending_search(&self, task: Option<JoinHandle<()>>) {
        let mut pending = self
            .pending_search
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = pending.take() {
            old.abort();
        }
        *pending = task;
    }

    async fn run_fetch(&self, list: ListKind, generation: u64, term: String) {
        let outcome = self.fetch_list(list, &term).await;

        let (event, epoch) = match outcome {
            Ok((recipes, epoch)) => (
                Event::FetchSucceeded {
                    list,
                    generation,
                    recipes,
                },
                Some(epoch),
            ),
            Err(e) => (
                Event::FetchFailed {
                    list,
                    generation,
                    message: e.to_string(),
                },
                None,
            ),
        };
        let failed = matches!(event, Event::FetchFailed { .. });

        let after = self.dispatch(event);
        let applied = after.list(list);
        if applied.generation != generation {
            debug!(
                ?list,
                error = %SyncError::SupersededFetch(generation),
                "discarded stale response"
            );
            return;
        }

        if failed {
            warn!(?list, generation, error = ?applied.error, "list failed to load");
        } else {
            info!(?list, generation, count = applied.recipes.len(), "list loaded");
        }

        // A toggle committed after the ids were read; re-flag from the store.
        if epoch.is_some_and(|e| e != self.epoch()) {
            if let Err(e) = self.reconcile().await {
                warn!(error = %e, "couldn't reconcile favourites after load");
            }
        }
    }

    /// Fetch one list, merged with favourite ids read after the remote
    /// call returns. Also returns the favourites epoch seen before that read.
    async fn fetch_list(
        &self,
        list: ListKind,
        term: &str,
    ) -> Result<(Vec<Recipe>, u64), SyncError> {
        let remote = match list {
            ListKind::Search => self.source.search(term).await?,
            ListKind::Popular => self.source.popular().await?,
            ListKind::Favorites => {
                let epoch = self.epoch();
                let records = self
                    .store
                    .list_all()
                    .await
                    .map_err(|e| SyncError::read_failed(&e))?;
                let recipes = records
                    .into_iter()
                    .map(FavoriteRecord::into_recipe)
                    .collect();
                return Ok((recipes, epoch));
            }
        };

        let epoch = self.epoch();
        let ids = self
            .store
            .list_all_ids()
            .await
            .map_err(|e| SyncError::read_failed(&e))?;
        Ok((merge_favourites(remote, &ids), epoch))
    }

    async fn reconcile(&self) -> Result<(), SyncError> {
        loop {
            let epoch = self.epoch();
            let favourites: Vec<Recipe> = self
                .store
                .list_all()
                .await
                .map_err(|e| SyncError::read_failed(&e))?
                .into_iter()
                .map(FavoriteRecord::into_recipe)
                .collect();
            debug!(favourites = favourites.len(), "reconciling published lists");
            self.dispatch(Event::FavouritesReconciled(favourites));
            if self.epoch() == epoch {
                return Ok(());
            }
        }
    }

    fn toggle_lock(&self, id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .toggle_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    fn release_toggle_lock(&self, id: i64) {
        let mut locks = self
            .toggle_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if locks.get(&id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&id);
        }
    }

    /// Optimistically publish `target`, persist it, and roll back on failure.
    async fn apply_favourite(
        &self,
        recipe: Recipe,
        current: bool,
        target: bool,
    ) -> Result<Recipe, SyncError> {
        let before = recipe.with_favourite(current);
        self.dispatch(Event::FavouritePatched {
            recipe: before.clone(),
            is_favourite: target,
        });

        // The coordinator performs the inverse of the flag it is handed
        let request = before.clone().with_favourite(!target);
        match toggle_favourite(&self.store, &request).await {
            Ok(updated) => {
                self.favourites_epoch.fetch_add(1, Ordering::SeqCst);
                self.dispatch(Event::FavouritePatched {
                    recipe: updated.clone(),
                    is_favourite: updated.is_favourite,
                });
                info!(
                    id = updated.id,
                    is_favourite = updated.is_favourite,
                    title = %updated.title,
                    "favourite updated"
                );
                Ok(updated)
            }
            Err(e) => {
                warn!(id = before.id, error = %e, "favourite update failed, rolling back");
                self.dispatch(Event::ToggleFailed {
                    recipe: before,
                    restore: current,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

async fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "load task ended abnormally");
        }
    }
}
