use serde::{Deserialize, Serialize};

/// Ready time shown when the remote source doesn't know it.
pub const DEFAULT_READY_MINUTES: i64 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub title: String,
    /// Raw value from the source; 0 means unknown.
    #[serde(default)]
    pub ready_in_minutes: i64,
    #[serde(default)]
    pub is_favourite: bool,
}

impl Recipe {
    /// Minutes to display, substituting the default for an unknown (0) value.
    #[must_use]
    pub fn display_ready_minutes(&self) -> i64 {
        if self.ready_in_minutes > 0 {
            self.ready_in_minutes
        } else {
            DEFAULT_READY_MINUTES
        }
    }

    #[must_use]
    pub fn with_favourite(mut self, is_favourite: bool) -> Self {
        self.is_favourite = is_favourite;
        self
    }
}

/// Persisted row for a favourited recipe. Exists iff the recipe is a favourite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub id: i64,
    pub image_url: String,
    pub title: String,
    pub ready_in_minutes: i64,
    #[serde(default)]
    pub favourited_at: String,
}

impl FavoriteRecord {
    #[must_use]
    pub fn into_recipe(self) -> Recipe {
        Recipe {
            id: self.id,
            image_url: self.image_url,
            title: self.title,
            ready_in_minutes: self.ready_in_minutes,
            is_favourite: true,
        }
    }
}

impl From<&Recipe> for FavoriteRecord {
    fn from(r: &Recipe) -> Self {
        FavoriteRecord {
            id: r.id,
            image_url: r.image_url.clone(),
            title: r.title.clone(),
            ready_in_minutes: r.ready_in_minutes,
            favourited_at: String::new(),
        }
    }
}

/// Trim and lowercase a query, falling back to `default_term` when blank.
#[must_use]
pub fn normalize_query(text: &str, default_term: &str) -> String {
    let q = text.trim().to_lowercase();
    if q.is_empty() {
        default_term.to_string()
    } else {
        q
    }
}
