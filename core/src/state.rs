//! Published browse state and the pure reducer that produces each new value.
//!
//! The engine never edits a [`BrowseState`] in place: every transition is
//! `reduce(&current, event)`, and the result replaces the published value.

use std::collections::HashSet;

use crate::merge::merge_favourites;
use crate::models::Recipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Search,
    Popular,
    Favorites,
}

impl ListKind {
    pub const ALL: [ListKind; 3] = [ListKind::Search, ListKind::Popular, ListKind::Favorites];
}

/// One published list.
///
/// `generation` is the latest fetch issued for this list; only a response
/// tagged with it may change `recipes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    pub recipes: Vec<Recipe>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub generation: u64,
}

impl ListState {
    #[must_use]
    pub fn find(&self, id: i64) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub text: String,
    pub is_searching: bool,
    /// Bumped on every text change; a debounced fetch only fires if it still
    /// matches.
    pub generation: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseState {
    pub query: QueryState,
    pub search: ListState,
    pub popular: ListState,
    pub favorites: ListState,
    /// Transient, non-blocking message from the last failed toggle.
    pub notice: Option<String>,
}

impl BrowseState {
    #[must_use]
    pub fn list(&self, kind: ListKind) -> &ListState {
        match kind {
            ListKind::Search => &self.search,
            ListKind::Popular => &self.popular,
            ListKind::Favorites => &self.favorites,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut ListState {
        match kind {
            ListKind::Search => &mut self.search,
            ListKind::Popular => &mut self.popular,
            ListKind::Favorites => &mut self.favorites,
        }
    }

    /// Favourite flag as currently published, if the recipe is visible anywhere.
    #[must_use]
    pub fn favourite_flag(&self, id: i64) -> Option<bool> {
        self.search
            .find(id)
            .or_else(|| self.popular.find(id))
            .map(|r| r.is_favourite)
            .or_else(|| self.favorites.find(id).map(|_| true))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    QueryChanged(String),
    FetchIssued(ListKind),
    FetchSucceeded {
        list: ListKind,
        generation: u64,
        recipes: Vec<Recipe>,
    },
    FetchFailed {
        list: ListKind,
        generation: u64,
        message: String,
    },
    /// Optimistic flip of one recipe in every list.
    FavouritePatched { recipe: Recipe, is_favourite: bool },
    /// Fresh read of the store: re-flag published search and popular items
    /// and replace the favourites list, in store order.
    FavouritesReconciled(Vec<Recipe>),
    /// Undo an optimistic patch and surface the failure.
    ToggleFailed {
        recipe: Recipe,
        restore: bool,
        message: String,
    },
    NoticeDismissed,
}

#[must_use]
pub fn reduce(state: &BrowseState, event: Event) -> BrowseState {
    let mut next = state.clone();
    match event {
        Event::QueryChanged(text) => {
            next.query = QueryState {
                is_searching: !text.trim().is_empty(),
                text,
                generation: state.query.generation + 1,
            };
        }
        Event::FetchIssued(kind) => {
            let list = next.list_mut(kind);
            list.generation += 1;
            list.is_loading = true;
        }
        Event::FetchSucceeded {
            list: kind,
            generation,
            recipes,
        } => {
            let list = next.list_mut(kind);
            if list.generation != generation {
                return next;
            }
            list.recipes = recipes;
            list.error = None;
            list.is_loading = false;
        }
        Event::FetchFailed {
            list: kind,
            generation,
            message,
        } => {
            let list = next.list_mut(kind);
            if list.generation != generation {
                return next;
            }
            // Last good data stays visible
            list.error = Some(message);
            list.is_loading = false;
        }
        Event::FavouritePatched {
            recipe,
            is_favourite,
        } => patch_favourite(&mut next, &recipe, is_favourite),
        Event::FavouritesReconciled(favourites) => {
            let ids: HashSet<i64> = favourites.iter().map(|r| r.id).collect();
            next.search.recipes = merge_favourites(next.search.recipes, &ids);
            next.popular.recipes = merge_favourites(next.popular.recipes, &ids);
            next.favorites.recipes = favourites;
            next.favorites.error = None;
        }
        Event::ToggleFailed {
            recipe,
            restore,
            message,
        } => {
            patch_favourite(&mut next, &recipe, restore);
            next.notice = Some(message);
        }
        Event::NoticeDismissed => next.notice = None,
    }
    next
}

fn patch_favourite(state: &mut BrowseState, recipe: &Recipe, is_favourite: bool) {
    for list in [&mut state.search, &mut state.popular] {
        for r in list.recipes.iter_mut().filter(|r| r.id == recipe.id) {
            r.is_favourite = is_favourite;
        }
    }

    let favorites = &mut state.favorites.recipes;
    if is_favourite {
        if !favorites.iter().any(|r| r.id == recipe.id) {
            favorites.push(recipe.clone().with_favourite(true));
        }
    } else {
        favorites.retain(|r| r.id != recipe.id);
    }
}
