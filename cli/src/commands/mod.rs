mod browse;
mod favourite;
mod helpers;
mod search;

use recipe_search_core::engine::SearchEngine;
use recipe_search_core::service::LocalFavorites;

use crate::spoonacular::SpoonacularClient;

pub(crate) use browse::cmd_browse;
pub(crate) use favourite::{cmd_toggle, cmd_unfavourite};
pub(crate) use search::{cmd_favourites, cmd_popular, cmd_search};

pub(crate) type Engine = SearchEngine<SpoonacularClient, LocalFavorites>;
