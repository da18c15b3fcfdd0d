use anyhow::{Result, bail};

use recipe_search_core::models::Recipe;
use recipe_search_core::state::BrowseState;

use super::Engine;

/// Locate a recipe among the published lists, search results first.
pub(crate) fn find_recipe(state: &BrowseState, id: i64) -> Option<Recipe> {
    state
        .search
        .find(id)
        .or_else(|| state.popular.find(id))
        .or_else(|| state.favorites.find(id))
        .cloned()
}

fn report(recipe: &Recipe, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(recipe)?);
    } else if recipe.is_favourite {
        println!("Added to favourites: {} (id: {})", recipe.title, recipe.id);
    } else {
        println!("Removed from favourites: {} (id: {})", recipe.title, recipe.id);
    }
    Ok(())
}

pub(crate) async fn cmd_toggle(
    engine: &Engine,
    id: i64,
    query: Option<String>,
    json: bool,
) -> Result<()> {
    let loads = [
        engine.load_favourites(),
        engine.load_popular(),
        engine.search_now(query.unwrap_or_default()),
    ];
    for load in loads {
        load.await?;
    }

    let state = engine.snapshot();
    let Some(recipe) = find_recipe(&state, id) else {
        if let Some(error) = state.search.error.or(state.popular.error) {
            bail!("Recipe {id} not found ({error})");
        }
        bail!("Recipe {id} not found in popular recipes, search results or favourites. Try --query");
    };

    let updated = engine.toggle_favourite(recipe).await?;
    report(&updated, json)
}

pub(crate) async fn cmd_unfavourite(engine: &Engine, id: i64, json: bool) -> Result<()> {
    engine.load_favourites().await?;

    let state = engine.snapshot();
    if let Some(error) = state.favorites.error {
        bail!("{error}");
    }
    let Some(recipe) = state.favorites.find(id).cloned() else {
        bail!("Recipe {id} is not a favourite");
    };

    let updated = engine.remove_favourite(recipe).await?;
    report(&updated, json)
}
