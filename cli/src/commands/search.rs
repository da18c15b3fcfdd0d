use anyhow::Result;

use super::Engine;
use super::helpers::print_list;

pub(crate) async fn cmd_search(engine: &Engine, query: &str, json: bool) -> Result<()> {
    engine.search_now(query).await?;
    let state = engine.snapshot();
    print_list(&state.search, json, &format!("No recipes found for '{query}'"))
}

pub(crate) async fn cmd_popular(engine: &Engine, json: bool) -> Result<()> {
    engine.load_popular().await?;
    print_list(&engine.snapshot().popular, json, "No popular recipes right now")
}

pub(crate) async fn cmd_favourites(engine: &Engine, json: bool) -> Result<()> {
    engine.load_favourites().await?;
    print_list(
        &engine.snapshot().favorites,
        json,
        "No favourites yet. Add one with `recipes toggle <id>`",
    )
}
