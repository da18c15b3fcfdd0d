use serde::Deserialize;

use crate::models::Recipe;

pub const BASE_URL: &str = "https://api.spoonacular.com/recipes/";

/// Body of `complexSearch`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<RecipeData>,
}

/// Body of `random`.
#[derive(Debug, Deserialize)]
pub struct RandomResponse {
    #[serde(default)]
    pub recipes: Vec<RecipeData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeData {
    pub id: i64,
    pub image: Option<String>,
    pub title: Option<String>,
    pub ready_in_minutes: Option<i64>,
}

/// Normalize a wire item. Missing strings become empty, missing or negative
/// ready time becomes 0 (unknown).
#[must_use]
pub fn data_to_recipe(d: RecipeData) -> Recipe {
    Recipe {
        id: d.id,
        image_url: d.image.unwrap_or_default(),
        title: d.title.unwrap_or_default(),
        ready_in_minutes: d.ready_in_minutes.unwrap_or(0).max(0),
        is_favourite: false,
    }
}
