use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use recipe_search_core::error::NetworkError;
use recipe_search_core::models::Recipe;
use recipe_search_core::service::RecipeSource;
use recipe_search_core::spoonacular::{BASE_URL, RandomResponse, SearchResponse, data_to_recipe};

/// How many recipes `random` returns for the popular list.
const POPULAR_COUNT: &str = "10";

pub struct SpoonacularClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SpoonacularClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("recipe-search/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, NetworkError> {
        let resp = self
            .client
            .get(self.endpoint(path))
            .query(params)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NetworkError::ServerError(status.as_u16()));
        }

        resp.json()
            .await
            .map_err(|e| NetworkError::Unreachable(format!("unreadable response: {e}")))
    }

    pub async fn search_async(&self, query: &str) -> Result<Vec<Recipe>, NetworkError> {
        let data: SearchResponse = self
            .get(
                "complexSearch",
                &[("query", query), ("addRecipeInformation", "true")],
            )
            .await?;
        Ok(data.results.into_iter().map(data_to_recipe).collect())
    }

    pub async fn popular_async(&self) -> Result<Vec<Recipe>, NetworkError> {
        let data: RandomResponse = self.get("random", &[("number", POPULAR_COUNT)]).await?;
        Ok(data.recipes.into_iter().map(data_to_recipe).collect())
    }
}

impl RecipeSource for SpoonacularClient {
    async fn search(&self, query: &str) -> Result<Vec<Recipe>, NetworkError> {
        self.search_async(query).await
    }

    async fn popular(&self) -> Result<Vec<Recipe>, NetworkError> {
        self.popular_async().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SpoonacularClient {
        SpoonacularClient::new(std::env::var("SPOONACULAR_API_KEY").unwrap_or_default()).unwrap()
    }

    #[test]
    fn test_endpoint() {
        let c = client();
        assert_eq!(
            c.endpoint("complexSearch"),
            "https://api.spoonacular.com/recipes/complexSearch"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_maps_to_unreachable() {
        let mut c = client();
        // Port 9 (discard) on localhost refuses connections
        c.base_url = "http://127.0.0.1:9/".to_string();
        let err = c.search_async("pasta").await.unwrap_err();
        assert!(matches!(err, NetworkError::Unreachable(_)));
    }

    // --- Integration tests (hit the real Spoonacular API) ---

    #[tokio::test]
    #[ignore = "hits Spoonacular API; needs SPOONACULAR_API_KEY"]
    async fn test_search_returns_results() {
        let results = client().search_async("pasta").await.unwrap();
        assert!(!results.is_empty());
        for r in &results {
            assert!(r.id > 0);
            assert!(!r.is_favourite);
        }
    }

    #[tokio::test]
    #[ignore = "hits Spoonacular API; needs SPOONACULAR_API_KEY"]
    async fn test_popular_returns_ten() {
        let results = client().popular_async().await.unwrap();
        assert_eq!(results.len(), 10);
    }

    #[tokio::test]
    #[ignore = "hits Spoonacular API"]
    async fn test_bad_key_is_server_error() {
        let c = SpoonacularClient::new("not-a-key".to_string()).unwrap();
        let err = c.popular_async().await.unwrap_err();
        assert!(matches!(err, NetworkError::ServerError(401)));
    }
}
