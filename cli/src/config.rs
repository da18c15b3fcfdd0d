use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use std::path::PathBuf;

const API_KEY_ENV: &str = "SPOONACULAR_API_KEY";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("", "", "recipe-search")
            .context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("recipes.db");

        Ok(Config { db_path, data_dir })
    }

    /// Spoonacular key from `SPOONACULAR_API_KEY`, else `<data_dir>/api_key`.
    pub fn load_api_key(&self) -> Result<String> {
        api_key_from(std::env::var(API_KEY_ENV).ok(), &self.data_dir.join("api_key"))
    }
}

fn api_key_from(env_value: Option<String>, path: &std::path::Path) -> Result<String> {
    if let Some(key) = env_value.map(|k| k.trim().to_string()) {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    if path.exists() {
        let key = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read API key file: {}", path.display()))?;
        let key = key.trim().to_string();
        if !key.is_empty() {
            return Ok(key);
        }
    }

    bail!(
        "No Spoonacular API key. Set {API_KEY_ENV} or write the key to {}",
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_key");
        std::fs::write(&path, "from-file").unwrap();

        let key = api_key_from(Some(" from-env ".to_string()), &path).unwrap();
        assert_eq!(key, "from-env");
    }

    #[test]
    fn test_file_key_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_key");
        std::fs::write(&path, "abc123\n").unwrap();

        assert_eq!(api_key_from(None, &path).unwrap(), "abc123");
        // Blank env value falls through to the file
        assert_eq!(api_key_from(Some(String::new()), &path).unwrap(), "abc123");
    }

    #[test]
    fn test_missing_key_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_key");
        let err = api_key_from(None, &path).unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));

        std::fs::write(&path, "   ").unwrap();
        assert!(api_key_from(None, &path).is_err());
    }
}
