//! # Configuration Module
//!
//! Runtime settings for the shopping list binary. Every field has a
//! documented default and can be overridden through `SHOPPING_LIST_*`
//! environment variables (a `.env` file is loaded by the binary first).

use std::env;
use std::path::PathBuf;

use tracing::debug;

use crate::localization::detect_language;
use crate::share_codec::DEFAULT_SHARE_PARAM;
use crate::shopping_list::{ShoppingListStore, DEFAULT_STORAGE_KEY};
use crate::storage::Storage;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/shopping_list.html";
pub const DEFAULT_DATABASE_PATH: &str = "shopping_list.db";
pub const DEFAULT_CATALOG_PATH: &str = "data/recipes.json";

pub const ENV_STORAGE_KEY: &str = "SHOPPING_LIST_STORAGE_KEY";
pub const ENV_SHARE_PARAM: &str = "SHOPPING_LIST_SHARE_PARAM";
pub const ENV_BASE_URL: &str = "SHOPPING_LIST_BASE_URL";
pub const ENV_LANGUAGE: &str = "SHOPPING_LIST_LANG";
pub const ENV_DATABASE_PATH: &str = "SHOPPING_LIST_DB";
pub const ENV_CATALOG_PATH: &str = "SHOPPING_LIST_CATALOG";
pub const ENV_LOG_JSON: &str = "SHOPPING_LIST_LOG_JSON";

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Key of the persisted shopping list document
    pub storage_key: String,
    /// Query parameter carrying share payloads
    pub share_param: String,
    /// Shopping list page that share links point to
    pub base_url: String,
    /// Message language ("en" or "zh")
    pub language: String,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Recipe catalog JSON file
    pub catalog_path: PathBuf,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            share_param: DEFAULT_SHARE_PARAM.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: detect_language(None),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`. Blank values are ignored.
    ///
    /// Without an explicit language setting the system `LANG` is consulted.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(storage_key) = get(ENV_STORAGE_KEY) {
            config.storage_key = storage_key;
        }
        if let Some(share_param) = get(ENV_SHARE_PARAM) {
            config.share_param = share_param;
        }
        if let Some(base_url) = get(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        config.language = detect_language(get(ENV_LANGUAGE).or_else(|| get("LANG")).as_deref());
        if let Some(path) = get(ENV_DATABASE_PATH) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(path) = get(ENV_CATALOG_PATH) {
            config.catalog_path = PathBuf::from(path);
        }
        if let Some(flag) = get(ENV_LOG_JSON) {
            config.log_json = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        debug!(?config, "Loaded configuration");
        config
    }

    /// A store over `storage` using this configuration's key and share parameter
    pub fn store<S: Storage>(&self, storage: S) -> ShoppingListStore<S> {
        ShoppingListStore::new(storage)
            .with_storage_key(&self.storage_key)
            .with_share_param(&self.share_param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.storage_key, "shoppingList");
        assert_eq!(config.share_param, "share");
        assert_eq!(config.language, "en");
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert!(!config.log_json);
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_STORAGE_KEY, "list-2"),
            (ENV_SHARE_PARAM, "s"),
            (ENV_BASE_URL, "https://recipes.example/list.html"),
            (ENV_DATABASE_PATH, "/tmp/list.db"),
            (ENV_CATALOG_PATH, "  "),
            (ENV_LOG_JSON, "true"),
            ("LANG", "zh_CN.UTF-8"),
        ]));

        assert_eq!(config.storage_key, "list-2");
        assert_eq!(config.share_param, "s");
        assert_eq!(config.base_url, "https://recipes.example/list.html");
        assert_eq!(config.database_path, PathBuf::from("/tmp/list.db"));
        assert_eq!(config.catalog_path, PathBuf::from(DEFAULT_CATALOG_PATH));
        assert_eq!(config.language, "zh");
        assert!(config.log_json);
    }

    #[test]
    fn test_explicit_language_wins_over_lang() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_LANGUAGE, "en"), ("LANG", "zh_CN.UTF-8")]));
        assert_eq!(config.language, "en");
    }
}
