//! App Configuration

use serde::Deserialize;

use crate::edit::DEFAULT_TAGS;
use crate::lists::DEFAULT_FOLDER_TITLE;

/// Name stamped on every log line
pub const APP_NAME: &str = "task-lists";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API root; empty means `{origin}/api` in the browser
    pub api_base: String,
    pub folder_title: String,
    pub default_tags: Vec<String>,
    /// Records kept by the in-memory log
    pub log_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            folder_title: DEFAULT_FOLDER_TITLE.to_string(),
            default_tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            log_capacity: 500,
        }
    }
}

impl AppConfig {
    /// Defaults plus the API root baked in at build time
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(base) = option_env!("TASKLISTS_API_BASE") {
            config.api_base = base.to_string();
        }
        config
    }

    /// API root, falling back to `{origin}/api`
    pub fn api_base_or(&self, origin: &str) -> String {
        if self.api_base.trim().is_empty() {
            format!("{}/api", origin.trim_end_matches('/'))
        } else {
            self.api_base.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"api_base":"http://localhost:5000/api"}"#).unwrap();
        assert_eq!(config.api_base, "http://localhost:5000/api");
        assert_eq!(config.folder_title, "Task Folder");
        assert_eq!(config.default_tags.len(), 7);
    }

    #[test]
    fn test_api_base_falls_back_to_origin() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_or("https://tasks.example/"), "https://tasks.example/api");
    }
}
