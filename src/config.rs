use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Crate configuration, read from a TOML file.
///
/// ```toml
/// stopwords_path = "resources/stopwords.txt"
/// hazard_keywords_path = "config/hazard_keywords.json"
/// impact_keywords_path = "config/damage_keywords.json"
/// strip_urls = true
/// drop_empty_text = true
/// ```
///
/// Any path left out falls back to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub stopwords_path: Option<PathBuf>,
    pub hazard_keywords_path: Option<PathBuf>,
    pub impact_keywords_path: Option<PathBuf>,
    pub strip_urls: bool,
    pub drop_empty_text: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            stopwords_path: None,
            hazard_keywords_path: None,
            impact_keywords_path: None,
            strip_urls: false,
            drop_empty_text: true,
        }
    }
}

impl CoreConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_toml_str(&fs::read_to_string(path)?)?;
        config.log_settings(path);
        Ok(config)
    }

    fn log_settings(&self, path: &Path) {
        fn describe(path: &Option<PathBuf>) -> String {
            match path {
                Some(p) => p.display().to_string(),
                None => "<built-in>".to_string(),
            }
        }

        tracing::info!("Config loaded from {}:", path.display());
        tracing::info!("  stopwords: {}", describe(&self.stopwords_path));
        tracing::info!("  hazard keywords: {}", describe(&self.hazard_keywords_path));
        tracing::info!("  impact keywords: {}", describe(&self.impact_keywords_path));
        tracing::info!("  strip_urls: {}", self.strip_urls);
        tracing::info!("  drop_empty_text: {}", self.drop_empty_text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.drop_empty_text);
        assert!(!config.strip_urls);
    }

    #[test]
    fn test_partial_config() {
        let config = CoreConfig::from_toml_str(
            r#"
            impact_keywords_path = "damage_keywords.json"
            strip_urls = true
            "#,
        )
        .unwrap();
        assert_eq!(
            config.impact_keywords_path,
            Some(PathBuf::from("damage_keywords.json"))
        );
        assert!(config.strip_urls);
        assert!(config.stopwords_path.is_none());
        assert!(config.drop_empty_text);
    }

    #[test]
    fn test_bad_config() {
        let err = CoreConfig::from_toml_str("strip_urls = \"yes\"");
        assert!(matches!(err, Err(CoreError::TomlParse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = CoreConfig::load("/nonexistent/relief_text_core.toml");
        assert!(matches!(err, Err(CoreError::Io(_))));
    }
}
