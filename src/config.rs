use std::path::{Path, PathBuf};

use eyre::{Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bind: Option<String>,
    pub languages: Option<Vec<String>>,
    pub user_agent: Option<String>,
    pub max_keywords: Option<usize>,
}

impl Config {
    /// Load config from the given path, or from ~/.config/ytex/config.toml.
    /// A missing default-location file is fine; a missing explicit path is an
    /// error.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) => {
                if !path.exists() {
                    bail!("config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => config_path(),
        };

        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytex")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
bind = "0.0.0.0:8080"
languages = ["id", "en"]
user_agent = "Mozilla/5.0 test"
max_keywords = 10
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bind.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(
            config.languages.as_deref(),
            Some(["id".to_string(), "en".to_string()].as_slice())
        );
        assert_eq!(config.user_agent.as_deref(), Some("Mozilla/5.0 test"));
        assert_eq!(config.max_keywords, Some(10));
    }

    #[test]
    fn test_parse_empty_config() {
        let toml_str = "";
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.bind.is_none());
        assert!(config.languages.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"languages = ["en"]"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.languages.as_deref(), Some(["en".to_string()].as_slice()));
        assert!(config.bind.is_none());
        assert!(config.max_keywords.is_none());
    }

    #[test]
    fn test_load_explicit_path() {
        let path = std::env::temp_dir().join("ytex-config-load-test.toml");
        std::fs::write(&path, r#"languages = ["en"]"#).unwrap();
        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.languages.as_deref(), Some(["en".to_string()].as_slice()));
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let path = Path::new("/nonexistent/ytex-config.toml");
        assert!(Config::load(Some(path)).is_err());
    }
}
