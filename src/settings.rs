use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PocketbookError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Signed-in user; `None` means every data command is refused.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default = "default_period_horizon_months")]
    pub period_horizon_months: u32,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_period_horizon_months() -> u32 {
    12
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            user: None,
            period_horizon_months: default_period_horizon_months(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("pocketbook.db")
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("pocketbook")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("pocketbook")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable settings, using defaults");
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| PocketbookError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            user: Some("alice".to_string()),
            period_horizon_months: 6,
            currency_symbol: "NZ$".to_string(),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.user.as_deref(), Some("alice"));
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.period_horizon_months, 6);
        assert_eq!(loaded.currency_symbol, "NZ$");
    }

    #[test]
    fn test_defaults_have_no_user() {
        let s = Settings::default();
        assert!(s.user.is_none());
        assert_eq!(s.period_horizon_months, 12);
        assert_eq!(s.currency_symbol, "$");
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.period_horizon_months, 12);
        assert!(s.user.is_none());
    }

    #[test]
    fn test_db_path_is_inside_data_dir() {
        let s = Settings {
            data_dir: "/tmp/pb".to_string(),
            ..Settings::default()
        };
        assert_eq!(s.db_path(), PathBuf::from("/tmp/pb/pocketbook.db"));
    }
}
