use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schedule::FormatDefaults;
use crate::schedule::draft::DEFAULT_ZONE_SUFFIX;
use crate::schedule::formatter::{DEFAULT_COLOR, DEFAULT_DESCRIPTION, DEFAULT_TITLE};

pub const API_KEY_ENV: &str = "CLINIC_AGENDA_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub backend: BackendConfig,
    pub tables: TablesConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TablesConfig {
    pub appointments: String,
    pub appointments_report: String,
    #[serde(default = "default_professionals_rpc")]
    pub professionals_rpc: String,
}

fn default_professionals_rpc() -> String {
    "afaas_get_profissionais".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    pub default_color: String,
    pub untitled: String,
    pub no_description: String,
    pub time_zone_suffix: String,
}

impl DisplayConfig {
    pub fn format_defaults(&self) -> FormatDefaults {
        FormatDefaults {
            title: self.untitled.clone(),
            description: self.no_description.clone(),
            color: self.default_color.clone(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    pub fn load_or_create() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            config.backend.api_key = key;
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default config to {}", path.display());
            Ok(config)
        }
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clinic-agenda")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                url: "http://localhost:54321".to_string(),
                api_key: String::new(),
                request_timeout_seconds: 30,
            },
            tables: TablesConfig {
                appointments: "afaas_agendamentos".to_string(),
                appointments_report: "afaas_view_agendamentos_completos".to_string(),
                professionals_rpc: default_professionals_rpc(),
            },
            display: DisplayConfig {
                default_color: DEFAULT_COLOR.to_string(),
                untitled: DEFAULT_TITLE.to_string(),
                no_description: DEFAULT_DESCRIPTION.to_string(),
                time_zone_suffix: DEFAULT_ZONE_SUFFIX.to_string(),
            },
        }
    }
}
