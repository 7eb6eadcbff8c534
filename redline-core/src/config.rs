use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;

use crate::severity::SeverityBand;

#[derive(Debug, Deserialize, Clone)]
pub struct RedlineConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub socket_path: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8767,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// Lowest band at which a score counts as hitting its category.
    pub flag_threshold: SeverityBand,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            flag_threshold: SeverityBand::Moderate,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PagingConfig {
    pub gallery_page_size: usize,
    pub list_page_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            gallery_page_size: 5,
            list_page_size: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    pub default_lookback_days: i64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_lookback_days: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IngestConfig {
    /// JSON catalog imported at startup.
    pub seed_path: Option<String>,
}

impl RedlineConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize::<Self>()?.validated()
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        s.try_deserialize::<Self>()?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.filter.default_lookback_days < 0 {
            return Err(ConfigError::Message(format!(
                "filter.default_lookback_days must be >= 0, got {}",
                self.filter.default_lookback_days
            )));
        }
        Ok(self)
    }
}
