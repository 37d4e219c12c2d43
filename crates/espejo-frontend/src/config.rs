#![forbid(unsafe_code)]

//! Options accepted by `DiarioEspejoWeb.init`.
//!
//! JS passes an optional JSON string; every field is optional and unknown
//! fields are rejected so typos surface immediately.
//!
//! ```json
//! { "aura_url": "/img/aura.png", "log_level": "debug", "symbol_seed": 7 }
//! ```

use std::fmt;

use espejo_core::assets::{AssetKind, DEFAULT_AURA_URL, DEFAULT_SHIMMER_URL, DEFAULT_THIRD_EYE_URL};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Frontend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontendConfig {
    pub aura_url: String,
    pub third_eye_url: String,
    pub shimmer_url: String,
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info` or `espejo_runtime=debug`.
    pub log_level: String,
    /// Fixed seed for the power-symbol generator. Seeded from the clock when absent.
    pub symbol_seed: Option<u64>,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            aura_url: DEFAULT_AURA_URL.to_string(),
            third_eye_url: DEFAULT_THIRD_EYE_URL.to_string(),
            shimmer_url: DEFAULT_SHIMMER_URL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            symbol_seed: None,
        }
    }
}

/// Rejected frontend options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Not valid JSON, wrong field type, or unknown field.
    Parse(String),
    /// `log_level` is not a valid filter directive.
    InvalidLogLevel(String),
    /// An asset URL is blank.
    EmptyUrl(AssetKind),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "invalid options: {msg}"),
            Self::InvalidLogLevel(level) => write!(f, "invalid log level: {level:?}"),
            Self::EmptyUrl(kind) => write!(f, "empty URL for asset {kind}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl FrontendConfig {
    /// Parse and validate the JSON options string. `None` or a blank string
    /// yields the defaults.
    pub fn from_json(options: Option<&str>) -> Result<Self, ConfigError> {
        let config = match options.map(str::trim) {
            None | Some("") => Self::default(),
            Some(json) => {
                serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for kind in AssetKind::ALL {
            if self.url(kind).trim().is_empty() {
                return Err(ConfigError::EmptyUrl(kind));
            }
        }
        self.env_filter().map(|_| ())
    }

    /// URL configured for `kind`.
    #[must_use]
    pub fn url(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Aura => &self.aura_url,
            AssetKind::ThirdEye => &self.third_eye_url,
            AssetKind::Shimmer => &self.shimmer_url,
        }
    }

    /// Filter built from `log_level`.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}
