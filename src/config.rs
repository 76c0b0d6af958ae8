//! Demo configuration loaded from TOML or JSON.

use std::{fs, path::Path};

use attention::Config;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Format(String),
    #[error("invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Format(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}

/// Sizes and seed shared by every demo subcommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub seed: u64,
    pub seq_len: usize,
    pub d_model: usize,
    pub d_k: usize,
    pub d_v: usize,
    pub n_heads: usize,
    pub epsilon: f64,
    pub attention: Config,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            seq_len: 4,
            d_model: 8,
            d_k: 4,
            d_v: 4,
            n_heads: 2,
            epsilon: 1e-5,
            attention: Config::default(),
        }
    }
}

impl DemoConfig {
    /// Reads `.json` as JSON and everything else as TOML, then validates.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: DemoConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("toml") | Some("tml") | None => toml::from_str(&contents)?,
            Some(other) => {
                return Err(ConfigError::Format(format!(
                    "unsupported configuration extension '{other}'"
                )));
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("seq_len", self.seq_len),
            ("d_model", self.d_model),
            ("d_k", self.d_k),
            ("d_v", self.d_v),
            ("n_heads", self.n_heads),
        ] {
            if value == 0 {
                errors.push(format!("{name} must be greater than 0"));
            }
        }

        if self.n_heads > 0 && self.d_model % self.n_heads != 0 {
            errors.push(format!(
                "d_model ({}) must be divisible by n_heads ({})",
                self.d_model, self.n_heads
            ));
        }

        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            errors.push("epsilon must be a positive finite value".to_string());
        }

        if let Err(err) = self.attention.validate() {
            errors.push(format!("attention: {err}"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}
