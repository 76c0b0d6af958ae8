//! Configuration options shared by all attention implementations.
//!
//! The [`Config`] struct captures run-time knobs that callers can tune without
//! swapping implementations. It deserialises with `#[serde(default)]`, so a
//! config file only needs to name the fields it changes. Two environment
//! variables are honoured by [`Config::apply_env_overrides`]:
//!
//! * `ATTENTION_PRECISION`: `f32` or `inherit`
//! * `ATTENTION_MASK_SENTINEL`: a negative finite float

use std::{fmt, str::FromStr};

use candle_core::DType;
use serde::{Deserialize, Serialize};

use super::AttentionError;

pub const PRECISION_ENV: &str = "ATTENTION_PRECISION";
pub const MASK_SENTINEL_ENV: &str = "ATTENTION_MASK_SENTINEL";

/// Dtype used for scores, softmax and the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// Promote every input to `f32` and cast the output back.
    #[default]
    ForceF32,
    /// Compute in the dtype of the inputs.
    Inherit,
}

impl Precision {
    pub fn compute_dtype(self, input: DType) -> DType {
        match self {
            Precision::ForceF32 => DType::F32,
            Precision::Inherit => input,
        }
    }
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "f32" | "force_f32" | "force-f32" => Ok(Precision::ForceF32),
            "inherit" => Ok(Precision::Inherit),
            other => Err(format!("unknown precision '{other}'")),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::ForceF32 => f.write_str("f32"),
            Precision::Inherit => f.write_str("inherit"),
        }
    }
}

/// Configuration driving attention behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub precision: Precision,
    /// Score written where a binary mask holds `0`.
    pub mask_sentinel: f64,
    /// Entries below this value mark a mask as additive in [`crate::Mask::infer`],
    /// and count as forbidden when scanning additive masks for fully masked rows.
    pub additive_threshold: f64,
    /// Log a warning when a mask forbids every key for some query.
    pub warn_on_degenerate_rows: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            precision: Precision::ForceF32,
            mask_sentinel: -1e9,
            additive_threshold: -1e4,
            warn_on_degenerate_rows: true,
        }
    }
}

impl Config {
    /// Applies `ATTENTION_*` environment overrides. Unparseable values are
    /// logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(PRECISION_ENV) {
            match raw.parse::<Precision>() {
                Ok(precision) => self.precision = precision,
                Err(err) => log::warn!("ignoring {PRECISION_ENV}: {err}"),
            }
        }
        if let Some(raw) = lookup(MASK_SENTINEL_ENV) {
            match raw.trim().parse::<f64>() {
                Ok(sentinel) => self.mask_sentinel = sentinel,
                Err(err) => log::warn!("ignoring {MASK_SENTINEL_ENV}={raw}: {err}"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), AttentionError> {
        if !(self.mask_sentinel.is_finite() && self.mask_sentinel < 0.0) {
            return Err(AttentionError::configuration(format!(
                "mask_sentinel must be a negative finite value, got {}",
                self.mask_sentinel
            )));
        }
        if !self.additive_threshold.is_finite() {
            return Err(AttentionError::configuration(format!(
                "additive_threshold must be finite, got {}",
                self.additive_threshold
            )));
        }
        Ok(())
    }
}
