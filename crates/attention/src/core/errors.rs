//! Error types emitted by attention implementations.

use layers::LayerError;
use thiserror::Error;

/// Attention-specific error category.
#[derive(Debug, Error)]
pub enum AttentionError {
    /// Contracted dimensions disagree, or a tensor has the wrong rank.
    #[error("shape mismatch: {context}")]
    ShapeMismatch { context: String },

    /// Caller-supplied parameters are incompatible (e.g. `d_model % n_heads != 0`).
    #[error("invalid configuration: {context}")]
    Configuration { context: String },

    /// The kernel does not support the requested data type.
    #[error("unsupported dtype {requested}")]
    UnsupportedDType { requested: String },

    /// A backend-specific failure propagated to the caller.
    #[error(transparent)]
    Backend(#[from] candle_core::Error),
}

impl AttentionError {
    pub(crate) fn shape(context: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
        }
    }

    pub(crate) fn configuration(context: impl Into<String>) -> Self {
        Self::Configuration {
            context: context.into(),
        }
    }
}

impl From<LayerError> for AttentionError {
    fn from(err: LayerError) -> Self {
        match err {
            LayerError::Backend(inner) => Self::Backend(inner),
            LayerError::InvalidParameter(context) => Self::Configuration { context },
            other @ (LayerError::ShapeMismatch { .. } | LayerError::EmptyInput { .. }) => {
                Self::shape(other.to_string())
            }
        }
    }
}
