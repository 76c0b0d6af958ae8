//! Dense numeric building blocks shared by the attention and embedding crates.
//!
//! Everything here operates on `candle_core::Tensor` values and is stateless:
//! [`dense`] wraps matrix products with explicit shape validation, [`norm`]
//! hosts layer normalisation over the trailing axis, and [`checks`] collects
//! the small assertions both of them rely on.

pub mod checks;
pub mod dense;
pub mod norm;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayerError>;

/// Errors raised by layer construction or forward passes.
#[derive(Debug, Error)]
pub enum LayerError {
    /// Two operands disagree on a contracted or expected dimension.
    #[error("shape mismatch in {op}: {detail}")]
    ShapeMismatch { op: &'static str, detail: String },

    /// An operand has no elements.
    #[error("empty input to {op}")]
    EmptyInput { op: &'static str },

    /// A scalar or structural parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Backend(#[from] candle_core::Error),
}

impl LayerError {
    pub(crate) fn shape(op: &'static str, detail: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            op,
            detail: detail.into(),
        }
    }
}

pub use dense::{matmul, matvec, transpose};
pub use norm::{layer_normalization, LayerNorm, NormConfig};
