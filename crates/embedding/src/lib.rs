//! Embedding crate
//!
//! The positional module exposes the fixed sinusoidal position table used to
//! give attention layers a notion of token order.

pub mod positional;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Backend(#[from] candle_core::Error),
}

pub use positional::*;
