//! Core traits and types shared across attention implementations.
//!
//! Implementations operate on rank-2 tensors: `q` is `(q_len, d_k)`, `k` is
//! `(k_len, d_k)` and `v` is `(k_len, d_v)`. The output is `(q_len, d_v)` in
//! the dtype of `q`. Multi-head callers slice a `(n_heads, seq_len, d_k)`
//! tensor per head and call the same trait once per slice.

pub mod config;
pub mod errors;

use candle_core::Tensor;

use crate::masks::Mask;

pub use config::{Config, Precision};
pub use errors::AttentionError;

/// Unified interface for single-head attention kernels.
///
/// * `q`, `k`, `v` are rank-2 and share a float dtype.
/// * `k` and `v` share their row count; `q` may have a different one.
/// * Masks, when present, must be shaped `(q_len, k_len)`.
/// * The returned tensor is `(q_len, d_v)` in the dtype of `q`.
pub trait Attention: Send + Sync {
    /// Compute scaled dot-product attention with an optional mask.
    fn attend(
        &self,
        q: &Tensor,
        k: &Tensor,
        v: &Tensor,
        mask: Option<&Mask>,
        config: &Config,
    ) -> Result<Tensor, AttentionError>;
}
