//! Query/Key/Value projection.
//!
//! `Q = X·W_q`, `K = X·W_k`, `V = X·W_v` for a `(seq_len, d_model)` input and
//! `(d_model, d_out)` weights. Single-head callers use `d_out = d_k`; the
//! multi-head path projects all heads jointly with `(d_model, d_model)` weights
//! and splits afterwards.

use candle_core::Tensor;
use layers::{checks, dense};

use crate::core::AttentionError;

/// Projected query, key and value matrices.
#[derive(Debug, Clone)]
pub struct Qkv {
    pub query: Tensor,
    pub key: Tensor,
    pub value: Tensor,
}

impl Qkv {
    pub fn into_tuple(self) -> (Tensor, Tensor, Tensor) {
        (self.query, self.key, self.value)
    }
}

/// Projects `x` with three independent weight matrices.
///
/// Only the inner dimension of each product is checked; mismatches surface as
/// [`AttentionError::ShapeMismatch`].
pub fn project_qkv(
    x: &Tensor,
    w_q: &Tensor,
    w_k: &Tensor,
    w_v: &Tensor,
) -> Result<(Tensor, Tensor, Tensor), AttentionError> {
    let query = dense::matmul(x, w_q)?;
    let key = dense::matmul(x, w_k)?;
    let value = dense::matmul(x, w_v)?;
    Ok((query, key, value))
}

/// The three projection matrices, validated once and reused across inputs.
#[derive(Debug, Clone)]
pub struct QkvWeights {
    w_q: Tensor,
    w_k: Tensor,
    w_v: Tensor,
}

impl QkvWeights {
    /// All weights must share `d_model` rows; `W_q` and `W_k` must also share
    /// their column count so the resulting `Q` and `K` can be contracted.
    pub fn new(w_q: Tensor, w_k: Tensor, w_v: Tensor) -> Result<Self, AttentionError> {
        checks::expect_rank("qkv.w_q", &w_q, 2)?;
        checks::expect_rank("qkv.w_k", &w_k, 2)?;
        checks::expect_rank("qkv.w_v", &w_v, 2)?;

        let (d_model, d_k) = w_q.dims2()?;
        let (k_rows, k_cols) = w_k.dims2()?;
        let (v_rows, _) = w_v.dims2()?;
        if k_rows != d_model || v_rows != d_model {
            return Err(AttentionError::shape(format!(
                "projection weights must share d_model rows: w_q={d_model}, w_k={k_rows}, w_v={v_rows}"
            )));
        }
        if k_cols != d_k {
            return Err(AttentionError::shape(format!(
                "w_q and w_k must have the same width, got {d_k} and {k_cols}"
            )));
        }

        Ok(Self { w_q, w_k, w_v })
    }

    pub fn d_model(&self) -> usize {
        self.w_q.dims()[0]
    }

    pub fn d_k(&self) -> usize {
        self.w_q.dims()[1]
    }

    pub fn d_v(&self) -> usize {
        self.w_v.dims()[1]
    }

    pub fn project(&self, x: &Tensor) -> Result<Qkv, AttentionError> {
        let (query, key, value) = project_qkv(x, &self.w_q, &self.w_k, &self.w_v)?;
        Ok(Qkv { query, key, value })
    }
}
