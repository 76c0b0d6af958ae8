//! Splitting the model dimension across heads and merging it back.
//!
//! For `d_model = n_heads * d_k`, head `h` owns the contiguous column block
//! `[h * d_k, (h + 1) * d_k)`:
//!
//! ```text
//! split: (seq, d_model) -> (seq, n_heads, d_k) -> (n_heads, seq, d_k)
//! merge: (n_heads, seq, d_k) -> (seq, n_heads, d_k) -> (seq, d_model)
//! ```
//!
//! [`merge_heads`] undoes exactly the axis swap of [`split_heads`]; any other
//! grouping (e.g. striding columns across heads) assigns different features to
//! each head.

use std::ops::Range;

use candle_core::Tensor;
use layers::checks;

use crate::core::{Attention, AttentionError, Config};
use crate::reference::exact;

/// Validated head partition of a model dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadLayout {
    n_heads: usize,
    d_k: usize,
}

impl HeadLayout {
    /// Fails with [`AttentionError::Configuration`] unless `n_heads > 0` and
    /// `d_model % n_heads == 0`.
    pub fn new(d_model: usize, n_heads: usize) -> Result<Self, AttentionError> {
        if n_heads == 0 {
            return Err(AttentionError::configuration("n_heads must be greater than zero"));
        }
        if d_model % n_heads != 0 {
            return Err(AttentionError::configuration(format!(
                "d_model ({d_model}) must be divisible by n_heads ({n_heads})"
            )));
        }
        Ok(Self {
            n_heads,
            d_k: d_model / n_heads,
        })
    }

    pub fn n_heads(&self) -> usize {
        self.n_heads
    }

    pub fn d_k(&self) -> usize {
        self.d_k
    }

    pub fn d_model(&self) -> usize {
        self.n_heads * self.d_k
    }

    /// Columns of the `(seq, d_model)` matrix that belong to `head`.
    pub fn head_columns(&self, head: usize) -> Range<usize> {
        head * self.d_k..(head + 1) * self.d_k
    }
}

/// `(seq, d_model)` to a contiguous `(n_heads, seq, d_k)`.
pub fn split_heads(t: &Tensor, n_heads: usize) -> Result<Tensor, AttentionError> {
    checks::expect_rank("heads.split", t, 2)?;
    let (seq_len, d_model) = t.dims2()?;
    let layout = HeadLayout::new(d_model, n_heads)?;
    Ok(t
        .reshape((seq_len, layout.n_heads(), layout.d_k()))?
        .transpose(0, 1)?
        .contiguous()?)
}

/// `(n_heads, seq, d_k)` back to a contiguous `(seq, n_heads * d_k)`.
pub fn merge_heads(t: &Tensor) -> Result<Tensor, AttentionError> {
    checks::expect_rank("heads.merge", t, 3)?;
    let (n_heads, seq_len, d_k) = t.dims3()?;
    Ok(t
        .transpose(0, 1)?
        .contiguous()?
        .reshape((seq_len, n_heads * d_k))?)
}

/// Multi-head attention over jointly projected `(seq, d_model)` inputs using
/// the given single-head kernel.
///
/// Each head is attended independently and without a mask; no output
/// projection is applied after merging. `q` may have a different row count
/// from `k`/`v`.
pub fn multi_head_attend_with<A>(
    attention: &A,
    q: &Tensor,
    k: &Tensor,
    v: &Tensor,
    n_heads: usize,
    config: &Config,
) -> Result<Tensor, AttentionError>
where
    A: Attention + ?Sized,
{
    checks::expect_rank("multi_head.q", q, 2)?;
    let (_, d_model) = q.dims2()?;
    let layout = HeadLayout::new(d_model, n_heads)?;

    for (label, t) in [("multi_head.k", k), ("multi_head.v", v)] {
        checks::expect_rank(label, t, 2)?;
        checks::expect_last_dim(label, t, d_model)?;
    }

    log::debug!(
        "multi_head_attend n_heads={} d_k={} q={:?} k={:?}",
        layout.n_heads(),
        layout.d_k(),
        q.dims(),
        k.dims()
    );

    let q_heads = split_heads(q, n_heads)?;
    let k_heads = split_heads(k, n_heads)?;
    let v_heads = split_heads(v, n_heads)?;

    let per_head = (0..layout.n_heads())
        .map(|head| {
            attention.attend(
                &q_heads.get(head)?,
                &k_heads.get(head)?,
                &v_heads.get(head)?,
                None,
                config,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    merge_heads(&Tensor::stack(&per_head, 0)?)
}

/// Multi-head attention with the reference kernel and default [`Config`].
pub fn multi_head_attend(
    q: &Tensor,
    k: &Tensor,
    v: &Tensor,
    n_heads: usize,
) -> Result<Tensor, AttentionError> {
    multi_head_attend_with(exact::shared(), q, k, v, n_heads, &Config::default())
}
