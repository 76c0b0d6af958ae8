//! Reference scaled dot-product attention.
//!
//! The exact path prioritises numerical fidelity and mirrors the semantics
//! described by the [`Attention`](crate::core::Attention) trait:
//!
//! 1. `S = Q·Kᵀ / sqrt(d_k)`
//! 2. mask, if any (see [`Mask`])
//! 3. row-wise stable softmax
//! 4. `O = softmax(S)·V`

use std::sync::OnceLock;

use candle_core::{DType, Tensor};
use layers::{checks, dense};

use crate::core::{Attention, AttentionError, Config};
use crate::masks::Mask;
use crate::softmax::{score_scale, stable_softmax_last_dim};

/// Attention output together with the normalised weights that produced it.
#[derive(Debug, Clone)]
pub struct AttentionOutput {
    /// `(q_len, d_v)` in the dtype of `q`.
    pub output: Tensor,
    /// `(q_len, k_len)` row-stochastic weights in the compute dtype.
    pub weights: Tensor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dims {
    q_len: usize,
    k_len: usize,
    d_k: usize,
    d_v: usize,
}

/// Numerically stable, portable attention kernel.
#[derive(Debug, Default)]
pub struct ExactAttention {
    first_call: OnceLock<()>,
}

impl ExactAttention {
    pub fn new() -> Self {
        Self {
            first_call: OnceLock::new(),
        }
    }

    /// Runs attention and keeps the intermediate weights.
    ///
    /// `config` is used as given; environment overrides belong to whoever
    /// builds it (see [`Config::apply_env_overrides`]).
    pub fn attend_with_weights(
        &self,
        q: &Tensor,
        k: &Tensor,
        v: &Tensor,
        mask: Option<&Mask>,
        config: &Config,
    ) -> Result<AttentionOutput, AttentionError> {
        config.validate()?;

        if self.first_call.set(()).is_ok() {
            log::info!(
                "attention::reference init precision={} mask_sentinel={:e} additive_threshold={:e} warn_on_degenerate_rows={}",
                config.precision,
                config.mask_sentinel,
                config.additive_threshold,
                config.warn_on_degenerate_rows
            );
        }

        let dims = validate_inputs(q, k, v, mask)?;
        let dtype = q.dtype();
        let compute = config.precision.compute_dtype(dtype);

        log::debug!(
            "attend q=({}, {}) k=({}, {}) v=({}, {}) mask={:?} compute={:?}",
            dims.q_len,
            dims.d_k,
            dims.k_len,
            dims.d_k,
            dims.k_len,
            dims.d_v,
            mask.map(Mask::kind),
            compute
        );

        let mut scores = scaled_scores(&q.to_dtype(compute)?, &k.to_dtype(compute)?, dims.d_k)?;

        if let Some(mask) = mask {
            if config.warn_on_degenerate_rows {
                let rows = mask.degenerate_rows(config.additive_threshold)?;
                if !rows.is_empty() {
                    log::warn!(
                        "mask removes every key for query rows {:?}; their weights degrade to a near-uniform distribution",
                        rows
                    );
                }
            }
            scores = mask.apply(&scores, config.mask_sentinel)?;
        }

        let weights = stable_softmax_last_dim(&scores)?;
        let output = dense::matmul(&weights, &v.to_dtype(compute)?)?;

        Ok(AttentionOutput {
            output: output.to_dtype(dtype)?,
            weights,
        })
    }
}

impl Attention for ExactAttention {
    fn attend(
        &self,
        q: &Tensor,
        k: &Tensor,
        v: &Tensor,
        mask: Option<&Mask>,
        config: &Config,
    ) -> Result<Tensor, AttentionError> {
        Ok(self.attend_with_weights(q, k, v, mask, config)?.output)
    }
}

/// `Q·Kᵀ / sqrt(d_k)` for already-cast operands.
fn scaled_scores(q: &Tensor, k: &Tensor, d_k: usize) -> Result<Tensor, AttentionError> {
    let scores = dense::matmul(q, &k.t()?)?;
    Ok((scores * score_scale(d_k))?)
}

fn validate_inputs(
    q: &Tensor,
    k: &Tensor,
    v: &Tensor,
    mask: Option<&Mask>,
) -> Result<Dims, AttentionError> {
    let dtype = q.dtype();
    if !dtype.is_float() {
        return Err(AttentionError::UnsupportedDType {
            requested: format!("{dtype:?}"),
        });
    }
    if k.dtype() != dtype || v.dtype() != dtype {
        return Err(AttentionError::UnsupportedDType {
            requested: format!(
                "mixed q={:?} k={:?} v={:?}; q, k, v must share a dtype",
                dtype,
                k.dtype(),
                v.dtype()
            ),
        });
    }

    checks::expect_rank("attention.q", q, 2)?;
    checks::expect_rank("attention.k", k, 2)?;
    checks::expect_rank("attention.v", v, 2)?;
    checks::expect_non_empty("attention.q", q)?;
    checks::expect_non_empty("attention.k", k)?;

    let (q_len, d_k) = q.dims2()?;
    let (k_len, kd) = k.dims2()?;
    let (vk, d_v) = v.dims2()?;

    if kd != d_k {
        return Err(AttentionError::shape(format!(
            "q has {d_k} columns but k has {kd}; q is ({q_len}, {d_k}), k is ({k_len}, {kd})"
        )));
    }
    if vk != k_len {
        return Err(AttentionError::shape(format!(
            "k has {k_len} rows but v has {vk}; v is ({vk}, {d_v})"
        )));
    }
    if let Some(mask) = mask {
        mask.expect_dims(q_len, k_len)?;
    }

    Ok(Dims {
        q_len,
        k_len,
        d_k,
        d_v,
    })
}

pub(crate) fn shared() -> &'static ExactAttention {
    static REFERENCE: OnceLock<ExactAttention> = OnceLock::new();
    REFERENCE.get_or_init(ExactAttention::new)
}

/// Scaled dot-product attention with the default [`Config`].
///
/// `mask`, if present, must be `(rows(q), rows(k))`.
pub fn attend(
    q: &Tensor,
    k: &Tensor,
    v: &Tensor,
    mask: Option<&Mask>,
) -> Result<Tensor, AttentionError> {
    shared().attend(q, k, v, mask, &Config::default())
}

/// Like [`attend`] but also returns the attention weights.
pub fn attend_with_weights(
    q: &Tensor,
    k: &Tensor,
    v: &Tensor,
    mask: Option<&Mask>,
) -> Result<AttentionOutput, AttentionError> {
    shared().attend_with_weights(q, k, v, mask, &Config::default())
}

/// Row-stochastic `(q_len, k_len)` weights `softmax(mask(Q·Kᵀ / sqrt(d_k)))`.
pub fn attention_weights(
    q: &Tensor,
    k: &Tensor,
    mask: Option<&Mask>,
) -> Result<Tensor, AttentionError> {
    // Identity values make the output equal to the weights without a second code path.
    let k_len = k.dims().first().copied().unwrap_or(0);
    let identity = Tensor::eye(k_len, q.dtype(), q.device())?;
    Ok(attend_with_weights(q, k, &identity, mask)?.weights)
}
