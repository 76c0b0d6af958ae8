//! Row-wise softmax with max subtraction.
//!
//! `exp(x - max_row(x)) / sum(exp(x - max_row(x)))` keeps every exponent
//! `<= 0`, so large positive scores cannot overflow and the largest entry of
//! each row always contributes `exp(0) = 1` to the denominator.

use candle_core::{Result, Tensor, D};

/// Softmax along the last dimension. The result is row-stochastic and has the
/// same shape and dtype as `scores`.
pub fn stable_softmax_last_dim(scores: &Tensor) -> Result<Tensor> {
    let max = scores.max_keepdim(D::Minus1)?;
    let exp = scores.broadcast_sub(&max)?.exp()?;
    let denom = exp.sum_keepdim(D::Minus1)?;
    exp.broadcast_div(&denom)
}

/// `1 / sqrt(d_k)`, the factor applied to raw `Q·Kᵀ` scores.
pub fn score_scale(d_k: usize) -> f64 {
    1.0 / (d_k as f64).sqrt()
}
