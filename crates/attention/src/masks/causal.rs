//! Builders for causal attention masks.
//!
//! Query `q` may attend to key `k` when `k <= q + (k_len - q_len)`. When
//! `k_len > q_len`, queries are assumed to align with the most recent `q_len`
//! keys, allowing access to the extended prefix.

use candle_core::{Device, Result, Tensor};

use super::Mask;

fn allowed(q: usize, k: usize, q_len: usize, k_len: usize) -> bool {
    k <= q + k_len.saturating_sub(q_len)
}

/// Additive causal mask: `0.0` where permitted, `f32::NEG_INFINITY` otherwise.
pub fn build_causal_mask(device: &Device, q_len: usize, k_len: usize) -> Result<Mask> {
    let mut data = vec![0f32; q_len * k_len];
    for q in 0..q_len {
        for k in 0..k_len {
            if !allowed(q, k, q_len, k_len) {
                data[q * k_len + k] = f32::NEG_INFINITY;
            }
        }
    }
    Ok(Mask::Additive(Tensor::from_vec(data, (q_len, k_len), device)?))
}

/// Binary causal mask: a lower-triangular matrix of ones.
pub fn causal_binary_mask(device: &Device, q_len: usize, k_len: usize) -> Result<Mask> {
    let mut data = vec![0f32; q_len * k_len];
    for q in 0..q_len {
        for k in 0..k_len {
            if allowed(q, k, q_len, k_len) {
                data[q * k_len + k] = 1.0;
            }
        }
    }
    Ok(Mask::Binary(Tensor::from_vec(data, (q_len, k_len), device)?))
}
