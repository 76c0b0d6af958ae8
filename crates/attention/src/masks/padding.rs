//! Builders for padding masks used to drop padded keys.

use candle_core::{Device, Result, Tensor};

use super::Mask;

/// Additive mask hiding keys at or beyond `valid_len` from every query.
/// `valid_len` is clamped to `k_len`.
pub fn padding_mask_from_length(
    device: &Device,
    valid_len: usize,
    q_len: usize,
    k_len: usize,
) -> Result<Mask> {
    let valid = valid_len.min(k_len);
    let mut data = vec![0f32; q_len * k_len];
    for q in 0..q_len {
        for k in valid..k_len {
            data[q * k_len + k] = f32::NEG_INFINITY;
        }
    }
    Ok(Mask::Additive(Tensor::from_vec(data, (q_len, k_len), device)?))
}

/// Binary mask from per-key padding flags; `true` marks a padded key.
pub fn padding_mask_from_booleans(device: &Device, padding: &[bool], q_len: usize) -> Result<Mask> {
    let k_len = padding.len();
    let row: Vec<u8> = padding.iter().map(|&padded| u8::from(!padded)).collect();
    let data = row.repeat(q_len);
    Ok(Mask::Binary(Tensor::from_vec(data, (q_len, k_len), device)?))
}
