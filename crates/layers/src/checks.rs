//! Lightweight validation helpers shared across layer components.
//!
//! Each helper takes a static label naming the operand so that failures read
//! like `shape mismatch in matmul.rhs: ...` without the call site having to
//! format anything.

use candle_core::{DType, Tensor};

use crate::{LayerError, Result};

/// Ensures a tensor has exactly `rank` dimensions.
pub fn expect_rank(label: &'static str, tensor: &Tensor, rank: usize) -> Result<()> {
    if tensor.rank() == rank {
        Ok(())
    } else {
        Err(LayerError::shape(
            label,
            format!("expected rank {rank}, got shape {:?}", tensor.dims()),
        ))
    }
}

/// Ensures a tensor matches the expected dimensions exactly.
pub fn expect_shape(label: &'static str, tensor: &Tensor, expected: &[usize]) -> Result<()> {
    if tensor.dims() == expected {
        Ok(())
    } else {
        Err(LayerError::shape(
            label,
            format!("expected shape {:?}, got {:?}", expected, tensor.dims()),
        ))
    }
}

/// Ensures the trailing dimension equals `size`.
pub fn expect_last_dim(label: &'static str, tensor: &Tensor, size: usize) -> Result<()> {
    match tensor.dims().last() {
        Some(&last) if last == size => Ok(()),
        _ => Err(LayerError::shape(
            label,
            format!("expected trailing dimension {size}, got {:?}", tensor.dims()),
        )),
    }
}

/// Rejects tensors without elements.
pub fn expect_non_empty(label: &'static str, tensor: &Tensor) -> Result<()> {
    if tensor.elem_count() == 0 {
        Err(LayerError::EmptyInput { op: label })
    } else {
        Ok(())
    }
}

/// Checks the tensor dtype is one of the allowed values.
pub fn expect_dtype_in(label: &'static str, tensor: &Tensor, allowed: &[DType]) -> Result<()> {
    let dtype = tensor.dtype();
    if allowed.contains(&dtype) {
        Ok(())
    } else {
        Err(LayerError::InvalidParameter(format!(
            "{label}: expected dtype in {:?}, got {:?}",
            allowed, dtype
        )))
    }
}
