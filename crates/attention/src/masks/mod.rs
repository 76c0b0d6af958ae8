//! Attention masks as an explicit tagged variant.
//!
//! A mask restricts which key positions a query may attend to. Two encodings
//! are in common use and they are not interchangeable, so the caller states
//! which one a tensor holds:
//!
//! * [`Mask::Additive`]: real values added to the scores. `0.0` keeps a
//!   position, a large negative value (conventionally `-inf`) removes it.
//! * [`Mask::Binary`]: `0` removes a position, any other value keeps it.
//!   Removed scores are overwritten with [`Config::mask_sentinel`].
//!
//! [`Mask::infer`] reproduces the value-range heuristic (any entry below a
//! threshold means additive) for callers that only have an untagged tensor.
//!
//! All masks are `(q_len, k_len)`.
//!
//! [`Config::mask_sentinel`]: crate::core::Config::mask_sentinel

pub mod causal;
pub mod padding;

use candle_core::{DType, Tensor};

use crate::core::AttentionError;

pub use causal::{build_causal_mask, causal_binary_mask};
pub use padding::{padding_mask_from_booleans, padding_mask_from_length};

/// Which encoding a [`Mask`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskKind {
    Additive,
    Binary,
}

/// A `(q_len, k_len)` attention mask.
#[derive(Debug, Clone)]
pub enum Mask {
    Additive(Tensor),
    Binary(Tensor),
}

impl Mask {
    pub fn additive(values: Tensor) -> Self {
        Mask::Additive(values)
    }

    pub fn binary(values: Tensor) -> Self {
        Mask::Binary(values)
    }

    /// Classifies an untagged mask: additive if any entry is below `threshold`,
    /// binary otherwise.
    ///
    /// This misreads additive masks whose most negative entry sits above the
    /// threshold (e.g. `-5000` against `-1e4`); prefer the explicit constructors.
    pub fn infer(values: Tensor, threshold: f64) -> Result<Self, AttentionError> {
        let flat = values.to_dtype(DType::F64)?.flatten_all()?.to_vec1::<f64>()?;
        if flat.iter().any(|&v| v < threshold) {
            Ok(Mask::Additive(values))
        } else {
            Ok(Mask::Binary(values))
        }
    }

    pub fn kind(&self) -> MaskKind {
        match self {
            Mask::Additive(_) => MaskKind::Additive,
            Mask::Binary(_) => MaskKind::Binary,
        }
    }

    pub fn values(&self) -> &Tensor {
        match self {
            Mask::Additive(values) | Mask::Binary(values) => values,
        }
    }

    pub fn dims(&self) -> &[usize] {
        self.values().dims()
    }

    /// Fails unless the mask is exactly `(q_len, k_len)`.
    pub fn expect_dims(&self, q_len: usize, k_len: usize) -> Result<(), AttentionError> {
        if self.dims() == [q_len, k_len] {
            Ok(())
        } else {
            Err(AttentionError::shape(format!(
                "mask must have shape ({q_len}, {k_len}), got {:?}",
                self.dims()
            )))
        }
    }

    /// Applies the mask to a `(q_len, k_len)` score matrix.
    pub fn apply(&self, scores: &Tensor, sentinel: f64) -> Result<Tensor, AttentionError> {
        let (q_len, k_len) = scores
            .dims2()
            .map_err(|_| AttentionError::shape("scores must be (q_len, k_len)"))?;
        self.expect_dims(q_len, k_len)?;

        let masked = match self {
            Mask::Additive(values) => scores.add(&values.to_dtype(scores.dtype())?)?,
            Mask::Binary(values) => {
                let forbidden = values.eq(&values.zeros_like()?)?;
                let fill = Tensor::full(sentinel, (q_len, k_len), scores.device())?
                    .to_dtype(scores.dtype())?;
                forbidden.where_cond(&fill, scores)?
            }
        };
        Ok(masked)
    }

    /// Indices of query rows that cannot attend to any key.
    ///
    /// For additive masks a position counts as removed when its value is below
    /// `additive_threshold` (which includes `-inf`).
    pub fn degenerate_rows(&self, additive_threshold: f64) -> Result<Vec<usize>, AttentionError> {
        let rows = self.values().to_dtype(DType::F64)?.to_vec2::<f64>()?;
        let removed = |v: f64| match self {
            Mask::Additive(_) => v < additive_threshold,
            Mask::Binary(_) => v == 0.0,
        };
        Ok(rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|&v| removed(v)))
            .map(|(idx, _)| idx)
            .collect())
    }
}
