//! Fixed sinusoidal positional encodings.
//!
//! For position `pos` and column pair `(2i, 2i + 1)`:
//!
//! ```text
//! PE(pos, 2i)     = sin(pos / base^(2i / d_model))
//! PE(pos, 2i + 1) = cos(pos / base^(2i / d_model))
//! ```
//!
//! The wavelengths form a geometric progression from `2π` to `base · 2π`, so
//! `PE(pos + k)` is a linear function of `PE(pos)` for any fixed offset `k`.
//! Odd `d_model` is accepted; the final column is then a sine without its
//! cosine partner.

use candle_core::{DType, Device, Tensor};

use crate::{EmbeddingError, Result};

/// Shape and dtype of a sinusoidal table.
#[derive(Debug, Clone, PartialEq)]
pub struct SinusoidalConfig {
    /// Number of positions (rows) to encode.
    pub positions: usize,
    /// Embedding width (columns).
    pub d_model: usize,
    /// Base of the wavelength progression.
    pub base: f64,
    /// Output dtype. Angles are always evaluated in `f64`.
    pub dtype: DType,
}

impl SinusoidalConfig {
    /// Half precision output with the conventional `10_000` base.
    pub fn new(positions: usize, d_model: usize) -> Self {
        Self {
            positions,
            d_model,
            base: 10_000.0,
            dtype: DType::F16,
        }
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.positions == 0 {
            return Err(EmbeddingError::InvalidArgument(
                "positions must be greater than zero".into(),
            ));
        }
        if self.d_model == 0 {
            return Err(EmbeddingError::InvalidArgument(
                "d_model must be greater than zero".into(),
            ));
        }
        if !(self.base.is_finite() && self.base > 1.0) {
            return Err(EmbeddingError::InvalidArgument(format!(
                "base must be finite and greater than one, got {}",
                self.base
            )));
        }
        if !self.dtype.is_float() {
            return Err(EmbeddingError::InvalidArgument(format!(
                "positional tables must use a float dtype, got {:?}",
                self.dtype
            )));
        }
        Ok(())
    }

    /// Inverse frequency for each sine/cosine column pair.
    fn inverse_frequencies(&self) -> Vec<f64> {
        let scale = -(self.base.ln() / self.d_model as f64);
        (0..self.d_model)
            .step_by(2)
            .map(|even| (even as f64 * scale).exp())
            .collect()
    }

    /// Builds the `(positions, d_model)` table on `device`.
    pub fn build(&self, device: &Device) -> Result<Tensor> {
        self.validate()?;
        let inv_freq = self.inverse_frequencies();

        let mut data = Vec::with_capacity(self.positions * self.d_model);
        for pos in 0..self.positions {
            for col in 0..self.d_model {
                let angle = pos as f64 * inv_freq[col / 2];
                let value = if col % 2 == 0 { angle.sin() } else { angle.cos() };
                data.push(value);
            }
        }

        log::debug!(
            "sinusoidal table built: positions={} d_model={} dtype={:?}",
            self.positions,
            self.d_model,
            self.dtype
        );

        let table = Tensor::from_vec(data, (self.positions, self.d_model), device)?;
        Ok(table.to_dtype(self.dtype)?)
    }
}

/// `(positions, d_model)` table in `f16` with the default base.
pub fn sinusoidal_table(positions: usize, d_model: usize, device: &Device) -> Result<Tensor> {
    SinusoidalConfig::new(positions, d_model).build(device)
}

/// Adds the positional table to a `(seq_len, d_model)` input, keeping its dtype.
pub fn add_positional_encoding(x: &Tensor) -> Result<Tensor> {
    let (seq_len, d_model) = x.dims2().map_err(|_| {
        EmbeddingError::InvalidArgument(format!(
            "expected (seq_len, d_model) input, got {:?}",
            x.dims()
        ))
    })?;
    let table = SinusoidalConfig::new(seq_len, d_model)
        .with_dtype(x.dtype())
        .build(x.device())?;
    Ok(x.add(&table)?)
}
