//! Layer normalisation over the trailing feature axis.
//!
//! Inputs may have any rank as long as the last dimension equals
//! [`NormConfig::hidden_size`]; `(seq, hidden)` and `(batch, seq, hidden)` are
//! the common cases. Each vector along the last axis is normalised
//! independently, so the result never depends on batch size or sequence length.
//! Mean and (population) variance are computed in `f32` (or `f64` for `f64`
//! inputs) before the output is cast back to the input dtype.

use candle_core::{DType, Tensor, D};

use crate::{checks, LayerError, Result};

/// Configuration for [`LayerNorm`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormConfig {
    /// Size of the hidden dimension being normalised.
    pub hidden_size: usize,
    /// Numeric stabiliser added to the variance before the square root.
    pub epsilon: f64,
    /// Whether post-normalisation affine parameters are applied.
    pub elementwise_affine: bool,
}

impl NormConfig {
    pub fn new(hidden_size: usize) -> Self {
        Self {
            hidden_size,
            epsilon: 1e-5,
            elementwise_affine: true,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.hidden_size == 0 {
            return Err(LayerError::InvalidParameter(
                "hidden_size must be greater than zero".into(),
            ));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(LayerError::InvalidParameter(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

const PARAM_DTYPES: &[DType] = &[DType::F16, DType::BF16, DType::F32, DType::F64];

/// `y = gamma * (x - mean) / sqrt(var + epsilon) + beta` along the last axis.
#[derive(Debug, Clone)]
pub struct LayerNorm {
    config: NormConfig,
    weight: Option<Tensor>,
    bias: Option<Tensor>,
}

impl LayerNorm {
    /// Constructs a LayerNorm with scale (`gamma`) and shift (`beta`) parameters.
    pub fn new(weight: Tensor, bias: Tensor, mut config: NormConfig) -> Result<Self> {
        config.elementwise_affine = true;
        config.validate()?;
        for (label, param) in [("norm.weight", &weight), ("norm.bias", &bias)] {
            checks::expect_shape(label, param, &[config.hidden_size])?;
            checks::expect_dtype_in(label, param, PARAM_DTYPES)?;
        }
        Ok(Self {
            config,
            weight: Some(weight),
            bias: Some(bias),
        })
    }

    /// Constructs a LayerNorm without affine parameters (scale = 1, bias = 0).
    pub fn without_affine(mut config: NormConfig) -> Result<Self> {
        config.elementwise_affine = false;
        config.validate()?;
        Ok(Self {
            config,
            weight: None,
            bias: None,
        })
    }

    pub fn config(&self) -> &NormConfig {
        &self.config
    }

    /// Normalises `hidden` along its last axis, preserving shape and dtype.
    pub fn forward(&self, hidden: &Tensor) -> Result<Tensor> {
        checks::expect_last_dim("norm.input", hidden, self.config.hidden_size)?;
        checks::expect_dtype_in("norm.input", hidden, PARAM_DTYPES)?;

        let dtype = hidden.dtype();
        let reduction = match dtype {
            DType::F64 => DType::F64,
            _ => DType::F32,
        };
        let hidden_size = self.config.hidden_size as f64;

        let compute = hidden.to_dtype(reduction)?;
        let mean = (compute.sum_keepdim(D::Minus1)? / hidden_size)?;
        let centered = compute.broadcast_sub(&mean)?;
        let variance = (centered.sqr()?.sum_keepdim(D::Minus1)? / hidden_size)?;
        let denom = (variance + self.config.epsilon)?.sqrt()?;
        let mut normalized = centered.broadcast_div(&denom)?;

        if let Some(weight) = &self.weight {
            normalized = normalized.broadcast_mul(&weight.to_dtype(reduction)?)?;
        }
        if let Some(bias) = &self.bias {
            normalized = normalized.broadcast_add(&bias.to_dtype(reduction)?)?;
        }

        Ok(normalized.to_dtype(dtype)?)
    }
}

/// Functional form of [`LayerNorm::forward`] with explicit parameters.
pub fn layer_normalization(
    x: &Tensor,
    gamma: &Tensor,
    beta: &Tensor,
    epsilon: f64,
) -> Result<Tensor> {
    let hidden = x
        .dims()
        .last()
        .copied()
        .ok_or_else(|| LayerError::shape("norm.input", "scalar input has no feature axis"))?;
    let config = NormConfig::new(hidden).with_epsilon(epsilon);
    LayerNorm::new(gamma.clone(), beta.clone(), config)?.forward(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use candle_nn::ops;

    fn build_input(device: &Device, dtype: DType, dims: (usize, usize, usize)) -> Result<Tensor> {
        let (batch, seq, hidden) = dims;
        let data = (0..batch * seq * hidden)
            .map(|i| ((i * 7 % 11) as f32 * 0.25_f32) - 1.5_f32)
            .collect::<Vec<_>>();
        Ok(Tensor::from_vec(data, (batch, seq, hidden), device)?.to_dtype(dtype)?)
    }

    fn max_diff(a: &Tensor, b: &Tensor) -> Result<f32> {
        Ok(a.to_dtype(DType::F32)?
            .sub(&b.to_dtype(DType::F32)?)?
            .abs()?
            .max_all()?
            .to_vec0::<f32>()?)
    }

    #[test]
    fn layer_norm_matches_candle_reference_across_dtypes() -> Result<()> {
        let device = Device::Cpu;
        let hidden = 4;
        let config = NormConfig::new(hidden);

        let weight_f32 = Tensor::from_vec(vec![1.0f32, 0.5, -0.25, 1.5], (hidden,), &device)?;
        let bias_f32 = Tensor::from_vec(vec![0.1f32, -0.2, 0.05, 0.0], (hidden,), &device)?;

        for &dtype in &[DType::F32, DType::F16, DType::BF16] {
            let input = build_input(&device, dtype, (2, 3, hidden))?;
            let weight = weight_f32.to_dtype(dtype)?;
            let bias = bias_f32.to_dtype(dtype)?;
            let layer = LayerNorm::new(weight.clone(), bias.clone(), config.clone())?;
            let output = layer.forward(&input)?;

            assert_eq!(output.dims(), input.dims());
            assert_eq!(output.dtype(), dtype);

            let reference = ops::layer_norm(&input, &weight, &bias, config.epsilon as f32)?;
            let tol = match dtype {
                DType::F16 => 1e-2,
                DType::BF16 => 5e-2,
                _ => 5e-4,
            };
            let diff = max_diff(&output, &reference)?;
            assert!(diff < tol, "max diff {} for dtype {:?}", diff, dtype);
        }

        Ok(())
    }

    #[test]
    fn normalised_rows_have_zero_mean_unit_variance() -> Result<()> {
        let device = Device::Cpu;
        let input = build_input(&device, DType::F32, (2, 3, 4))?;
        let output = LayerNorm::without_affine(NormConfig::new(4))?.forward(&input)?;

        for row in output.reshape((6, 4))?.to_vec2::<f32>()? {
            let mean = row.iter().sum::<f32>() / 4.0;
            let var = row.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / 4.0;
            assert!(mean.abs() < 1e-5, "mean {mean}");
            assert!((var - 1.0).abs() < 1e-3, "var {var}");
        }
        Ok(())
    }

    #[test]
    fn custom_gamma_beta_scale_and_shift() -> Result<()> {
        let device = Device::Cpu;
        let x = Tensor::new(&[[1f32, 2., 3., 4.]], &device)?;
        let gamma = Tensor::new(&[0.5f32, 2.0, 1.0, 0.1], &device)?;
        let beta = Tensor::new(&[10f32, -5.0, 0.0, 1.0], &device)?;
        let out = layer_normalization(&x, &gamma, &beta, 1e-5)?.to_vec2::<f32>()?;

        // mean 2.5, variance 1.25
        let std = (1.25f32 + 1e-5).sqrt();
        let expected = [
            0.5 * (-1.5 / std) + 10.0,
            2.0 * (-0.5 / std) - 5.0,
            0.5 / std,
            0.1 * (1.5 / std) + 1.0,
        ];
        for (got, want) in out[0].iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "{got} vs {want}");
        }
        Ok(())
    }

    #[test]
    fn constant_rows_stay_finite() -> Result<()> {
        let device = Device::Cpu;
        let x = Tensor::full(3.0f32, (2, 5), &device)?;
        let out = LayerNorm::without_affine(NormConfig::new(5))?.forward(&x)?;
        let values = out.flatten_all()?.to_vec1::<f32>()?;
        assert!(values.iter().all(|v| v.is_finite() && v.abs() < 1e-6));
        Ok(())
    }

    #[test]
    fn rejects_mismatched_hidden_size() -> Result<()> {
        let device = Device::Cpu;
        let x = Tensor::zeros((2, 3), DType::F32, &device)?;
        let norm = LayerNorm::without_affine(NormConfig::new(4))?;
        assert!(matches!(
            norm.forward(&x),
            Err(LayerError::ShapeMismatch { .. })
        ));

        let gamma = Tensor::ones(3, DType::F32, &device)?;
        let beta = Tensor::zeros(4, DType::F32, &device)?;
        assert!(LayerNorm::new(gamma, beta, NormConfig::new(4)).is_err());
        Ok(())
    }

    #[test]
    fn rejects_non_positive_epsilon() {
        let config = NormConfig::new(4).with_epsilon(0.0);
        assert!(matches!(
            LayerNorm::without_affine(config),
            Err(LayerError::InvalidParameter(_))
        ));
    }
}
