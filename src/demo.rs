//! Small, deterministic walkthroughs of each building block.
//!
//! Every runner draws its inputs from a [`StdRng`] seeded with
//! [`DemoConfig::seed`], so two runs with the same config print the same
//! tensors.

use std::fmt;

use anyhow::{Context, Result};
use attention::{
    build_causal_mask, causal_binary_mask, multi_head_attend_with, project_qkv, ExactAttention,
    QkvWeights,
};
use candle_core::{DType, Device, Tensor};
use embedding::positional::{add_positional_encoding, SinusoidalConfig};
use layers::{dense, LayerNorm, NormConfig};
use rand::{rngs::StdRng, SeedableRng};

use crate::{random_matrix, DemoConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    SelfAttention,
    MaskedAttention,
    MultiHead,
    LayerNorm,
    Positional,
    Matmul,
}

impl Demo {
    pub const ALL: [Demo; 6] = [
        Demo::SelfAttention,
        Demo::MaskedAttention,
        Demo::MultiHead,
        Demo::LayerNorm,
        Demo::Positional,
        Demo::Matmul,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Demo::SelfAttention => "self-attention",
            Demo::MaskedAttention => "masked-attention",
            Demo::MultiHead => "multi-head",
            Demo::LayerNorm => "layer-norm",
            Demo::Positional => "positional",
            Demo::Matmul => "matmul",
        }
    }
}

/// Labelled tensors produced by one demo run.
#[derive(Debug)]
pub struct DemoReport {
    pub demo: Demo,
    entries: Vec<(String, Tensor)>,
}

impl DemoReport {
    fn new(demo: Demo) -> Self {
        Self {
            demo,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, label: impl Into<String>, tensor: Tensor) {
        self.entries.push((label.into(), tensor));
    }

    pub fn get(&self, label: &str) -> Option<&Tensor> {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, tensor)| tensor)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Display for DemoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.demo.name())?;
        for (label, tensor) in &self.entries {
            writeln!(f, "{label} {:?}:", tensor.dims())?;
            writeln!(f, "{tensor}")?;
        }
        Ok(())
    }
}

pub fn run(demo: Demo, cfg: &DemoConfig, device: &Device) -> Result<DemoReport> {
    log::debug!("running {} with {:?}", demo.name(), cfg);
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    match demo {
        Demo::SelfAttention => self_attention(cfg, &mut rng, device),
        Demo::MaskedAttention => masked_attention(cfg, &mut rng, device),
        Demo::MultiHead => multi_head(cfg, &mut rng, device),
        Demo::LayerNorm => layer_norm(cfg, &mut rng, device),
        Demo::Positional => positional(cfg, device),
        Demo::Matmul => matmul(cfg, &mut rng, device),
    }
    .with_context(|| format!("{} demo failed", demo.name()))
}

fn single_head_inputs(
    cfg: &DemoConfig,
    rng: &mut StdRng,
    device: &Device,
) -> Result<(Tensor, QkvWeights)> {
    let x = random_matrix(rng, cfg.seq_len, cfg.d_model, device)?;
    let weights = QkvWeights::new(
        random_matrix(rng, cfg.d_model, cfg.d_k, device)?,
        random_matrix(rng, cfg.d_model, cfg.d_k, device)?,
        random_matrix(rng, cfg.d_model, cfg.d_v, device)?,
    )?;
    Ok((x, weights))
}

fn self_attention(cfg: &DemoConfig, rng: &mut StdRng, device: &Device) -> Result<DemoReport> {
    let (x, weights) = single_head_inputs(cfg, rng, device)?;
    let (q, k, v) = weights.project(&x)?.into_tuple();
    let out = ExactAttention::new().attend_with_weights(&q, &k, &v, None, &cfg.attention)?;

    let mut report = DemoReport::new(Demo::SelfAttention);
    report.push("input", x);
    report.push("weights", out.weights);
    report.push("output", out.output);
    Ok(report)
}

fn masked_attention(cfg: &DemoConfig, rng: &mut StdRng, device: &Device) -> Result<DemoReport> {
    let (x, weights) = single_head_inputs(cfg, rng, device)?;
    let (q, k, v) = weights.project(&x)?.into_tuple();
    let kernel = ExactAttention::new();

    let additive = build_causal_mask(device, cfg.seq_len, cfg.seq_len)?;
    let binary = causal_binary_mask(device, cfg.seq_len, cfg.seq_len)?;
    let with_additive = kernel.attend_with_weights(&q, &k, &v, Some(&additive), &cfg.attention)?;
    let with_binary = kernel.attend_with_weights(&q, &k, &v, Some(&binary), &cfg.attention)?;

    let mut report = DemoReport::new(Demo::MaskedAttention);
    report.push("causal_mask", additive.values().clone());
    report.push("weights", with_additive.weights);
    report.push("output_additive", with_additive.output);
    report.push("output_binary", with_binary.output);
    Ok(report)
}

fn multi_head(cfg: &DemoConfig, rng: &mut StdRng, device: &Device) -> Result<DemoReport> {
    let x = random_matrix(rng, cfg.seq_len, cfg.d_model, device)?;
    let w_q = random_matrix(rng, cfg.d_model, cfg.d_model, device)?;
    let w_k = random_matrix(rng, cfg.d_model, cfg.d_model, device)?;
    let w_v = random_matrix(rng, cfg.d_model, cfg.d_model, device)?;
    let (q, k, v) = project_qkv(&x, &w_q, &w_k, &w_v)?;

    let output = multi_head_attend_with(
        &ExactAttention::new(),
        &q,
        &k,
        &v,
        cfg.n_heads,
        &cfg.attention,
    )?;

    let mut report = DemoReport::new(Demo::MultiHead);
    report.push("input", x);
    report.push("output", output);
    Ok(report)
}

fn layer_norm(cfg: &DemoConfig, rng: &mut StdRng, device: &Device) -> Result<DemoReport> {
    let batch = 2;
    let x = random_matrix(rng, batch * cfg.seq_len, cfg.d_model, device)?
        .reshape((batch, cfg.seq_len, cfg.d_model))?;
    let gamma = Tensor::ones(cfg.d_model, DType::F32, device)?;
    let beta = Tensor::zeros(cfg.d_model, DType::F32, device)?;
    let norm = LayerNorm::new(
        gamma,
        beta,
        NormConfig::new(cfg.d_model).with_epsilon(cfg.epsilon),
    )?;
    let output = norm.forward(&x)?;

    let mut report = DemoReport::new(Demo::LayerNorm);
    report.push("input", x);
    report.push("output", output);
    Ok(report)
}

fn positional(cfg: &DemoConfig, device: &Device) -> Result<DemoReport> {
    let table = SinusoidalConfig::new(cfg.seq_len, cfg.d_model).build(device)?;
    let encoded = add_positional_encoding(&Tensor::zeros(
        (cfg.seq_len, cfg.d_model),
        DType::F32,
        device,
    )?)?;

    let mut report = DemoReport::new(Demo::Positional);
    report.push("table", table);
    report.push("encoded_zeros", encoded);
    Ok(report)
}

fn matmul(cfg: &DemoConfig, rng: &mut StdRng, device: &Device) -> Result<DemoReport> {
    let a = random_matrix(rng, cfg.seq_len, cfg.d_model, device)?;
    let b = random_matrix(rng, cfg.d_model, cfg.d_k, device)?;
    let v = random_matrix(rng, cfg.d_model, 1, device)?.squeeze(1)?;

    let mut report = DemoReport::new(Demo::Matmul);
    report.push("product", dense::matmul(&a, &b)?);
    report.push("matvec", dense::matvec(&a, &v)?);
    report.push("transpose", dense::transpose(&a)?);
    Ok(report)
}
