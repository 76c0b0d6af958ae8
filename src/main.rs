use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use transformer_blocks::{
    demo::{self, Demo},
    setup_device, DemoConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Transformer building block demos", long_about = None)]
struct Args {
    #[arg(short, long, value_name = "PATH", global = true, help = "TOML or JSON demo config")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Seed for the generated inputs")]
    seed: Option<u64>,

    #[arg(long, global = true, help = "Sequence length")]
    seq_len: Option<usize>,

    #[arg(long, global = true, help = "Model width")]
    d_model: Option<usize>,

    #[arg(long, global = true, help = "Number of attention heads")]
    heads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Projected single-head self-attention
    SelfAttention,
    /// Causal attention with additive and binary masks
    MaskedAttention,
    /// Multi-head attention over jointly projected inputs
    MultiHead,
    /// Layer normalization over a (batch, seq, d_model) input
    LayerNorm,
    /// Sinusoidal positional encoding table
    Positional,
    /// Matrix product, matrix-vector product and transpose
    Matmul,
    /// Every demo in turn
    All,
}

impl Command {
    fn demos(self) -> Vec<Demo> {
        match self {
            Command::SelfAttention => vec![Demo::SelfAttention],
            Command::MaskedAttention => vec![Demo::MaskedAttention],
            Command::MultiHead => vec![Demo::MultiHead],
            Command::LayerNorm => vec![Demo::LayerNorm],
            Command::Positional => vec![Demo::Positional],
            Command::Matmul => vec![Demo::Matmul],
            Command::All => Demo::ALL.to_vec(),
        }
    }
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("demo failed: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DemoConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DemoConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(seq_len) = args.seq_len {
        config.seq_len = seq_len;
    }
    if let Some(d_model) = args.d_model {
        config.d_model = d_model;
    }
    if let Some(heads) = args.heads {
        config.n_heads = heads;
    }
    config.attention.apply_env_overrides();
    config.validate()?;

    let device = setup_device()?;
    for demo in args.command.demos() {
        let report = demo::run(demo, &config, &device)?;
        println!("{report}");
    }
    Ok(())
}
