pub use attention;
pub use embedding;
pub use layers;

pub mod config;
pub mod demo;

pub use config::{ConfigError, DemoConfig};

use anyhow::Result;
use candle_core::{Device, Tensor};
use rand::{rngs::StdRng, Rng};

/// Picks CUDA when available unless `CANDLE_FORCE_CPU` is set.
pub fn setup_device() -> Result<Device> {
    if std::env::var("CANDLE_FORCE_CPU").is_ok() {
        log::info!("CANDLE_FORCE_CPU set, using CPU backend");
        return Ok(Device::Cpu);
    }

    match Device::cuda_if_available(0) {
        Ok(device) if device.is_cuda() => {
            log::info!("CUDA device selected: {:?}", device);
            Ok(device)
        }
        Ok(_) | Err(_) => {
            log::info!("using CPU backend");
            Ok(Device::Cpu)
        }
    }
}

/// `(rows, cols)` f32 matrix with entries drawn uniformly from `[-1, 1)`.
pub fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize, device: &Device) -> Result<Tensor> {
    let data: Vec<f32> = (0..rows * cols).map(|_| rng.gen_range(-1.0..1.0)).collect();
    Ok(Tensor::from_vec(data, (rows, cols), device)?)
}
