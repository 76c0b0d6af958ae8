pub mod sinusoidal;

pub use sinusoidal::{add_positional_encoding, sinusoidal_table, SinusoidalConfig};
