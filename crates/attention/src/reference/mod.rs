//! Portable, exact implementations of scaled dot-product attention.
//!
//! These paths favour clarity over absolute performance and serve as the
//! baseline every other entry point in the crate delegates to.

pub mod exact;

pub use exact::{attend, attend_with_weights, attention_weights, AttentionOutput, ExactAttention};
