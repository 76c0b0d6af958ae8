//! Scaled dot-product attention primitives for the transformer project.
//!
//! Every kernel operates on rank-2 tensors: `q` is `(q_len, d_k)`, `k` is
//! `(k_len, d_k)` and `v` is `(k_len, d_v)`. Scores, softmax and the weighted
//! sum run in `f32` by default (see [`Precision`]); the output matches the
//! dtype of `q`.
//!
//! Masks are explicit: a [`Mask`] is either additive (added to the scores) or
//! binary (`0` entries are overwritten with a large negative sentinel).
//! [`Mask::infer`] recovers the kind from raw values for callers that only
//! have a tensor.
//!
//! Multi-head attention splits a jointly projected `(seq_len, d_model)` tensor
//! into contiguous column blocks, attends each block independently and merges
//! the results (see [`heads`]).

pub mod core;
pub mod heads;
pub mod masks;
pub mod projection;
pub mod reference;
pub mod softmax;

pub use core::{Attention, AttentionError, Config, Precision};
pub use heads::{merge_heads, multi_head_attend, multi_head_attend_with, split_heads, HeadLayout};
pub use masks::{
    build_causal_mask, causal_binary_mask, padding_mask_from_booleans, padding_mask_from_length,
    Mask, MaskKind,
};
pub use projection::{project_qkv, Qkv, QkvWeights};
pub use reference::{attend, attend_with_weights, attention_weights, AttentionOutput, ExactAttention};
pub use softmax::stable_softmax_last_dim;
