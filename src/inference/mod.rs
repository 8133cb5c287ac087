//! Inference over dynamic values: the dtype of a single scalar, and the
//! dominant kind of an object array.

pub mod kind;
pub mod scalar;

pub use kind::{infer_kind, is_possible_datetimelike, InferredKind};
pub use scalar::{infer_scalar, maybe_convert_scalar};
