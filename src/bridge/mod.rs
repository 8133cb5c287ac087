// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the boundary between Arrow columns and the Arrow-agnostic casting
// engine. The engine itself only ever sees `TypedArray`s with in-band null sentinels;
// everything Arrow-specific (validity bitmaps, time units, string offsets) is
// resolved here.
//
// Data Flow:
//
//   1. [Stateless API (soft_convert_arrow_column, ...)] -> Receives `&dyn Array`
//         |
//         `-> a. Calls `arrow_impl` to convert `&dyn Array` -> `TypedArray`
//         |        (nulls re-encoded through the promotion rules, units -> ns)
//         |
//         `-> b. Calls the engine (`cast::*`) with the `TypedArray`
//
//   2. [Engine] -> Returns a `TypedArray` of the decided dtype
//
//   3. [arrow_impl] -> Turns sentinels back into validity bits -> `ArrayRef`
//
// ====================================================================================
pub mod arrow_impl;
pub mod stateless_api;

pub use arrow_impl::{typed_array_from_arrow, typed_array_to_arrow};
pub use stateless_api::{downcast_arrow_column, infer_arrow_column, soft_convert_arrow_column};
