//! This module converts between Arrow validity bitmaps and the engine's
//! sentinel-based null representation.
//!
//! Arrow tracks missing entries out of band in a `NullBuffer` (set bit = valid);
//! the engine's buffers carry them in band as family sentinels and describe them
//! with a `Mask` (set bit = null). These helpers are the seam between the two.

use arrow::buffer::NullBuffer;
use bitvec::prelude::*;

use super::Mask;

//==================================================================================
// 1. Core Logic
//==================================================================================

/// A null mask (set bit = null) for an Arrow column of `len` rows.
pub fn mask_from_null_buffer(nulls: Option<&NullBuffer>, len: usize) -> Mask {
    match nulls {
        Some(nulls) => (0..len).map(|i| nulls.is_null(i)).collect(),
        None => BitVec::repeat(false, len),
    }
}

/// The Arrow validity buffer for a null mask, or `None` when nothing is null.
pub fn null_buffer_from_mask(mask: &BitSlice<u8, Lsb0>) -> Option<NullBuffer> {
    if mask.not_any() {
        return None;
    }
    let validity: Vec<bool> = mask.iter().map(|bit| !*bit).collect();
    Some(NullBuffer::from(validity))
}

/// Overwrites every masked slot with `sentinel`.
pub fn apply_sentinel<T: Copy>(values: &mut [T], mask: &BitSlice<u8, Lsb0>, sentinel: T) {
    for i in mask.iter_ones() {
        values[i] = sentinel;
    }
}

#[cfg(test)]
#[path = "bitmap_tests.rs"]
mod bitmap_tests;
