//==================================================================================
// 2. Unit Tests
//==================================================================================

use crate::null_handling::bitmap::*;
use crate::null_handling::INAT;
use arrow::array::{Array, Int64Array};
use arrow::buffer::NullBuffer;
use bitvec::prelude::*;

#[test]
fn test_mask_from_arrow_nulls() {
    let source_array = Int64Array::from(vec![Some(10), None, Some(30)]);
    let mask = mask_from_null_buffer(source_array.nulls(), source_array.len());
    assert_eq!(mask, bitvec![u8, Lsb0; 0, 1, 0]);
}

#[test]
fn test_mask_without_null_buffer_is_all_clear() {
    let mask = mask_from_null_buffer(None, 4);
    assert_eq!(mask.len(), 4);
    assert!(mask.not_any());
}

#[test]
fn test_null_buffer_roundtrip() {
    let mask = bitvec![u8, Lsb0; 1, 0, 0, 1];
    let nulls = null_buffer_from_mask(&mask).unwrap();
    assert_eq!(nulls.null_count(), 2);
    assert!(nulls.is_null(0));
    assert!(nulls.is_valid(1));
    assert_eq!(mask_from_null_buffer(Some(&nulls), 4), mask);
}

#[test]
fn test_no_nulls_means_no_buffer() {
    let mask = bitvec![u8, Lsb0; 0, 0];
    assert!(null_buffer_from_mask(&mask).is_none());
}

#[test]
fn test_apply_sentinel() {
    let mut values = vec![1i64, 2, 3];
    let nulls = NullBuffer::from(vec![true, false, true]);
    let mask = mask_from_null_buffer(Some(&nulls), 3);
    apply_sentinel(&mut values, &mask, INAT);
    assert_eq!(values, vec![1, INAT, 3]);
}
