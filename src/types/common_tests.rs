//==================================================================================
// Unit Tests for the common-type lattice
//==================================================================================

use super::*;

fn numeric_dtypes() -> Vec<DType> {
    vec![
        DType::BOOL,
        DType::INT8,
        DType::INT16,
        DType::INT32,
        DType::INT64,
        DType::UINT8,
        DType::UINT16,
        DType::UINT32,
        DType::UINT64,
        DType::FLOAT32,
        DType::FLOAT64,
        DType::COMPLEX64,
        DType::COMPLEX128,
    ]
}

#[test]
fn test_empty_list_is_an_error() {
    assert!(matches!(common_type(&[]), Err(CastError::EmptyTypeList)));
}

#[test]
fn test_reflexive_for_every_dtype() {
    let mut all = numeric_dtypes();
    all.extend([
        DType::DATETIME_NS,
        DType::datetime_tz("UTC"),
        DType::Duration,
        DType::Str,
        DType::Object,
        DType::categorical(),
    ]);
    for d in all {
        assert_eq!(common_type(&[d.clone(), d.clone(), d.clone()]).unwrap(), d);
    }
}

#[test]
fn test_repeated_datetime_does_not_collapse_to_object() {
    let dt = DType::DATETIME_NS;
    assert_eq!(common_type(&[dt.clone(), dt.clone()]).unwrap(), dt);
}

#[test]
fn test_mixed_timezones_resolve_to_naive_datetime() {
    let got = common_type(&[DType::datetime_tz("UTC"), DType::DATETIME_NS]).unwrap();
    assert_eq!(got, DType::DATETIME_NS);
}

#[test]
fn test_extension_forces_object() {
    let got = common_type(&[DType::categorical(), DType::INT64]).unwrap();
    assert_eq!(got, DType::Object);
}

#[test]
fn test_non_numeric_pairs_are_object() {
    assert_eq!(common_type(&[DType::DATETIME_NS, DType::INT64]).unwrap(), DType::Object);
    assert_eq!(common_type(&[DType::Duration, DType::FLOAT64]).unwrap(), DType::Object);
    assert_eq!(common_type(&[DType::Str, DType::INT8]).unwrap(), DType::Object);
}

#[test]
fn test_lattice_is_commutative_and_idempotent() {
    let all = numeric_dtypes();
    for a in &all {
        assert_eq!(numeric_common_pair(a, a).as_ref(), Some(a));
        for b in &all {
            let ab = numeric_common_pair(a, b);
            assert_eq!(ab, numeric_common_pair(b, a), "{} vs {}", a, b);
            let c = ab.unwrap();
            // The result covers both operands.
            assert_eq!(numeric_common_pair(&c, a).as_ref(), Some(&c));
            assert_eq!(numeric_common_pair(&c, b).as_ref(), Some(&c));
        }
    }
}

#[test]
fn test_lattice_spot_checks() {
    let cases = [
        (DType::BOOL, DType::INT8, DType::INT8),
        (DType::INT8, DType::UINT8, DType::INT16),
        (DType::INT64, DType::UINT32, DType::INT64),
        (DType::INT32, DType::UINT32, DType::INT64),
        (DType::INT8, DType::UINT64, DType::FLOAT64),
        (DType::INT16, DType::FLOAT32, DType::FLOAT32),
        (DType::INT32, DType::FLOAT32, DType::FLOAT64),
        (DType::UINT64, DType::FLOAT32, DType::FLOAT64),
        (DType::COMPLEX64, DType::FLOAT64, DType::COMPLEX128),
        (DType::COMPLEX64, DType::INT16, DType::COMPLEX64),
        (DType::COMPLEX64, DType::INT32, DType::COMPLEX128),
        (DType::BOOL, DType::COMPLEX64, DType::COMPLEX64),
    ];
    for (a, b, want) in cases {
        assert_eq!(common_type(&[a.clone(), b.clone()]).unwrap(), want, "{} + {}", a, b);
    }
}

#[test]
fn test_fold_over_three_entries() {
    let got = common_type(&[DType::INT8, DType::UINT16, DType::FLOAT32]).unwrap();
    assert_eq!(got, DType::FLOAT64);
}
