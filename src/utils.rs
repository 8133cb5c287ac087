//! Small shared helpers: tolerance comparison and the best-effort combinator.

use crate::error::CastError;

/// Element-wise `|a - b| <= atol + rtol * |b|`. Equal infinities are close; any NaN
/// makes the arrays unequal.
pub fn allclose(a: &[f64], b: &[f64], rtol: f64, atol: f64) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            if x.is_finite() && y.is_finite() {
                (x - y).abs() <= atol + rtol * y.abs()
            } else {
                x == y
            }
        })
}

/// Runs one fallible step of a best-effort conversion. Failures are logged at
/// `debug` and turned into `None`; the caller keeps its input.
pub(crate) fn best_effort<T>(step: &str, result: Result<T, CastError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("{} failed, keeping input: {}", step, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allclose() {
        assert!(allclose(&[1.0, 2.0], &[1.0, 2.000001], 1e-5, 1e-8));
        assert!(!allclose(&[1.0, 2.0], &[1.0, 2.1], 1e-5, 1e-8));
        assert!(!allclose(&[f64::NAN], &[f64::NAN], 1e-5, 1e-8));
        assert!(!allclose(&[1.0], &[1.0, 2.0], 1e-5, 1e-8));
    }

    #[test]
    fn test_allclose_infinities() {
        let infs = [f64::INFINITY, f64::NEG_INFINITY];
        assert!(allclose(&infs, &infs, 1e-5, 1e-8));
        assert!(!allclose(&[f64::INFINITY], &[f64::NEG_INFINITY], 1e-5, 1e-8));
        assert!(!allclose(&[f64::INFINITY], &[1.0], 1e-5, 1e-8));
    }

    #[test]
    fn test_best_effort() {
        assert_eq!(best_effort("ok", Ok::<_, CastError>(3)), Some(3));
        assert_eq!(best_effort::<i32>("bad", Err(CastError::EmptyTypeList)), None);
    }
}
