use crate::RcError;

/// Floating point type used throughout the workspace
pub type Real = f64;

/// Absolute/relative tolerance pair
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, RcError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(RcError::NonFinite { what, value: v })
    }
}

/// Signed mismatch of `actual` against `reference`, normalized by the
/// reference magnitude (never by less than `floor`).
pub fn relative_residual(actual: Real, reference: Real, floor: Real) -> Real {
    (actual - reference) / reference.abs().max(floor)
}

/// Largest absolute entry; zero for an empty slice.
pub fn max_abs(values: &[Real]) -> Real {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

/// Bisection on a bracketed sign change of `f` over `[lo, hi]`.
///
/// Returns `None` if the bracket does not contain a root or `f` is not
/// finite at the ends.
pub fn bisect<F>(mut lo: Real, mut hi: Real, tol: Real, max_iter: usize, f: F) -> Option<Real>
where
    F: Fn(Real) -> Real,
{
    let mut f_lo = f(lo);
    let f_hi = f(hi);
    if !f_lo.is_finite() || !f_hi.is_finite() {
        return None;
    }
    if f_lo == 0.0 {
        return Some(lo);
    }
    if f_hi == 0.0 {
        return Some(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return None;
    }

    for _ in 0..max_iter {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid == 0.0 || (hi - lo).abs() < tol {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn relative_residual_uses_floor() {
        assert!((relative_residual(110.0, 100.0, 1.0) - 0.1).abs() < 1e-12);
        assert!((relative_residual(0.5, 0.0, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn bisect_finds_sqrt_two() {
        let root = bisect(0.0, 2.0, 1e-12, 200, |x| x * x - 2.0).unwrap();
        assert!((root - 2.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn bisect_rejects_unbracketed() {
        assert!(bisect(3.0, 4.0, 1e-12, 200, |x| x * x - 2.0).is_none());
    }

    proptest! {
        #[test]
        fn max_abs_bounds_every_entry(values in proptest::collection::vec(-1e6f64..1e6, 0..20)) {
            let m = max_abs(&values);
            for v in &values {
                prop_assert!(v.abs() <= m);
            }
        }
    }
}
