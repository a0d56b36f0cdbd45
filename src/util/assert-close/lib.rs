#[macro_use]
extern crate failure;

use std::fmt;
use ndarray::{ArrayBase, Data, Dimension};

pub const DEFAULT_NONZERO_TOL: f64 = 1e-9;

/// Assert that two values are close, using relative and absolute tolerances.
///
/// ```
/// # #[macro_use] extern crate asgrid_assert_close;
/// # fn main() {
/// assert_close!(rel=1e-8, abs=1e-12, 0.1 + 0.2, 0.3);
/// assert_close!(abs=1e-10, vec![1.0, 2.0], vec![1.0, 2.0 + 1e-12], "step {}", 3);
/// # }
/// ```
#[macro_export]
macro_rules! assert_close {
    ($($t:tt)*) => {
        $crate::assert_close_impl!{@parsing [$($t)*] [[@rel $crate::DEFAULT_NONZERO_TOL] [@abs 0.0]]}
    };
}

#[macro_export]
macro_rules! debug_assert_close {
    ($($t:tt)*) => {{
        #[cfg(debug_assertions)] {
            $crate::assert_close!{$($t)*}
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! assert_close_impl {
    (@parsing [rel=$tol:expr, $($rest:tt)*] [$($assignment:tt)*]) => {
        $crate::assert_close_impl!(@parsing [$($rest)*] [$($assignment)* [@rel $tol]]);
    };
    (@parsing [abs=$tol:expr, $($rest:tt)*] [$($assignment:tt)*]) => {
        $crate::assert_close_impl!(@parsing [$($rest)*] [$($assignment)* [@abs $tol]]);
    };
    (@parsing [$a:expr, $b:expr $(,)*] $assignments:tt) => {
        $crate::assert_close_impl!(@expand $assignments [@comp $a, $b] [@fmt "not nearly equal!"])
    };
    (@parsing [$a:expr, $b:expr, $($fmt:tt)+] $assignments:tt) => {
        $crate::assert_close_impl!(@expand $assignments [@comp $a, $b] [@fmt $($fmt)+])
    };
    (@expand [$($assignment:tt)*] [@comp $a:expr, $b:expr] [@fmt $($fmt:tt)+] ) => {
        #[allow(unused_mut)]
        #[allow(unused_assignments)]
        {
            let a = $a;
            let b = $b;

            let mut abs;
            let mut rel;
            $(
                $crate::assert_close_impl!{@stmt::assign [abs, rel] $assignment}
            )*

            if let Err(e) = $crate::CheckClose::check_close(&a, &b, $crate::Tolerances { abs, rel }) {
                panic!(
                "{} (tolerances: rel={}, abs={})\n left: {:?}\nright: {:?}\n{}",
                 format!($($fmt)*), rel, abs, a, b, e);
            }
        }
    };
    (@stmt::assign [$abs:ident, $rel:ident] [@abs $tol:expr]) => { $abs = $tol; };
    (@stmt::assign [$abs:ident, $rel:ident] [@rel $tol:expr]) => { $rel = $tol; };
}

#[doc(hidden)]
#[inline]
pub fn __is_close(a: f64, b: f64, tol: Tolerances) -> bool {
    let Tolerances { abs, rel } = tol;
    assert!(rel >= 0.0);
    assert!(abs >= 0.0);

    // catch infinities of same sign (and NaN == NaN is deliberately false)
    if a == b { return true; }

    if a.is_infinite() || b.is_infinite() { return false; }

    (a - b).abs() < abs.max(rel * a.abs()).max(rel * b.abs())
}

#[derive(Debug, Copy, Clone)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

#[derive(Debug, Fail)]
pub struct CheckCloseError {
    /// Flat index of the first offending element (0 for scalars).
    pub index: usize,
    pub values: (f64, f64),
    pub tol: Tolerances,
}

impl fmt::Display for CheckCloseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (left, right) = self.values;
        write!(f, "failed at element {}:
  left: {:?}
 right: {:?}
   tol: {:?}", self.index, left, right, self.tol)
    }
}

pub trait CheckClose<Rhs: ?Sized = Self> {
    /// Test that all values of self and other are close.
    fn check_close(&self, other: &Rhs, tol: Tolerances) -> Result<(), CheckCloseError>;
}

impl CheckClose for f64 {
    #[inline]
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError> {
        match __is_close(*self, *other, tol) {
            true => Ok(()),
            false => Err(CheckCloseError { index: 0, values: (*self, *other), tol }),
        }
    }
}

impl<'a, T: ?Sized + CheckClose> CheckClose for &'a T {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { CheckClose::check_close(*self, *other, tol) }
}

fn check_iter<'a>(
    a: impl ExactSizeIterator<Item=&'a f64>,
    b: impl ExactSizeIterator<Item=&'a f64>,
    tol: Tolerances,
) -> Result<(), CheckCloseError> {
    assert_eq!(a.len(), b.len(), "length mismatch");
    for (index, (&a, &b)) in a.zip(b).enumerate() {
        if !__is_close(a, b, tol) {
            return Err(CheckCloseError { index, values: (a, b), tol });
        }
    }
    Ok(())
}

impl CheckClose for [f64] {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { check_iter(self.iter(), other.iter(), tol) }
}

impl CheckClose for Vec<f64> {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(&other[..], tol) }
}

impl CheckClose<[f64]> for Vec<f64> {
    fn check_close(&self, other: &[f64], tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(other, tol) }
}

impl<S1, S2, D> CheckClose<ArrayBase<S2, D>> for ArrayBase<S1, D>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    fn check_close(&self, other: &ArrayBase<S2, D>, tol: Tolerances) -> Result<(), CheckCloseError> {
        assert_eq!(self.shape(), other.shape(), "shape mismatch");
        // logical order on both sides, regardless of memory layout
        let a: Vec<f64> = self.iter().cloned().collect();
        let b: Vec<f64> = other.iter().cloned().collect();
        a.check_close(&b, tol)
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use ndarray::array;

    #[test]
    fn macro_output_can_compile() {
        assert_close!(1.0, 1.0);
        assert_close!(abs=1e-8, 1.0, 1.0);
        assert_close!(rel=1e-8, abs=1e-8, 1.0, 1.0);
        assert_close!(abs=1e-8, 1.0, 1.0,);
        assert_close!(abs=1e-8, vec![1.0, 2.0], vec![1.0, 2.0], "{}", "hello");
    }

    #[test]
    fn arrays_compare_in_logical_order() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = a.t().to_owned();
        assert_close!(abs=0.0, a.t(), b.view());
    }

    #[test]
    fn error_reports_first_bad_index() {
        use crate::CheckClose;
        let tol = crate::Tolerances { abs: 1e-3, rel: 0.0 };
        let err = vec![0.0, 1.0, 2.5].check_close(&vec![0.0, 1.0, 2.0], tol).unwrap_err();
        assert_eq!(err.index, 2);
    }

    #[test]
    #[should_panic]
    fn not_close() {
        assert_close!(abs=0.0, rel=0.0, 1.0, 1.1);
    }

    #[test]
    #[should_panic]
    fn nan_is_never_close() {
        assert_close!(abs=1.0, std::f64::NAN, std::f64::NAN);
    }
}
