/* ************************************************************************ **
** This file is part of asgrid, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of asgrid is provided under this permissive        **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

//! Thin wrappers around LAPACKe for the handful of dense problems the
//! numerics need, plus Gauss-Legendre rules.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate lapacke;
extern crate lapack_src;
#[cfg(test)]
#[macro_use]
extern crate asgrid_assert_close;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

// counterpart to bail! for typed errors
macro_rules! throw {
    ($e:expr) => { return Err($e.into()) };
}

pub use crate::eigh::{eigh, AsymmetricMatrixError, NonConvergenceError};
mod eigh;

pub use crate::quadrature::GaussRule;
mod quadrature;

pub type FailResult<T> = Result<T, failure::Error>;

#[derive(Debug, Fail)]
#[fail(display = "matrix was perfectly degenerate (pivot {} in column {})", pivot, column)]
pub struct DegenerateMatrixError {
    pub column: usize,
    pub pivot: f64,
}

#[derive(Debug, Fail)]
#[fail(display = "shape mismatch: {:?} vs {:?}", _0, _1)]
pub struct ShapeError(pub Vec<usize>, pub Vec<usize>);

#[derive(Debug, Fail)]
#[fail(display = "error during SVD ({} singular values did not converge)", _0)]
pub struct SvdConvergenceError(pub i32);

/// Owned, contiguous, C-order copy of a matrix, which is what LAPACKe's
/// row-major interface wants to see.
pub(crate) fn c_order_data(matrix: ArrayView2<'_, f64>) -> Vec<f64> {
    match matrix.as_slice() {
        Some(data) => data.to_vec(),
        None => matrix.iter().cloned().collect(),
    }
}

/// Solve `A x = b` using LAPACKe's dgesv.
///
/// Besides exactly singular matrices, this also rejects a factorization
/// whose smallest pivot is at rounding level.
pub fn solve(a: ArrayView2<'_, f64>, b: ArrayView1<'_, f64>) -> FailResult<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        throw!(ShapeError(a.shape().to_vec(), b.shape().to_vec()));
    }
    // lapacke hates size-zero arrays.
    if n == 0 {
        return Ok(Array1::zeros(0));
    }

    let scale = a.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let tiny = scale * std::f64::EPSILON * n as f64;

    let layout = ::lapacke::Layout::RowMajor;
    let mut lu = c_order_data(a);
    let mut x = b.to_vec();
    let mut ipiv = vec![0; n];
    match unsafe { ::lapacke::dgesv(layout, n as i32, 1, &mut lu, n as i32, &mut ipiv, &mut x, 1) } {
        0 => {},
        info if info < 0 => bail!("(BUG) bad arg number {} to dgesv", -info),
        info => throw!(DegenerateMatrixError { column: info as usize - 1, pivot: 0.0 }),
    }

    // dgesv leaves U on and above the diagonal
    for column in 0..n {
        let pivot = lu[column * n + column];
        if !(pivot.abs() > tiny) {
            throw!(DegenerateMatrixError { column, pivot });
        }
    }
    Ok(Array1::from(x))
}

/// Minimize `|X a - y|^2 + lambda |a|^2` using LAPACKe's dgelss.
///
/// The ridge term is applied by appending `sqrt(lambda) I` to `X` (and zeros
/// to `y`), so the normal equations are never formed. With `lambda = 0` this
/// is the minimum-norm least squares solution, which is also well-defined
/// for rank-deficient `X`.
pub fn ridge_least_squares(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    lambda: f64,
) -> FailResult<Array1<f64>> {
    if x.nrows() != y.len() {
        throw!(ShapeError(x.shape().to_vec(), y.shape().to_vec()));
    }
    if !(lambda >= 0.0) {
        bail!("ridge parameter must be non-negative, got {}", lambda);
    }
    let (rows, cols) = x.dim();
    if cols == 0 {
        return Ok(Array1::zeros(0));
    }

    let extra = if lambda > 0.0 { cols } else { 0 };
    let m = rows + extra;
    if m == 0 {
        return Ok(Array1::zeros(cols));
    }

    let mut a = Array2::<f64>::zeros((m, cols));
    a.slice_mut(ndarray::s![..rows, ..]).assign(&x);
    for k in 0..extra {
        a[(rows + k, k)] = lambda.sqrt();
    }
    // dgelss writes the solution into the first `cols` rows of b
    let mut b = vec![0.0; usize::max(m, cols)];
    b[..rows].iter_mut().zip(y).for_each(|(dest, &src)| *dest = src);

    let layout = ::lapacke::Layout::RowMajor;
    let mut a = c_order_data(a.view());
    let mut s = vec![0.0; usize::min(m, cols)];
    let mut rank = 0;
    let rcond = -1f64; // use machine precision
    match unsafe {
        ::lapacke::dgelss(layout, m as i32, cols as i32, 1, &mut a, cols as i32, &mut b, 1, &mut s, rcond, &mut rank)
    } {
        0 => {},
        info if info < 0 => bail!("(BUG) bad arg number {} to dgelss", -info),
        info => throw!(SvdConvergenceError(info)),
    }
    if (rank as usize) < cols {
        debug!("least squares problem is rank deficient (rank {} of {})", rank, cols);
    }
    b.truncate(cols);
    Ok(Array1::from(b))
}

/// Fit a polynomial.
///
/// Order is the maximum fitted power of x, so the output has `order + 1`
/// coefficients, lowest power first.
pub fn polyfit(order: u32, xs: &[f64], ys: &[f64]) -> FailResult<Array1<f64>> {
    #![allow(bad_style)]

    // Unlike solving `XᵀX a = Xᵀy`, the SVD does not square the
    // condition number of the Vandermonde matrix.
    let X = Array2::from_shape_fn((xs.len(), order as usize + 1), |(i, k)| xs[i].powi(k as i32));
    ridge_least_squares(X.view(), ArrayView1::from(ys), 0.0)
}

/// Evaluate coefficients from `polyfit` by Horner's rule.
pub fn polyval(coeffs: ArrayView1<'_, f64>, x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Derivative of `polyval` with respect to `x`.
pub fn polyval_deriv(coeffs: ArrayView1<'_, f64>, x: f64) -> f64 {
    coeffs.iter().enumerate().skip(1).rev()
        .fold(0.0, |acc, (k, &c)| acc * x + k as f64 * c)
}

/// Largest absolute entry of `VᵀV - I`.
pub fn orthonormality_defect(vectors: ArrayView2<'_, f64>) -> f64 {
    let gram = vectors.t().dot(&vectors);
    let mut worst = 0.0f64;
    for ((i, j), &g) in gram.indexed_iter() {
        let expected = if i == j { 1.0 } else { 0.0 };
        worst = worst.max((g - expected).abs());
    }
    worst
}
