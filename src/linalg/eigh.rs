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

//! Symmetric eigendecomposition through LAPACKe's dsyev.

use crate::{c_order_data, FailResult, ShapeError};
use ndarray::{Array1, Array2, ArrayView2};

#[derive(Debug, Fail)]
#[fail(display = "dsyev failed to converge ({} off-diagonal elements did not reach zero)", _0)]
pub struct NonConvergenceError(pub i32);

#[derive(Debug, Fail)]
#[fail(display = "matrix is not symmetric (|A - A^T| = {:e})", _0)]
pub struct AsymmetricMatrixError(pub f64);

/// Eigendecomposition of a real symmetric matrix.
///
/// Eigenvalues come back in **ascending** order, with the eigenvectors as the
/// columns of the second output.
pub fn eigh(matrix: ArrayView2<'_, f64>) -> FailResult<(Array1<f64>, Array2<f64>)> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        throw!(ShapeError(matrix.shape().to_vec(), vec![n, n]));
    }

    let norm = matrix.iter().map(|x| x * x).sum::<f64>().sqrt();
    if !norm.is_finite() {
        bail!("matrix has non-finite entries");
    }
    let asymmetry = (&matrix - &matrix.t()).iter().fold(0.0f64, |acc, x| acc.max(x.abs()));
    if asymmetry > 1e-10 * norm.max(1.0) {
        throw!(AsymmetricMatrixError(asymmetry));
    }

    // lapacke hates size-zero arrays, and a zero matrix needs no work
    if n == 0 || norm == 0.0 {
        return Ok((Array1::zeros(n), Array2::eye(n)));
    }

    let layout = ::lapacke::Layout::RowMajor;
    let mut a = c_order_data(matrix);
    let mut w = vec![0.0; n];
    match unsafe { ::lapacke::dsyev(layout, b'V', b'U', n as i32, &mut a, n as i32, &mut w) } {
        0 => {},
        info if info < 0 => bail!("(BUG) bad arg number {} to dsyev", -info),
        info => throw!(NonConvergenceError(info)),
    }
    trace!("dsyev finished (n = {})", n);

    let vectors = Array2::from_shape_vec((n, n), a)?;
    Ok((Array1::from(w), vectors))
}
