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

//! Active-subspace recognition: the C-matrix and its eigendecomposition.

use crate::sampling::halton;
use crate::{EigendecompositionError, FailResult, InsufficientDataError, DimensionMismatchError};
use asgrid_sparse_grid::SparseGridInterpolant;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;

/// Number of quasi-random points used to average gradients of a grid surrogate.
pub const NUM_C_POINTS: usize = 10000;
/// Tolerance on `|VᵀV - I|` for the eigenvectors.
pub const ORTHONORMALITY_TOL: f64 = 1e-8;
/// Negative eigenvalues above `-NEGATIVE_CLAMP * |C|` are rounding noise.
const NEGATIVE_CLAMP: f64 = 1e-12;

/// `E[∇f ∇fᵀ]`, or a stand-in for it. Symmetric positive semidefinite.
#[derive(Debug, Clone, PartialEq)]
pub struct CMatrix(pub Array2<f64>);

/// Eigenvalues in descending order, with eigenvectors in the matching columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenDecomposition {
    pub values: Array1<f64>,
    pub vectors: Array2<f64>,
}

impl EigenDecomposition {
    /// The first `n` eigenvectors, as a `d × n` matrix.
    pub fn w1(&self, n: usize) -> Array2<f64> {
        self.vectors.slice(s![.., ..n]).to_owned()
    }

    pub fn dominant(&self) -> Array1<f64> {
        self.vectors.column(0).to_owned()
    }
}

impl CMatrix {
    pub fn dim(&self) -> usize { self.0.nrows() }

    /// Mean of `g gᵀ` over the rows `g` of `gradients`.
    pub fn from_gradients(gradients: ArrayView2<'_, f64>) -> FailResult<CMatrix> {
        if gradients.nrows() == 0 {
            throw!(InsufficientDataError("no gradient samples".into()));
        }
        let c = gradients.t().dot(&gradients) / gradients.nrows() as f64;
        Ok(CMatrix(c))
    }

    /// Gradients of a sparse-grid surrogate, averaged over `num_points`
    /// Halton points in the unit cube.
    pub fn from_interpolant(interpolant: &SparseGridInterpolant, num_points: usize) -> FailResult<CMatrix> {
        let dim = interpolant.dim();
        let points = halton(num_points, dim, 1);
        let mut gradients = Array2::zeros((num_points, dim));
        for (point, mut row) in points.outer_iter().zip(gradients.outer_iter_mut()) {
            let grad = interpolant.eval_gradient(&point.to_vec());
            row.assign(&ArrayView1::from(&grad[..]));
        }
        CMatrix::from_gradients(gradients.view())
    }

    /// Linear fit `f ≈ a + bᵀx`; returns `b bᵀ`.
    pub fn ols(points: ArrayView2<'_, f64>, values: ArrayView1<'_, f64>) -> FailResult<CMatrix> {
        let b = linear_gradient(points, values)?;
        Ok(CMatrix(outer(&b, &b)))
    }

    /// Quadratic fit `f ≈ c + bᵀx + ½ xᵀAx`; returns `b bᵀ + A²/3`.
    ///
    /// `A²/3` is `E[A x xᵀ A]` for `x` uniform on `[-1,1]^d`.
    pub fn qphd(points: ArrayView2<'_, f64>, values: ArrayView1<'_, f64>) -> FailResult<CMatrix> {
        let (b, a) = quadratic_fit(points, values)?;
        let c = outer(&b, &b) + a.dot(&a) / 3.0;
        Ok(CMatrix(c))
    }

    /// Eigendecomposition with eigenvalues sorted in descending order.
    pub fn decompose(&self) -> FailResult<EigenDecomposition> {
        // products like AᵀA are only symmetric up to rounding
        let symmetric = (&self.0 + &self.0.t()) / 2.0;
        let norm = symmetric.iter().map(|x| x * x).sum::<f64>().sqrt();
        let (ascending, vectors) = asgrid_linalg::eigh(symmetric.view())
            .map_err(|e| EigendecompositionError(e.to_string()))?;

        let dim = self.dim();
        let mut values = Array1::zeros(dim);
        let mut sorted = Array2::zeros((dim, dim));
        for (dest, src) in (0..dim).zip((0..dim).rev()) {
            let mut value = ascending[src];
            if value < 0.0 {
                if value < -NEGATIVE_CLAMP * norm {
                    warn!("C-matrix has a negative eigenvalue {:e}", value);
                } else {
                    value = 0.0;
                }
            }
            values[dest] = value;
            sorted.column_mut(dest).assign(&vectors.column(src));
        }

        let defect = asgrid_linalg::orthonormality_defect(sorted.view());
        if !(defect <= ORTHONORMALITY_TOL) {
            throw!(EigendecompositionError(format!(
                "eigenvectors are not orthonormal (max |VᵀV - I| = {:e})", defect,
            )));
        }
        Ok(EigenDecomposition { values, vectors: sorted })
    }
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}

fn check_fit_input(points: ArrayView2<'_, f64>, values: ArrayView1<'_, f64>, num_terms: usize) -> FailResult<()> {
    if points.nrows() != values.len() {
        throw!(DimensionMismatchError { expected: points.nrows(), actual: values.len() });
    }
    if points.nrows() < num_terms {
        throw!(InsufficientDataError(format!(
            "a fit with {} terms needs at least as many samples, got {}", num_terms, points.nrows(),
        )));
    }
    Ok(())
}

/// Slope vector of a least-squares linear fit.
pub fn linear_gradient(points: ArrayView2<'_, f64>, values: ArrayView1<'_, f64>) -> FailResult<Array1<f64>> {
    let dim = points.ncols();
    check_fit_input(points, values, dim + 1)?;
    let design = Array2::from_shape_fn((points.nrows(), dim + 1), |(i, k)| match k {
        0 => 1.0,
        k => points[(i, k - 1)],
    });
    let coeffs = asgrid_linalg::ridge_least_squares(design.view(), values, 0.0)?;
    Ok(coeffs.slice(s![1..]).to_owned())
}

/// Least-squares quadratic fit, returning the linear part `b` and the Hessian `A`.
pub fn quadratic_fit(
    points: ArrayView2<'_, f64>,
    values: ArrayView1<'_, f64>,
) -> FailResult<(Array1<f64>, Array2<f64>)> {
    let dim = points.ncols();
    let pairs: Vec<(usize, usize)> = (0..dim).flat_map(|i| (i..dim).map(move |j| (i, j))).collect();
    let num_terms = 1 + dim + pairs.len();
    check_fit_input(points, values, num_terms)?;

    let design = Array2::from_shape_fn((points.nrows(), num_terms), |(row, k)| {
        let x = points.row(row);
        match k {
            0 => 1.0,
            k if k <= dim => x[k - 1],
            k => {
                let (i, j) = pairs[k - 1 - dim];
                x[i] * x[j]
            },
        }
    });
    let coeffs = asgrid_linalg::ridge_least_squares(design.view(), values, 0.0)?;

    let b = coeffs.slice(s![1..=dim]).to_owned();
    let mut a = Array2::zeros((dim, dim));
    for (n, &(i, j)) in pairs.iter().enumerate() {
        let c = coeffs[1 + dim + n];
        if i == j {
            a[(i, i)] = 2.0 * c;
        } else {
            a[(i, j)] = c;
            a[(j, i)] = c;
        }
    }
    Ok((b, a))
}

/// Per-eigenvalue `[min, max]` over `nboot` bootstrap replicates.
///
/// Each replicate resamples the `num_rows` input rows with replacement and
/// rebuilds the C-matrix with `build`.
pub fn bootstrap_eigenvalues(
    rng: &mut impl Rng,
    nboot: usize,
    num_rows: usize,
    mut build: impl FnMut(&[usize]) -> FailResult<CMatrix>,
) -> FailResult<Vec<[f64; 2]>> {
    if num_rows == 0 {
        throw!(InsufficientDataError("nothing to resample".into()));
    }
    let mut ranges: Vec<[f64; 2]> = vec![];
    for _ in 0..nboot {
        let rows: Vec<usize> = (0..num_rows).map(|_| rng.gen_range(0..num_rows)).collect();
        let values = build(&rows)?.decompose()?.values;
        if ranges.is_empty() {
            ranges = values.iter().map(|&v| [v, v]).collect();
        }
        for (range, &v) in ranges.iter_mut().zip(&values) {
            range[0] = range[0].min(v);
            range[1] = range[1].max(v);
        }
    }
    Ok(ranges)
}

/// Rows of `array` in the given order.
pub fn select_rows(array: ArrayView2<'_, f64>, rows: &[usize]) -> Array2<f64> {
    array.select(Axis(0), rows)
}
