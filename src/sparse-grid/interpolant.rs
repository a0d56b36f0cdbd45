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

use crate::grid::Grid;
use crate::{DimensionMismatchError, FailResult, InsufficientDataError};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// A function on `[0,1]^d` in a sparse-grid basis: `f(x) = Σ α_k φ_k(x)`.
#[derive(Debug, Clone)]
pub struct SparseGridInterpolant {
    grid: Grid,
    coefficients: Array1<f64>,
}

impl SparseGridInterpolant {
    pub fn new(grid: Grid, coefficients: Array1<f64>) -> FailResult<Self> {
        if grid.len() != coefficients.len() {
            throw!(DimensionMismatchError { expected: grid.len(), actual: coefficients.len() });
        }
        Ok(SparseGridInterpolant { grid, coefficients })
    }

    /// Hierarchize: find the coefficients that reproduce `values` at the grid points.
    pub fn interpolate(grid: Grid, values: &[f64]) -> FailResult<Self> {
        if grid.len() != values.len() {
            throw!(DimensionMismatchError { expected: grid.len(), actual: values.len() });
        }
        if grid.is_empty() {
            throw!(InsufficientDataError("cannot interpolate on an empty grid".into()));
        }
        let n = grid.len();
        let mut collocation = Array2::zeros((n, n));
        for (row, point) in grid.points().iter().enumerate() {
            for (col, value) in grid.sparse_row(&point.coords()) {
                collocation[(row, col)] = value;
            }
        }
        let coefficients = asgrid_linalg::solve(collocation.view(), ArrayView1::from(values))?;
        trace!("hierarchized {} grid points", n);
        Ok(SparseGridInterpolant { grid, coefficients })
    }

    /// Ridge regression: minimize `|Φα − y|² + λ|α|²`, where `Φ` holds the
    /// basis values at the rows of `points`.
    pub fn regress(
        grid: Grid,
        points: ArrayView2<'_, f64>,
        values: ArrayView1<'_, f64>,
        lambda: f64,
    ) -> FailResult<Self> {
        if points.nrows() == 0 {
            throw!(InsufficientDataError("regression needs at least one data point".into()));
        }
        if points.ncols() != grid.dim() {
            throw!(DimensionMismatchError { expected: grid.dim(), actual: points.ncols() });
        }
        if points.nrows() != values.len() {
            throw!(DimensionMismatchError { expected: points.nrows(), actual: values.len() });
        }

        let n = grid.len();
        let mut design = Array2::<f64>::zeros((points.nrows(), n));
        let mut x = vec![0.0; grid.dim()];
        for (mut design_row, point) in design.outer_iter_mut().zip(points.outer_iter()) {
            x.iter_mut().zip(point).for_each(|(dest, &src)| *dest = src);
            for (col, value) in grid.sparse_row(&x) {
                design_row[col] = value;
            }
        }
        let coefficients = asgrid_linalg::ridge_least_squares(design.view(), values, lambda)?;
        trace!("fit {} grid coefficients to {} data points", n, points.nrows());
        Ok(SparseGridInterpolant { grid, coefficients })
    }

    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn coefficients(&self) -> &Array1<f64> { &self.coefficients }
    pub fn dim(&self) -> usize { self.grid.dim() }
    pub fn len(&self) -> usize { self.grid.len() }

    pub fn eval(&self, x: &[f64]) -> f64 {
        (0..self.grid.len())
            .map(|k| self.coefficients[k] * self.grid.basis_value(k, x))
            .sum()
    }

    pub fn eval_gradient(&self, x: &[f64]) -> Vec<f64> {
        let mut total = vec![0.0; self.dim()];
        let mut partial = vec![0.0; self.dim()];
        for k in 0..self.grid.len() {
            self.grid.basis_gradient(k, x, &mut partial);
            for (t, p) in total.iter_mut().zip(&partial) {
                *t += self.coefficients[k] * p;
            }
        }
        total
    }

    /// `∫_{[0,1]^d} f`.
    pub fn integral(&self) -> f64 {
        (0..self.grid.len())
            .map(|k| self.coefficients[k] * self.grid.basis_integral(k))
            .sum()
    }

    pub fn descriptor(&self) -> String { self.grid.descriptor() }

    pub fn from_descriptor(text: &str, coefficients: Vec<f64>) -> FailResult<Self> {
        SparseGridInterpolant::new(Grid::from_descriptor(text)?, Array1::from(coefficients))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridType;

    fn smooth(x: &[f64]) -> f64 {
        (x[0] + 0.5 * x[1]).sin() + x[1] * x[1]
    }

    #[test]
    fn interpolates_grid_values() {
        for &ty in GridType::ALL {
            let grid = Grid::regular(ty, 3, 2, 4).unwrap();
            let values: Vec<f64> = grid.coordinates().iter().map(|x| smooth(x)).collect();
            let interp = SparseGridInterpolant::interpolate(grid.clone(), &values).unwrap();
            for (x, &value) in grid.coordinates().iter().zip(&values) {
                assert_close!(abs=1e-10, interp.eval(x), value, "{}", ty);
            }
        }
    }

    #[test]
    fn linear_functions_are_exact() {
        // modified hats reproduce affine functions exactly
        let grid = Grid::regular(GridType::ModLinear, 1, 2, 3).unwrap();
        let f = |x: &[f64]| 1.0 + 2.0 * x[0] - 0.5 * x[1];
        let values: Vec<f64> = grid.coordinates().iter().map(|x| f(x)).collect();
        let interp = SparseGridInterpolant::interpolate(grid, &values).unwrap();
        for &x in &[[0.1, 0.9], [0.33, 0.47], [0.0, 1.0]] {
            assert_close!(abs=1e-12, interp.eval(&x), f(&x));
        }
        assert_close!(abs=1e-12, interp.integral(), 1.0 + 1.0 - 0.25);
        let grad = interp.eval_gradient(&[0.3, 0.6]);
        assert_close!(abs=1e-12, &grad[..], &[2.0, -0.5][..]);
    }

    #[test]
    fn integral_of_cubic_interpolant() {
        let grid = Grid::regular(GridType::ModBspline, 3, 2, 5).unwrap();
        let f = |x: &[f64]| (x[0] * 2.0).exp() * (1.0 + x[1]);
        let values: Vec<f64> = grid.coordinates().iter().map(|x| f(x)).collect();
        let interp = SparseGridInterpolant::interpolate(grid, &values).unwrap();
        let exact = (2f64.exp() - 1.0) / 2.0 * 1.5;
        assert_close!(rel=1e-3, interp.integral(), exact);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let grid = Grid::regular(GridType::ModBspline, 3, 2, 3).unwrap();
        let values: Vec<f64> = grid.coordinates().iter().map(|x| smooth(x)).collect();
        let interp = SparseGridInterpolant::interpolate(grid, &values).unwrap();
        let x = [0.37, 0.61];
        let grad = interp.eval_gradient(&x);
        let eps = 1e-6;
        for k in 0..2 {
            let mut hi = x;
            let mut lo = x;
            hi[k] += eps;
            lo[k] -= eps;
            let fd = (interp.eval(&hi) - interp.eval(&lo)) / (2.0 * eps);
            assert_close!(abs=1e-6, grad[k], fd);
        }
    }

    #[test]
    fn regression_recovers_smooth_data() {
        let grid = Grid::regular(GridType::ModLinear, 1, 2, 3).unwrap();
        let n = 400;
        let points = Array2::from_shape_fn((n, 2), |(i, k)| match k {
            0 => (i % 20) as f64 / 19.0,
            _ => (i / 20) as f64 / 19.0,
        });
        let values = Array1::from_shape_fn(n, |i| 1.0 + points[(i, 0)] - points[(i, 1)]);
        let fit = SparseGridInterpolant::regress(grid, points.view(), values.view(), 1e-10).unwrap();
        assert_close!(abs=1e-6, fit.eval(&[0.4, 0.2]), 1.2);
    }

    #[test]
    fn regression_errors() {
        let grid = Grid::regular(GridType::Linear, 1, 2, 2).unwrap();
        let empty = Array2::<f64>::zeros((0, 2));
        let err = SparseGridInterpolant::regress(grid.clone(), empty.view(), Array1::zeros(0).view(), 0.0)
            .unwrap_err();
        assert!(err.downcast_ref::<InsufficientDataError>().is_some());

        let wrong = Array2::<f64>::zeros((3, 3));
        let err = SparseGridInterpolant::regress(grid, wrong.view(), Array1::zeros(3).view(), 0.0)
            .unwrap_err();
        assert!(err.downcast_ref::<DimensionMismatchError>().is_some());
    }

    #[test]
    fn descriptor_reconstruction_evaluates_identically() {
        let grid = Grid::regular(GridType::BsplineBoundary, 3, 2, 3).unwrap();
        let values: Vec<f64> = grid.coordinates().iter().map(|x| smooth(x)).collect();
        let interp = SparseGridInterpolant::interpolate(grid, &values).unwrap();
        let rebuilt = SparseGridInterpolant::from_descriptor(
            &interp.descriptor(),
            interp.coefficients().to_vec(),
        ).unwrap();
        for &x in &[[0.12, 0.34], [0.9, 0.05]] {
            assert_eq!(rebuilt.eval(&x), interp.eval(&x));
        }
        assert!(SparseGridInterpolant::from_descriptor(&interp.descriptor(), vec![1.0]).is_err());
    }
}
