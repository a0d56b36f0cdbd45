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

//! Surplus-driven adaptivity.

use crate::grid::{Grid, GridPoint};
use crate::interpolant::SparseGridInterpolant;
use crate::FailResult;
use ndarray::{ArrayView1, ArrayView2};
use std::cmp::Ordering;

/// Refine the points with the largest `|α|` until a point budget is reached.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SurplusRefinement {
    /// Points refined per step.
    pub num_refine: usize,
    /// Hard cap on the grid size.
    pub budget: usize,
}

impl SurplusRefinement {
    /// Perform one refinement step and return the points that were added,
    /// in insertion order.
    ///
    /// A refined point contributes all of its missing children together with
    /// their missing ancestors, or nothing at all if that would exceed the
    /// budget.
    pub fn step(&self, grid: &mut Grid, coefficients: ArrayView1<'_, f64>) -> Vec<GridPoint> {
        let mut candidates: Vec<(f64, usize)> = (0..grid.len())
            .filter(|&i| !grid.missing_children(grid.point(i)).is_empty())
            .map(|i| (coefficients[i].abs(), i))
            .collect();
        // largest surplus first; ties go to the older point
        candidates.sort_by(|a, b| {
            b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then(a.1.cmp(&b.1))
        });

        let mut added = vec![];
        let mut refined = 0;
        for (_, i) in candidates {
            if refined == self.num_refine {
                break;
            }
            let mut batch: Vec<GridPoint> = vec![];
            for child in grid.missing_children(grid.point(i)) {
                for point in grid.missing_ancestors(&child).into_iter().chain(Some(child)) {
                    if !batch.contains(&point) {
                        batch.push(point);
                    }
                }
            }
            if batch.is_empty() || grid.len() + batch.len() > self.budget {
                continue;
            }
            for point in batch {
                grid.insert(point.clone());
                added.push(point);
            }
            refined += 1;
        }
        added
    }
}

/// Adaptive interpolation of `f`, starting from `grid`.
///
/// Returns the interpolant and the function values at its grid points.
pub fn adaptive_interpolation(
    mut grid: Grid,
    refinement: SurplusRefinement,
    mut f: impl FnMut(&[f64]) -> FailResult<f64>,
) -> FailResult<(SparseGridInterpolant, Vec<f64>)> {
    let mut values = grid.points().iter()
        .map(|p| f(&p.coords()))
        .collect::<FailResult<Vec<_>>>()?;
    let mut interp = SparseGridInterpolant::interpolate(grid.clone(), &values)?;

    loop {
        let added = refinement.step(&mut grid, interp.coefficients().view());
        if added.is_empty() {
            break;
        }
        for point in &added {
            values.push(f(&point.coords())?);
        }
        interp = SparseGridInterpolant::interpolate(grid.clone(), &values)?;
        debug!("adaptive grid now has {} points", grid.len());
    }
    Ok((interp, values))
}

/// Adaptive ridge regression against fixed data, starting from `grid`.
pub fn adaptive_regression(
    mut grid: Grid,
    refinement: SurplusRefinement,
    points: ArrayView2<'_, f64>,
    values: ArrayView1<'_, f64>,
    lambda: f64,
) -> FailResult<SparseGridInterpolant> {
    let mut fit = SparseGridInterpolant::regress(grid.clone(), points, values, lambda)?;
    loop {
        let added = refinement.step(&mut grid, fit.coefficients().view());
        if added.is_empty() {
            break;
        }
        fit = SparseGridInterpolant::regress(grid.clone(), points, values, lambda)?;
        debug!("adaptive regression grid now has {} points", grid.len());
    }
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridType;
    use ndarray::{Array1, Array2};

    fn peak(x: &[f64]) -> f64 {
        (-20.0 * ((x[0] - 0.3).powi(2) + (x[1] - 0.7).powi(2))).exp()
    }

    #[test]
    fn stays_within_budget_and_interpolates() {
        let _ = env_logger::try_init();
        for &budget in &[20, 57, 100] {
            let grid = Grid::regular(GridType::ModLinear, 1, 2, 2).unwrap();
            let refinement = SurplusRefinement { num_refine: 3, budget };
            let (interp, values) = adaptive_interpolation(grid, refinement, |x| Ok(peak(x))).unwrap();
            assert!(interp.len() <= budget);
            assert!(interp.len() > 5);
            for (point, &value) in interp.grid().points().iter().zip(&values) {
                assert_close!(abs=1e-10, interp.eval(&point.coords()), value);
                assert!(interp.grid().missing_ancestors(point).is_empty());
            }
        }
    }

    #[test]
    fn refinement_never_removes_points() {
        let mut grid = Grid::regular(GridType::Linear, 1, 2, 2).unwrap();
        let before = grid.points().to_vec();
        let coefficients = Array1::from(vec![1.0, 0.5, 0.25, 0.125, 2.0]);
        let refinement = SurplusRefinement { num_refine: 1, budget: 100 };
        let added = refinement.step(&mut grid, coefficients.view());
        assert!(!added.is_empty());
        assert_eq!(&grid.points()[..before.len()], &before[..]);
        // the point with surplus 2.0 was the one refined
        let refined = &before[4];
        assert!(grid.missing_children(refined).is_empty());
    }

    #[test]
    fn error_shrinks_with_budget() {
        let error_for = |budget| {
            let grid = Grid::regular(GridType::ModLinear, 1, 2, 1).unwrap();
            let refinement = SurplusRefinement { num_refine: 4, budget };
            let (interp, _) = adaptive_interpolation(grid, refinement, |x| Ok(peak(x))).unwrap();
            let mut max_err = 0.0f64;
            for i in 0..=20 {
                for j in 0..=20 {
                    let x = [i as f64 / 20.0, j as f64 / 20.0];
                    max_err = max_err.max((interp.eval(&x) - peak(&x)).abs());
                }
            }
            max_err
        };
        assert!(error_for(200) < error_for(15));
    }

    #[test]
    fn adaptive_regression_fits_data() {
        let n = 30;
        let points = Array2::from_shape_fn((n * n, 2), |(i, k)| match k {
            0 => (i % n) as f64 / (n - 1) as f64,
            _ => (i / n) as f64 / (n - 1) as f64,
        });
        let values = Array1::from_shape_fn(n * n, |i| 2.0 - points[(i, 0)] + 0.5 * points[(i, 1)]);
        let grid = Grid::regular(GridType::ModLinear, 1, 2, 2).unwrap();
        let refinement = SurplusRefinement { num_refine: 2, budget: 30 };
        let fit = adaptive_regression(grid, refinement, points.view(), values.view(), 1e-10).unwrap();
        assert!(fit.len() <= 30);
        assert_close!(abs=1e-6, fit.eval(&[0.5, 0.5]), 1.75);
    }
}
