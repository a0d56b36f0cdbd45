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

//! Response surfaces over the reduced coordinate `y = wᵀx`.
//!
//! Only a single active direction is supported here. The sparse-grid
//! surface lives on the unit cube, the polynomial surface on `[-1,1]^d`,
//! and [`ReducedSurrogate::cube`] tells the integration engine which.

use crate::bounds::{self, ReducedBounds};
use crate::objective::Objective;
use crate::sampling::{linspace, SampleSet};
use crate::{approximation, FailResult, InsufficientDataError};
use asgrid_sparse_grid::{self as sg, Grid, GridType, SparseGridInterpolant, SurplusRefinement};
use ndarray::{Array1, Array2, ArrayView1};
use std::fmt;

/// A cheap model `g(y)` of the objective along one direction.
pub trait ReducedSurrogate: Send + Sync + fmt::Debug {
    /// The active direction.
    fn direction(&self) -> ArrayView1<'_, f64>;

    /// Reduced domain `[lower, upper]`.
    fn bounds(&self) -> (f64, f64);

    /// The box `[lo, hi]^d` that full-dimensional inputs live in.
    fn cube(&self) -> (f64, f64);

    fn eval_reduced(&self, y: f64) -> f64;

    /// Points in `y` where the surrogate stops being smooth, including both bounds.
    fn knots(&self) -> Vec<f64>;

    fn coefficients(&self) -> Vec<f64>;

    /// Grid descriptor, for surrogates that have a grid.
    fn descriptor(&self) -> Option<String> { None }

    /// Size of the surrogate's representation.
    fn num_points(&self) -> usize { self.coefficients().len() }

    /// Evaluate at a full-dimensional point.
    fn eval(&self, x: &[f64]) -> f64 {
        let y = self.direction().dot(&ArrayView1::from(x));
        self.eval_reduced(y)
    }

    /// Evaluate at `t ∈ [0,1]`, the reduced domain rescaled to the unit interval.
    fn eval_unit(&self, t: f64) -> f64 {
        let (lower, upper) = self.bounds();
        self.eval_reduced(lower + t * (upper - lower))
    }
}

/// `‖pred − actual‖₂ / N` over a validation set.
///
/// This divides the norm itself by `N`, not by `√N`.
pub fn l2_error(surrogate: &dyn ReducedSurrogate, validation: &SampleSet) -> FailResult<f64> {
    l2_error_of(|x| surrogate.eval(x), validation)
}

/// [`l2_error`] for any model of the full input.
pub fn l2_error_of(model: impl Fn(&[f64]) -> f64, validation: &SampleSet) -> FailResult<f64> {
    if validation.is_empty() {
        throw!(InsufficientDataError("no validation points for the l2 error".into()));
    }
    let sum_sq: f64 = validation.points().outer_iter()
        .zip(validation.values())
        .map(|(x, &actual)| (model(&x.to_vec()) - actual).powi(2))
        .sum();
    Ok(sum_sq.sqrt() / validation.len() as f64)
}

/// Surrogate values at `n` evenly spaced points of the reduced domain.
pub fn shadow_1d(surrogate: &dyn ReducedSurrogate, n: usize) -> Vec<f64> {
    linspace(0.0, 1.0, n).into_iter().map(|t| surrogate.eval_unit(t)).collect()
}

/// `x = c + w (y − wᵀc) / |w|²`: the point of the line through `c` along `w`
/// whose projection is `y`.
pub fn pseudo_inverse(direction: ArrayView1<'_, f64>, center: &[f64], y: f64) -> Vec<f64> {
    let norm_sq = direction.dot(&direction);
    let shift = (y - direction.dot(&ArrayView1::from(center))) / norm_sq;
    center.iter().zip(direction).map(|(c, w)| c + w * shift).collect()
}

fn column(direction: ArrayView1<'_, f64>) -> Array2<f64> {
    direction.to_owned().insert_axis(ndarray::Axis(1))
}

fn checked_bounds(bounds: &ReducedBounds) -> FailResult<(f64, f64)> {
    let (lower, upper) = match bounds.interval() {
        Some(interval) => interval,
        None => bail!("reduced surfaces need a single active direction"),
    };
    ensure!(
        lower.is_finite() && upper.is_finite() && upper > lower,
        "degenerate reduced domain [{}, {}]", lower, upper,
    );
    Ok((lower, upper))
}

//--------------------------------------------------------------------------------------

/// A one-dimensional boundary sparse grid over `t = (y − lower) / (upper − lower)`.
#[derive(Debug, Clone)]
pub struct SparseGridReducedSurface {
    direction: Array1<f64>,
    lower: f64,
    upper: f64,
    interpolant: SparseGridInterpolant,
}

/// The 1-D grid type for a reduced surface of the given degree.
pub fn reduced_grid_type(degree: u32) -> GridType {
    match degree {
        1 => GridType::LinearBoundary,
        _ => GridType::BsplineBoundary,
    }
}

impl SparseGridReducedSurface {
    fn empty(direction: ArrayView1<'_, f64>, degree: u32, level: u32) -> FailResult<(Self, Grid)> {
        let (lower, upper) = checked_bounds(&bounds::grid_bounds(column(direction).view())?)?;
        let grid_type = reduced_grid_type(degree);
        let degree = grid_type.effective_degree(degree)?;
        let grid = Grid::regular(grid_type, degree, 1, level)?;
        let placeholder = SparseGridInterpolant::new(Grid::new(grid_type, degree, 1)?, Array1::zeros(0))?;
        let surface = SparseGridReducedSurface { direction: direction.to_owned(), lower, upper, interpolant: placeholder };
        Ok((surface, grid))
    }

    /// Surplus-adaptive interpolation of `unit` along the pseudo-inverse line
    /// through the centre of `[0,1]^d`.
    pub fn adaptive(
        unit: &dyn Objective,
        direction: ArrayView1<'_, f64>,
        degree: u32,
        budget: usize,
        initial_level: u32,
        num_refine: usize,
    ) -> FailResult<Self> {
        let grid_type = reduced_grid_type(degree);
        let degree = grid_type.effective_degree(degree)?;
        let grid = approximation::initial_grid(grid_type, degree, 1, initial_level, budget)?;
        let (mut surface, _) = SparseGridReducedSurface::empty(direction, degree, 1)?;
        let refinement = SurplusRefinement { num_refine, budget };
        let (interpolant, _) = sg::adaptive_interpolation(grid, refinement, |t| surface.along_line(unit, t[0]))?;
        surface.interpolant = interpolant;
        Ok(surface)
    }

    /// Interpolation on the largest regular 1-D grid within `budget`.
    pub fn regular(
        unit: &dyn Objective,
        direction: ArrayView1<'_, f64>,
        degree: u32,
        budget: usize,
    ) -> FailResult<Self> {
        let level = approximation::regular_level(reduced_grid_type(degree), 1, budget);
        let (mut surface, grid) = SparseGridReducedSurface::empty(direction, degree, level)?;
        let values = grid.points().iter()
            .map(|p| surface.along_line(unit, p.coord(0)))
            .collect::<FailResult<Vec<_>>>()?;
        surface.interpolant = SparseGridInterpolant::interpolate(grid, &values)?;
        Ok(surface)
    }

    /// Adaptive ridge regression against projected samples in `[0,1]^d`.
    pub fn from_data(
        direction: ArrayView1<'_, f64>,
        degree: u32,
        samples: &SampleSet,
        budget: usize,
        initial_level: u32,
        num_refine: usize,
        lambda: f64,
    ) -> FailResult<Self> {
        let grid_type = reduced_grid_type(degree);
        let degree = grid_type.effective_degree(degree)?;
        let grid = approximation::initial_grid(grid_type, degree, 1, initial_level, budget)?;
        let (mut surface, _) = SparseGridReducedSurface::empty(direction, degree, 1)?;
        let ts = surface.projected(samples)?;
        let refinement = SurplusRefinement { num_refine, budget };
        surface.interpolant = sg::adaptive_regression(grid, refinement, ts.view(), samples.values(), lambda)?;
        Ok(surface)
    }

    /// Ridge regression on a regular 1-D grid of the given level.
    pub fn from_data_regular(
        direction: ArrayView1<'_, f64>,
        degree: u32,
        samples: &SampleSet,
        level: u32,
        lambda: f64,
    ) -> FailResult<Self> {
        let (mut surface, grid) = SparseGridReducedSurface::empty(direction, degree, level)?;
        let ts = surface.projected(samples)?;
        surface.interpolant = SparseGridInterpolant::regress(grid, ts.view(), samples.values(), lambda)?;
        Ok(surface)
    }

    /// Regular-grid regression against the mean squared misfit:
    /// minimize `|Φα − y|² / N + λ|α|²`.
    ///
    /// This is [`from_data_regular`](Self::from_data_regular) with the penalty
    /// scaled by the number of samples, so `lambda` keeps its meaning as the
    /// dataset grows.
    pub fn from_data_driven(
        direction: ArrayView1<'_, f64>,
        degree: u32,
        samples: &SampleSet,
        level: u32,
        lambda: f64,
    ) -> FailResult<Self> {
        let lambda = lambda * samples.len() as f64;
        SparseGridReducedSurface::from_data_regular(direction, degree, samples, level, lambda)
    }

    pub fn interpolant(&self) -> &SparseGridInterpolant { &self.interpolant }

    fn to_unit(&self, y: f64) -> f64 {
        ((y - self.lower) / (self.upper - self.lower)).max(0.0).min(1.0)
    }

    fn along_line(&self, unit: &dyn Objective, t: f64) -> FailResult<f64> {
        let y = self.lower + t * (self.upper - self.lower);
        let center = vec![0.5; self.direction.len()];
        let x = pseudo_inverse(self.direction.view(), &center, y);
        let value = unit.eval(&x);
        ensure!(value.is_finite(), "objective '{}' is {} at {:?}", unit.name(), value, x);
        Ok(value)
    }

    fn projected(&self, samples: &SampleSet) -> FailResult<Array2<f64>> {
        if samples.is_empty() {
            throw!(InsufficientDataError("no samples to fit a reduced surface".into()));
        }
        if samples.dim() != self.direction.len() {
            throw!(crate::DimensionMismatchError { expected: self.direction.len(), actual: samples.dim() });
        }
        let ys = samples.points().dot(&self.direction);
        Ok(ys.mapv(|y| self.to_unit(y)).insert_axis(ndarray::Axis(1)))
    }
}

impl ReducedSurrogate for SparseGridReducedSurface {
    fn direction(&self) -> ArrayView1<'_, f64> { self.direction.view() }
    fn bounds(&self) -> (f64, f64) { (self.lower, self.upper) }
    fn cube(&self) -> (f64, f64) { (0.0, 1.0) }

    fn eval_reduced(&self, y: f64) -> f64 {
        self.interpolant.eval(&[self.to_unit(y)])
    }

    fn knots(&self) -> Vec<f64> {
        let width = self.upper - self.lower;
        self.interpolant.grid().breakpoints(0).into_iter()
            .map(|t| self.lower + t * width)
            .collect()
    }

    fn coefficients(&self) -> Vec<f64> { self.interpolant.coefficients().to_vec() }
    fn descriptor(&self) -> Option<String> { Some(self.interpolant.descriptor()) }
    fn num_points(&self) -> usize { self.interpolant.len() }
}

//--------------------------------------------------------------------------------------

/// A least-squares polynomial in `y`, for inputs in `[-1,1]^d`.
#[derive(Debug, Clone)]
pub struct PolynomialSurface {
    direction: Array1<f64>,
    lower: f64,
    upper: f64,
    /// Lowest power first.
    coefficients: Array1<f64>,
}

impl PolynomialSurface {
    pub fn fit(direction: ArrayView1<'_, f64>, samples: &SampleSet, degree: u32) -> FailResult<Self> {
        if samples.len() <= degree as usize {
            throw!(InsufficientDataError(format!(
                "a degree {} polynomial needs more than {} samples", degree, samples.len(),
            )));
        }
        if samples.dim() != direction.len() {
            throw!(crate::DimensionMismatchError { expected: direction.len(), actual: samples.dim() });
        }
        let (lower, upper) = checked_bounds(&bounds::hull_bounds(column(direction).view()))?;
        let ys = samples.points().dot(&direction);
        let values = samples.values().to_vec();
        let coefficients = asgrid_linalg::polyfit(degree, &ys.to_vec(), &values)?;
        Ok(PolynomialSurface { direction: direction.to_owned(), lower, upper, coefficients })
    }

    pub fn degree(&self) -> u32 { self.coefficients.len() as u32 - 1 }
}

impl ReducedSurrogate for PolynomialSurface {
    fn direction(&self) -> ArrayView1<'_, f64> { self.direction.view() }
    fn bounds(&self) -> (f64, f64) { (self.lower, self.upper) }
    fn cube(&self) -> (f64, f64) { (-1.0, 1.0) }

    fn eval_reduced(&self, y: f64) -> f64 {
        asgrid_linalg::polyval(self.coefficients.view(), y)
    }

    fn knots(&self) -> Vec<f64> { vec![self.lower, self.upper] }
    fn coefficients(&self) -> Vec<f64> { self.coefficients.to_vec() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::{FnObjective, Domain};
    use crate::sampling::{cell_rng, uniform};
    use ndarray::{arr1, Array1};

    fn ridge(w: &[f64]) -> FnObjective {
        let w = w.to_vec();
        FnObjective::new("ridge", Domain::unit(w.len()), move |x| {
            let y: f64 = x.iter().zip(&w).map(|(a, b)| a * b).sum();
            (2.0 * y).sin()
        })
    }

    #[test]
    fn pseudo_inverse_projects_back() {
        let w = arr1(&[0.6, 0.0, 0.8]);
        let x = pseudo_inverse(w.view(), &[0.5, 0.5, 0.5], 1.1);
        assert_close!(abs=1e-14, w.dot(&Array1::from(x)), 1.1);
    }

    #[test]
    fn adaptive_surface_of_a_ridge_function() {
        let _ = env_logger::try_init();
        let w = arr1(&[0.6, 0.0, 0.8]);
        let f = ridge(&w.to_vec());
        let surface = SparseGridReducedSurface::adaptive(&f, w.view(), 3, 30, 2, 5).unwrap();
        assert!(surface.num_points() <= 30);
        let (lower, upper) = surface.bounds();
        assert_eq!(lower, 0.0);
        assert_close!(abs=1e-14, upper, 1.4);

        let points = uniform(&mut cell_rng(3, 0), 200, 3, 0.0, 1.0);
        let validation = SampleSet::evaluate(&f, points).unwrap();
        assert!(l2_error(&surface, &validation).unwrap() < 1e-4);
        for x in validation.points().outer_iter().take(10) {
            assert_close!(abs=1e-3, surface.eval(&x.to_vec()), f.eval(&x.to_vec()));
        }
    }

    #[test]
    fn regular_and_data_surfaces() {
        let w = arr1(&[1.0, 0.0]);
        let f = ridge(&w.to_vec());
        let regular = SparseGridReducedSurface::regular(&f, w.view(), 3, 17).unwrap();
        assert_eq!(regular.num_points(), 17);
        assert_close!(abs=1e-4, regular.eval_unit(0.3), (0.6f64).sin());

        let points = uniform(&mut cell_rng(3, 1), 400, 2, 0.0, 1.0);
        let samples = SampleSet::evaluate(&f, points).unwrap();
        let fitted = SparseGridReducedSurface::from_data_regular(w.view(), 3, &samples, 4, 1e-8).unwrap();
        assert_eq!(fitted.num_points(), 17);
        assert_close!(abs=1e-3, fitted.eval_reduced(0.5), 1f64.sin());

        let adaptive = SparseGridReducedSurface::from_data(w.view(), 3, &samples, 12, 2, 2, 1e-8).unwrap();
        assert!(adaptive.num_points() <= 12);
        assert!(adaptive.descriptor().is_some());
    }

    #[test]
    fn data_driven_surface_scales_the_penalty() {
        let w = arr1(&[1.0, 0.0]);
        let f = ridge(&w.to_vec());
        let points = uniform(&mut cell_rng(3, 1), 400, 2, 0.0, 1.0);
        let samples = SampleSet::evaluate(&f, points).unwrap();

        let driven = SparseGridReducedSurface::from_data_driven(w.view(), 3, &samples, 4, 1e-3).unwrap();
        let scaled = SparseGridReducedSurface::from_data_regular(w.view(), 3, &samples, 4, 400.0 * 1e-3).unwrap();
        assert_eq!(driven.num_points(), 17);
        assert_close!(abs=1e-9, driven.coefficients(), scaled.coefficients());

        // the same nominal penalty shrinks the driven fit harder
        let plain = SparseGridReducedSurface::from_data_regular(w.view(), 3, &samples, 4, 1e-3).unwrap();
        let norm = |s: &SparseGridReducedSurface| s.coefficients().iter().map(|c| c * c).sum::<f64>();
        assert!(norm(&driven) < norm(&plain));

        let sharp = SparseGridReducedSurface::from_data_driven(w.view(), 3, &samples, 4, 1e-11).unwrap();
        assert_close!(abs=1e-3, sharp.eval_reduced(0.5), 1f64.sin());
    }

    #[test]
    fn shadow_spans_the_bounds() {
        let w = arr1(&[1.0, 0.0]);
        let f = ridge(&w.to_vec());
        let surface = SparseGridReducedSurface::regular(&f, w.view(), 1, 9).unwrap();
        let shadow = shadow_1d(&surface, 5);
        assert_eq!(shadow.len(), 5);
        assert_close!(abs=1e-12, shadow[0], 0.0);
        assert_close!(abs=1e-12, shadow[4], 2f64.sin());
    }

    #[test]
    fn polynomial_surface() {
        let w = arr1(&[0.6, -0.8]);
        let points = uniform(&mut cell_rng(4, 0), 50, 2, -1.0, 1.0);
        let values: Array1<f64> = points.dot(&w).mapv(|y| 1.0 + y - 0.5 * y * y);
        let samples = SampleSet::new(points, values).unwrap();
        let surface = PolynomialSurface::fit(w.view(), &samples, 2).unwrap();
        let (lower, upper) = surface.bounds();
        assert_close!(abs=1e-14, lower, -1.4);
        assert_close!(abs=1e-14, upper, 1.4);
        assert_close!(abs=1e-10, surface.coefficients(), vec![1.0, 1.0, -0.5]);
        assert_close!(abs=1e-12, l2_error(&surface, &samples).unwrap(), 0.0);
    }

    #[test]
    fn l2_error_divides_the_norm_by_n() {
        let w = arr1(&[1.0]);
        let points = Array2::from_shape_vec((4, 1), vec![-1.0, -0.5, 0.5, 1.0]).unwrap();
        let samples = SampleSet::new(points.clone(), Array1::zeros(4)).unwrap();
        let offsets = SampleSet::new(points, Array1::from(vec![1.0; 4])).unwrap();
        let surface = PolynomialSurface::fit(w.view(), &samples, 1).unwrap();
        // ‖(1,1,1,1)‖ = 2, over N = 4
        assert_close!(abs=1e-12, l2_error(&surface, &offsets).unwrap(), 0.5);

        // the same measure for a model of the full input
        assert_close!(abs=1e-12, l2_error_of(|x| x[0] - 1.0, &samples).unwrap(), 0.5);

        let empty = SampleSet::new(Array2::zeros((0, 1)), Array1::zeros(0)).unwrap();
        let err = l2_error(&surface, &empty).unwrap_err();
        assert!(err.downcast_ref::<InsufficientDataError>().is_some());
    }
}
