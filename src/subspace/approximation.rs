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

//! Full-domain sparse-grid approximations of an objective.
//!
//! Everything here works in unit-cube coordinates. Objectives are wrapped
//! in a [`UnitCubeView`], and dataset points are expected in `[0,1]^d`.

use crate::objective::{Objective, UnitCubeView};
use crate::sampling::SampleSet;
use crate::{DimensionMismatchError, FailResult, InsufficientDataError};
use asgrid_sparse_grid::{self as sg, Grid, GridType, SparseGridInterpolant, SurplusRefinement};
use ndarray::{Array1, Array2};
use std::path::Path;

/// Ridge parameter for fits of the full-dimensional objective.
pub const FULL_DOMAIN_LAMBDA: f64 = 1e-6;
/// Ridge parameter for fits along the reduced coordinate.
pub const REDUCED_LAMBDA: f64 = 1e-8;
/// Grid level of the `dataR` approximation used for recognition.
pub const DATA_RECOGNITION_LEVEL: u32 = 4;

pub const GRID_FILE: &str = "asm-grid.txt";
pub const COEFFICIENTS_FILE: &str = "asm-coefficients.json";

#[derive(Debug, Clone)]
pub enum ApproximationStrategy {
    /// Start from a regular grid and refine by surplus until the budget is used.
    Adaptive { initial_level: u32, num_refine: usize },
    /// The largest regular grid that fits in the budget.
    Regular,
    /// Surplus-adaptive ridge regression against `training`.
    Data { training: SampleSet, lambda: f64, initial_level: u32, num_refine: usize },
    /// Ridge regression on a regular grid of a fixed level.
    DataRegular { training: SampleSet, lambda: f64, level: u32 },
}

/// A sparse-grid surrogate together with the samples it was built from.
#[derive(Debug, Clone)]
pub struct Approximation {
    pub interpolant: SparseGridInterpolant,
    pub samples: SampleSet,
}

impl Approximation {
    pub fn build(
        objective: &dyn Objective,
        grid_type: GridType,
        degree: u32,
        budget: usize,
        strategy: ApproximationStrategy,
    ) -> FailResult<Approximation> {
        let dim = objective.dim();
        let unit = UnitCubeView::new(objective);
        match strategy {
            ApproximationStrategy::Adaptive { initial_level, num_refine } => {
                let grid = initial_grid(grid_type, degree, dim, initial_level, budget)?;
                let refinement = SurplusRefinement { num_refine, budget };
                let (interpolant, values) = sg::adaptive_interpolation(grid, refinement, |u| {
                    checked_value(&unit, u)
                })?;
                let samples = grid_samples(interpolant.grid(), values)?;
                Ok(Approximation { interpolant, samples })
            },
            ApproximationStrategy::Regular => {
                let level = regular_level(grid_type, dim, budget);
                let grid = Grid::regular(grid_type, degree, dim, level)?;
                let values = grid.points().iter()
                    .map(|p| checked_value(&unit, &p.coords()))
                    .collect::<FailResult<Vec<_>>>()?;
                let interpolant = SparseGridInterpolant::interpolate(grid, &values)?;
                let samples = grid_samples(interpolant.grid(), values)?;
                Ok(Approximation { interpolant, samples })
            },
            ApproximationStrategy::Data { training, lambda, initial_level, num_refine } => {
                check_training(&training, dim)?;
                let grid = initial_grid(grid_type, degree, dim, initial_level, budget)?;
                let refinement = SurplusRefinement { num_refine, budget };
                let interpolant = sg::adaptive_regression(
                    grid, refinement, training.points(), training.values(), lambda,
                )?;
                Ok(Approximation { interpolant, samples: training })
            },
            ApproximationStrategy::DataRegular { training, lambda, level } => {
                check_training(&training, dim)?;
                let grid = Grid::regular(grid_type, degree, dim, level)?;
                let interpolant = SparseGridInterpolant::regress(
                    grid, training.points(), training.values(), lambda,
                )?;
                Ok(Approximation { interpolant, samples: training })
            },
        }
    }

    pub fn dim(&self) -> usize { self.interpolant.dim() }
    pub fn num_points(&self) -> usize { self.interpolant.len() }
    pub fn eval(&self, u: &[f64]) -> f64 { self.interpolant.eval(u) }
    pub fn eval_gradient(&self, u: &[f64]) -> Vec<f64> { self.interpolant.eval_gradient(u) }

    /// Integral over the unit cube.
    pub fn integral(&self) -> f64 { self.interpolant.integral() }

    /// Write the grid descriptor and coefficients into `dir`.
    pub fn save(&self, dir: &Path) -> FailResult<()> {
        asgrid_fs_util::create_dir_all(dir)?;
        asgrid_fs_util::write_atomic(dir.join(GRID_FILE), self.interpolant.descriptor().as_bytes())?;
        let coefficients = serde_json::to_string(&self.interpolant.coefficients().to_vec())?;
        asgrid_fs_util::write_atomic(dir.join(COEFFICIENTS_FILE), coefficients.as_bytes())?;
        Ok(())
    }

    /// Read back an interpolant written by [`Approximation::save`].
    pub fn load_interpolant(dir: &Path) -> FailResult<SparseGridInterpolant> {
        let descriptor = asgrid_fs_util::read_to_string(dir.join(GRID_FILE))?;
        let coefficients: Vec<f64> = serde_json::from_reader(
            asgrid_fs_util::open(dir.join(COEFFICIENTS_FILE))?,
        )?;
        SparseGridInterpolant::from_descriptor(&descriptor, coefficients)
    }
}

fn checked_value(objective: &dyn Objective, u: &[f64]) -> FailResult<f64> {
    let value = objective.eval(u);
    ensure!(value.is_finite(), "objective '{}' is {} at {:?}", objective.name(), value, u);
    Ok(value)
}

fn check_training(training: &SampleSet, dim: usize) -> FailResult<()> {
    if training.is_empty() {
        throw!(InsufficientDataError("the training set is empty".into()));
    }
    if training.dim() != dim {
        throw!(DimensionMismatchError { expected: dim, actual: training.dim() });
    }
    Ok(())
}

fn grid_samples(grid: &Grid, values: Vec<f64>) -> FailResult<SampleSet> {
    let coords = grid.coordinates();
    let points = Array2::from_shape_fn((coords.len(), grid.dim()), |(i, k)| coords[i][k]);
    SampleSet::new(points, Array1::from(values))
}

/// A regular grid of `initial_level`, lowered until it fits in `budget`.
pub fn initial_grid(
    grid_type: GridType,
    degree: u32,
    dim: usize,
    initial_level: u32,
    budget: usize,
) -> FailResult<Grid> {
    let mut level = initial_level.max(1);
    while level > 1 && sg::regular_point_count(grid_type, dim, level) > budget {
        level -= 1;
    }
    if level != initial_level {
        debug!("initial level {} exceeds the budget of {} points, using {}", initial_level, budget, level);
    }
    Grid::regular(grid_type, degree, dim, level)
}

/// The largest regular level whose point count fits in `budget`.
pub fn regular_level(grid_type: GridType, dim: usize, budget: usize) -> u32 {
    match sg::regular_level_for_budget(grid_type, dim, budget) {
        Some(level) => level,
        None => {
            warn!(
                "a budget of {} points is below the smallest regular {}-dimensional '{}' grid; using level 1",
                budget, dim, grid_type,
            );
            1
        },
    }
}

/// Grid level for a regular regression with a budget of `budget` points.
///
/// In five dimensions this is a fixed table, tuned by hand for the
/// experiments it was written for. Other dimensions use the closed-form
/// point count instead, which is not what the table gives in 5-D for
/// boundary grid types.
pub fn data_regular_level(grid_type: GridType, dim: usize, budget: usize) -> u32 {
    if dim == 5 {
        let mut level = 1;
        if budget >= 11 { level = 2; }
        if budget >= 71 { level = 3; }
        if budget >= 351 { level = 4; }
        if budget >= 1471 { level = 5; }
        if budget > 5503 { level = 6; }
        if budget >= 18943 { level = 7; }
        return level;
    }
    let level = regular_level(grid_type, dim, budget);
    warn!(
        "no level table for {}-dimensional data fits; using level {} from the regular point count",
        dim, level,
    );
    level
}
