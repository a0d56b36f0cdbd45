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

//! Hierarchical sparse grids on the unit cube.
//!
//! Grids hold points in level/index form. An interpolant pairs a grid with
//! one coefficient per point, and can be written out as a plain-text
//! descriptor plus a coefficient list.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[cfg(test)] #[macro_use] extern crate asgrid_assert_close;

macro_rules! throw {
    ($e:expr) => { return Err(failure::Error::from($e)) };
}

pub type FailResult<T> = Result<T, failure::Error>;

mod basis;
mod grid;
mod interpolant;
mod refinement;

pub use crate::basis::{Basis1d, GridType, MAX_DEGREE, cardinal_bspline, cardinal_bspline_deriv};
pub use crate::grid::{Grid, GridPoint, DESCRIPTOR_MAGIC};
pub use crate::grid::{regular_level_for_budget, regular_point_count};
pub use crate::interpolant::SparseGridInterpolant;
pub use crate::refinement::{SurplusRefinement, adaptive_interpolation, adaptive_regression};

/// An unsupported strategy or grid name, or malformed persisted input.
#[derive(Debug, Fail)]
#[fail(display = "{}", _0)]
pub struct ConfigurationError(pub String);

#[derive(Debug, Fail)]
#[fail(display = "dimension mismatch: expected {}, got {}", expected, actual)]
pub struct DimensionMismatchError {
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Fail)]
#[fail(display = "insufficient data: {}", _0)]
pub struct InsufficientDataError(pub String);
