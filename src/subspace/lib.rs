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

//! Active-subspace dimension reduction on top of sparse grids.
//!
//! The pipeline for a single experiment cell is:
//!
//! * approximate the objective on the unit cube ([`approximation`]),
//! * form the C-matrix and find its dominant directions ([`recognition`]),
//! * fit a one-dimensional surrogate along the dominant direction ([`reduced`]),
//! * integrate that surrogate against the density of the projection ([`integration`]).
//!
//! [`methods`] strings these together, next to the classical
//! gradient/regression method and a quasi-Monte-Carlo baseline.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[cfg(test)] #[macro_use] extern crate asgrid_assert_close;

macro_rules! throw {
    ($e:expr) => { return Err(failure::Error::from($e)) };
}

pub type FailResult<T> = Result<T, failure::Error>;

pub mod errors;
pub mod objective;
pub mod numerical;
pub mod sampling;
pub mod approximation;
pub mod recognition;
pub mod bounds;
pub mod reduced;
pub mod integration;
pub mod methods;
mod strategy;

pub use crate::errors::{ConfigurationError, DimensionMismatchError, InsufficientDataError};
pub use crate::errors::{EigendecompositionError, IntegrationFailureError};
pub use crate::objective::{Domain, Objective, FnObjective, UnitCubeView, NormalizedView};
pub use crate::sampling::SampleSet;
pub use crate::approximation::{Approximation, ApproximationStrategy};
pub use crate::recognition::{CMatrix, EigenDecomposition};
pub use crate::bounds::ReducedBounds;
pub use crate::reduced::{ReducedSurrogate, SparseGridReducedSurface, PolynomialSurface};
pub use crate::integration::IntegralEstimate;
pub use crate::methods::{CellResult, PipelineConfig, run_cell};
pub use crate::strategy::{Method, Strategy, IntegralType};
pub use asgrid_sparse_grid::GridType;
