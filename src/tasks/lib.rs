//! Experiment sweeps: the code behind the `asgrid-sweep` binary.
//!
//! Library crates do the numerics; this crate reads config, owns the trial
//! directory, sets up logging and runs the cells of a sweep in parallel.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[macro_use] extern crate itertools;

pub type FailResult<T> = Result<T, failure::Error>;

mod ui;
mod traits;

pub mod driver;
pub mod summary;
pub mod trial;
pub mod entry_points;

pub use crate::driver::run_sweep;
pub use crate::summary::ExperimentSummary;
pub use crate::trial::{TrialDir, NewTrialDirArgs};
pub use crate::ui::cfg_merging::ConfigSources;
pub use asgrid_tasks_config::{Settings, ValidatedSettings};
