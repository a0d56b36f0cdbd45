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

// NOTE: Please make sure to use the YamlRead trait when deserializing these types!
//
//       DO NOT USE serde_yaml::from_{reader,value,etc.} OUTSIDE THIS CRATE
//       or else you defeat the entire reason for YamlRead's existence.

use asgrid_subspace::{GridType, IntegralType, Method, Strategy};
use serde::{de, Deserialize, Serialize};
use std::path::PathBuf;

/// Root settings object.
///
/// This is what you should deserialize.
#[derive(Serialize)]
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSettings(pub Settings);
derive_yaml_read!{ValidatedSettings}

impl<'de> de::Deserialize<'de> for ValidatedSettings {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cereal: Settings = de::Deserialize::deserialize(deserializer)?;

        cereal.validate().map_err(de::Error::custom)
    }
}

impl std::ops::Deref for ValidatedSettings {
    type Target = Settings;
    fn deref(&self) -> &Settings { &self.0 }
}

/// Raw deserialized form of settings.
///
/// You shouldn't deserialize this type directly; deserialize `ValidatedSettings` instead,
/// so that incompatible combinations are rejected up front.
///
/// Every field has a default, so an empty mapping is a complete config.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Name of the objective, e.g. `sin5Dexp0.1`, `exp3D`, `const5D` or `borehole`.
    #[serde(default = "_settings__model")]
    pub model: String,

    #[serde(default = "_settings__method")]
    pub method: Method,

    /// Size of the rayon pool that runs the cells.
    #[serde(default = "_settings__num_threads")]
    pub num_threads: usize,

    /// The sample range is `num-steps` log-spaced integers in `[min-points, max-points]`.
    #[serde(default = "_settings__min_points")]
    pub min_points: usize,
    #[serde(default = "_settings__max_points")]
    pub max_points: usize,
    #[serde(default = "_settings__num_steps")]
    pub num_steps: usize,

    #[serde(default = "_settings__grid_type")]
    pub grid_type: GridType,

    /// Basis degree of the sparse grids, or polynomial degree of the
    /// classical response surface.
    #[serde(default = "_settings__degree")]
    pub degree: u32,

    /// How the reduced (or, for `SGpp`, the full) response surface is built.
    #[serde(default = "_settings__response_type")]
    pub response_type: Strategy,

    /// How the surrogate used for recognition is built. Only read by `asSGpp`.
    #[serde(default = "_settings__asm_type")]
    pub asm_type: Strategy,

    #[serde(default = "_settings__integral_type")]
    pub integral_type: IntegralType,

    #[serde(default = "_settings__num_shadow_1d_points")]
    pub num_shadow_1d_points: usize,

    /// Refinement steps for adaptive strategies.
    #[serde(default = "_settings__num_refine")]
    pub num_refine: usize,

    #[serde(default = "_settings__initial_level")]
    pub initial_level: u32,

    #[serde(default = "_settings__app_spline_level")]
    pub app_spline_level: u32,
    #[serde(default = "_settings__app_spline_degree")]
    pub app_spline_degree: u32,

    /// The dataset range, used only by data strategies.
    #[serde(default = "_settings__min_data_points")]
    pub min_data_points: usize,
    #[serde(default = "_settings__max_data_points")]
    pub max_data_points: usize,
    #[serde(default = "_settings__num_data_steps")]
    pub num_data_steps: usize,

    #[serde(default = "_settings__num_histogram_points")]
    pub num_histogram_points: usize,

    /// Validation points for the l2 error when no held-out data exists.
    #[serde(default = "_settings__num_error_points")]
    pub num_error_points: usize,

    /// Bootstrap replicates of the classical eigenvalues. `0` disables bootstrapping.
    #[serde(default = "_settings__nboot")]
    pub nboot: usize,

    /// Compute the l2 error, bounds and shadow plot of each response surface.
    /// The surface itself is still built, for the integral.
    #[serde(default = "_settings__do_response")]
    pub do_response: bool,

    /// Integrate each response surface.
    #[serde(default = "_settings__do_integral")]
    pub do_integral: bool,

    #[serde(default)]
    pub seed: u64,

    /// Write each cell's recognition surrogate under `cells/{i}_{j}`.
    #[serde(default)]
    pub save_approximations: bool,

    /// Dataset cache. Defaults to `results/{model}`.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}
fn _settings__model() -> String { "sin5Dexp0.1".to_string() }
fn _settings__method() -> Method { Method::AsSgpp }
fn _settings__num_threads() -> usize { 4 }
fn _settings__min_points() -> usize { 10 }
fn _settings__max_points() -> usize { 100 }
fn _settings__num_steps() -> usize { 5 }
fn _settings__grid_type() -> GridType { GridType::ModBspline }
fn _settings__degree() -> u32 { 3 }
fn _settings__response_type() -> Strategy { Strategy::Adaptive }
fn _settings__asm_type() -> Strategy { Strategy::Adaptive }
fn _settings__integral_type() -> IntegralType { IntegralType::Spline }
fn _settings__num_shadow_1d_points() -> usize { 100 }
fn _settings__num_refine() -> usize { 10 }
fn _settings__initial_level() -> u32 { 2 }
fn _settings__app_spline_level() -> u32 { 5 }
fn _settings__app_spline_degree() -> u32 { 3 }
fn _settings__min_data_points() -> usize { 10000 }
fn _settings__max_data_points() -> usize { 100000 }
fn _settings__num_data_steps() -> usize { 1 }
fn _settings__num_histogram_points() -> usize { 100000 }
fn _settings__num_error_points() -> usize { 10000 }
fn _settings__nboot() -> usize { 100 }
fn _settings__do_response() -> bool { true }
fn _settings__do_integral() -> bool { true }

impl Settings {
    /// Whether the sweep has a dataset axis.
    pub fn uses_data(&self) -> bool {
        match self.method {
            Method::Halton => false,
            Method::AsSgpp => self.response_type.uses_data() || self.asm_type.uses_data(),
            _ => self.response_type.uses_data(),
        }
    }

    /// `{method}_{gridType}_{degree}_{maxPoints}_{responseType}_{asmType}_{integralType}`
    pub fn results_folder_name(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}_{}",
            self.method, self.grid_type, self.degree, self.max_points,
            self.response_type, self.asm_type, self.integral_type,
        )
    }
}

// --------------------------------------------------------

impl Default for Settings {
    fn default() -> Self { from_empty_mapping().unwrap() }
}

fn from_empty_mapping<T: for<'de> serde::Deserialize<'de>>() -> serde_yaml::Result<T> {
    use serde_yaml::{from_value, Value, Mapping};
    from_value(Value::Mapping(Mapping::new()))
}
