use serde::Deserialize;
use std::path::Path;

/// The parts of `summary.json` that the tests look at.
///
/// `null` entries (failed cells) read back as `None`. Arrays with their own
/// axes put those axes first (`eigenvalues[k][i][j]`).
#[derive(Debug, Clone, PartialEq)]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub sample_range: Vec<usize>,
    pub data_range: Vec<usize>,
    pub eigenvalues: Vec<Vec<Vec<Option<f64>>>>,
    pub integrals: Vec<Vec<Option<f64>>>,
    pub integral_errors: Vec<Vec<Option<f64>>>,
    pub l2_errors: Vec<Vec<Option<f64>>>,
    pub durations: Vec<Vec<Option<f64>>>,
    pub num_grid_points_array: Vec<Vec<Option<f64>>>,
    #[serde(rename = "shadow1DEvaluationsArray")]
    pub shadow_1d_evaluations_array: Vec<Vec<Vec<Option<f64>>>>,
    pub bounds_array: Vec<Vec<Vec<Option<f64>>>>,
    pub response_grid_strs_dict: std::collections::BTreeMap<String, String>,
    pub model: String,
    pub method: String,
}

impl Summary {
    pub fn load(path: impl AsRef<Path>) -> Result<Summary, failure::Error> {
        let file = asgrid_fs_util::open_text(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Every `[i][j]` entry of a per-cell array.
    pub fn cells<'a, T>(array: &'a [Vec<T>]) -> impl Iterator<Item=&'a T> + 'a {
        array.iter().flat_map(|row| row.iter())
    }
}
