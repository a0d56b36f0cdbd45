/* ****************************************************************** **
**  This file is part of asgrid.                                      **
**                                                                    **
**  asgrid is free software: you can redistribute it and/or modify it **
**  under the terms of the GNU General Public License as published by **
**  the Free Software Foundation, either version 3 of the License, or **
**  (at your option) any later version.                               **
**                                                                    **
**      http://www.gnu.org/licenses/                                  **
**                                                                    **
** Do note that, while the whole of asgrid is licensed under the GPL, **
** many parts of it are licensed under more permissive terms.         **
** ****************************************************************** */

//! The JSON summary of a sweep.

use asgrid_subspace::CellResult;
use asgrid_tasks_config::Settings;

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

type Grid2<T> = Vec<Vec<T>>;

/// Every per-cell quantity, indexed `[sample step][data step]`.
///
/// Cells that failed, or quantities a method does not produce, are `NaN`,
/// which serializes as `null`.
///
/// Quantities with their own axes (eigenvalues, eigenvectors, shadow
/// evaluations, bounds) are written with those axes first, so that
/// `eigenvalues` reads as `[k][i][j]` and `eigenvectors` as `[row][col][i][j]`.
#[derive(Serialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSummary {
    #[serde(serialize_with = "cell_axis_first")]
    pub eigenvalues: Grid2<Vec<f64>>,
    #[serde(serialize_with = "matrix_axes_first")]
    pub eigenvectors: Grid2<Vec<Vec<f64>>>,
    pub eigenvalue_bootstrap_ranges: Grid2<Vec<[f64; 2]>>,
    pub durations: Grid2<f64>,
    pub l2_errors: Grid2<f64>,
    pub integrals: Grid2<f64>,
    pub integral_errors: Grid2<f64>,
    pub num_grid_points_array: Grid2<f64>,
    #[serde(rename = "shadow1DEvaluationsArray", serialize_with = "cell_axis_first")]
    pub shadow_1d_evaluations_array: Grid2<Vec<f64>>,
    #[serde(serialize_with = "pair_axis_first")]
    pub bounds_array: Grid2<[f64; 2]>,
    /// Keyed by `"i j"`.
    pub response_grid_strs_dict: BTreeMap<String, String>,
    /// Keyed by `"i j"`.
    pub response_coefficients_dict: BTreeMap<String, Vec<f64>>,
    pub sample_range: Vec<usize>,
    pub data_range: Vec<usize>,
    #[serde(flatten)]
    pub settings: Settings,
}

const NAN: f64 = std::f64::NAN;

/// `[i][j][k] -> [k][i][j]`, padding short cells with `NaN`.
fn move_cell_axis_first(grid: &Grid2<Vec<f64>>) -> Vec<Grid2<f64>> {
    let len = grid.iter().flatten().map(|cell| cell.len()).max().unwrap_or(0);
    (0..len).map(|k| {
        grid.iter().map(|row| {
            row.iter().map(|cell| cell.get(k).copied().unwrap_or(NAN)).collect()
        }).collect()
    }).collect()
}

fn cell_axis_first<S: Serializer>(grid: &Grid2<Vec<f64>>, serializer: S) -> Result<S::Ok, S::Error> {
    move_cell_axis_first(grid).serialize(serializer)
}

fn matrix_axes_first<S: Serializer>(grid: &Grid2<Vec<Vec<f64>>>, serializer: S) -> Result<S::Ok, S::Error> {
    let num_rows = grid.iter().flatten().map(|cell| cell.len()).max().unwrap_or(0);
    let by_row = (0..num_rows).map(|r| {
        let rows: Grid2<Vec<f64>> = grid.iter().map(|row| {
            row.iter().map(|cell| cell.get(r).cloned().unwrap_or_default()).collect()
        }).collect();
        move_cell_axis_first(&rows)
    }).collect::<Vec<_>>();
    by_row.serialize(serializer)
}

fn pair_axis_first<S: Serializer>(grid: &Grid2<[f64; 2]>, serializer: S) -> Result<S::Ok, S::Error> {
    let grid: Grid2<Vec<f64>> = grid.iter().map(|row| row.iter().map(|pair| pair.to_vec()).collect()).collect();
    move_cell_axis_first(&grid).serialize(serializer)
}

impl ExperimentSummary {
    /// A summary where every cell failed.
    pub fn new(settings: &Settings, dim: usize, sample_range: Vec<usize>, data_range: Vec<usize>) -> Self {
        let grid = |x| vec![vec![x; data_range.len()]; sample_range.len()];
        let grid_of = |x: Vec<f64>| vec![vec![x; data_range.len()]; sample_range.len()];

        ExperimentSummary {
            eigenvalues: grid_of(vec![NAN; dim]),
            eigenvectors: vec![vec![vec![vec![NAN; dim]; dim]; data_range.len()]; sample_range.len()],
            eigenvalue_bootstrap_ranges: vec![vec![vec![[NAN; 2]; dim]; data_range.len()]; sample_range.len()],
            durations: grid(NAN),
            l2_errors: grid(NAN),
            integrals: grid(NAN),
            integral_errors: grid(NAN),
            num_grid_points_array: grid(NAN),
            shadow_1d_evaluations_array: grid_of(vec![NAN; settings.num_shadow_1d_points]),
            bounds_array: vec![vec![[NAN; 2]; data_range.len()]; sample_range.len()],
            response_grid_strs_dict: BTreeMap::new(),
            response_coefficients_dict: BTreeMap::new(),
            sample_range: sample_range.clone(),
            data_range: data_range.clone(),
            settings: settings.clone(),
        }
    }

    pub fn record_duration(&mut self, i: usize, j: usize, seconds: f64) {
        self.durations[i][j] = seconds;
    }

    /// Fill in cell `(i, j)`.
    pub fn record(&mut self, i: usize, j: usize, result: &CellResult) {
        if let Some(values) = &result.eigenvalues {
            self.eigenvalues[i][j] = values.to_vec();
        }
        if let Some(vectors) = &result.eigenvectors {
            self.eigenvectors[i][j] = vectors.outer_iter().map(|row| row.to_vec()).collect();
        }
        if let Some(ranges) = &result.eigenvalue_bootstrap {
            self.eigenvalue_bootstrap_ranges[i][j] = ranges.clone();
        }
        self.l2_errors[i][j] = result.l2_error;
        self.integrals[i][j] = result.integral;
        self.integral_errors[i][j] = result.integral_error;
        self.num_grid_points_array[i][j] = result.num_grid_points as f64;
        if !result.shadow_1d.is_empty() {
            self.shadow_1d_evaluations_array[i][j] = result.shadow_1d.clone();
        }
        self.bounds_array[i][j] = result.bounds;

        let key = format!("{} {}", i, j);
        if let Some(grid) = &result.response_grid {
            self.response_grid_strs_dict.insert(key.clone(), grid.clone());
        }
        if let Some(coefficients) = &result.response_coefficients {
            self.response_coefficients_dict.insert(key, coefficients.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array2};

    fn cell() -> CellResult {
        CellResult {
            eigenvalues: Some(arr1(&[2.0, 0.5])),
            eigenvectors: Some(Array2::eye(2)),
            eigenvalue_bootstrap: None,
            l2_error: 1e-3,
            integral: 1.25,
            integral_error: NAN,
            num_grid_points: 17,
            shadow_1d: vec![0.0, 1.0],
            bounds: [-1.0, 1.0],
            response_grid: Some("grid".into()),
            response_coefficients: Some(vec![3.0]),
        }
    }

    #[test]
    fn failed_cells_are_null() {
        let settings = Settings { num_shadow_1d_points: 2, ..Default::default() };
        let mut summary = ExperimentSummary::new(&settings, 2, vec![10, 20], vec![0]);
        summary.record(1, 0, &cell());
        summary.record_duration(1, 0, 0.5);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["integrals"], serde_json::json!([[null], [1.25]]));
        assert_eq!(json["integralErrors"], serde_json::json!([[null], [null]]));
        assert_eq!(json["numGridPointsArray"][1][0], serde_json::json!(17.0));
        assert_eq!(json["eigenvalues"], serde_json::json!([[[null], [2.0]], [[null], [0.5]]]));
        assert_eq!(json["eigenvectors"][0][0], serde_json::json!([[null], [1.0]]));
        assert_eq!(json["eigenvectors"][0][1], serde_json::json!([[null], [0.0]]));
        assert_eq!(json["eigenvectors"][1][1], serde_json::json!([[null], [1.0]]));
        assert_eq!(json["shadow1DEvaluationsArray"], serde_json::json!([[[null], [0.0]], [[null], [1.0]]]));
        assert_eq!(json["boundsArray"], serde_json::json!([[[null], [-1.0]], [[null], [1.0]]]));
        assert_eq!(json["responseGridStrsDict"]["1 0"], serde_json::json!("grid"));
        assert_eq!(json["responseCoefficientsDict"]["1 0"], serde_json::json!([3.0]));
        assert_eq!(json["sampleRange"], serde_json::json!([10, 20]));
        assert_eq!(json["model"], serde_json::json!("sin5Dexp0.1"));
        assert_eq!(json["method"], serde_json::json!("asSGpp"));
        assert_eq!(json["durations"][1][0], serde_json::json!(0.5));
    }
}
