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

//! Sweeps over sample counts and dataset sizes.

use crate::FailResult;
use crate::summary::ExperimentSummary;
use crate::traits::{Save, Json};
use crate::trial::SUMMARY_FILE;

use asgrid_subspace::integration::IntegrationParams;
use asgrid_subspace::{objective, CellResult, Objective, PipelineConfig, run_cell};
use asgrid_tasks_config::Settings;

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// `steps` integers spaced evenly on a log scale from `min` to `max`, truncated
/// and deduplicated.
pub fn log_range(min: usize, max: usize, steps: usize) -> Vec<usize> {
    if steps == 0 || min == 0 {
        return vec![];
    }
    if steps == 1 {
        return vec![min];
    }
    let (lo, hi) = ((min as f64).log10(), (max as f64).log10());
    let mut out: Vec<usize> = (0..steps)
        .map(|k| match k {
            0 => min,
            k if k == steps - 1 => max,
            // nudge so that exact powers are not truncated to the integer below
            k => (10f64.powf(lo + (hi - lo) * k as f64 / (steps - 1) as f64) + 1e-9) as usize,
        })
        .collect();
    out.dedup();
    out
}

pub fn sample_range(settings: &Settings) -> Vec<usize> {
    log_range(settings.min_points, settings.max_points, settings.num_steps)
}

/// `[0]` when nothing in the sweep reads a dataset.
pub fn data_range(settings: &Settings) -> Vec<usize> {
    match settings.uses_data() {
        true => log_range(settings.min_data_points, settings.max_data_points, settings.num_data_steps),
        false => vec![0],
    }
}

pub fn data_dir(settings: &Settings) -> PathBuf {
    match &settings.data_dir {
        Some(dir) => dir.clone(),
        None => Path::new("results").join(&settings.model),
    }
}

pub fn pipeline_config(settings: &Settings) -> PipelineConfig {
    PipelineConfig {
        method: settings.method,
        grid_type: settings.grid_type,
        degree: settings.degree,
        response_type: settings.response_type,
        asm_type: settings.asm_type,
        integral_type: settings.integral_type,
        num_refine: settings.num_refine,
        initial_level: settings.initial_level,
        integration: IntegrationParams {
            num_histogram_points: settings.num_histogram_points,
            app_spline_level: settings.app_spline_level,
            app_spline_degree: settings.app_spline_degree,
            ..IntegrationParams::default()
        },
        num_error_points: settings.num_error_points,
        num_shadow_1d_points: settings.num_shadow_1d_points,
        nboot: settings.nboot,
        seed: settings.seed,
        data_dir: Some(data_dir(settings)),
        do_response: settings.do_response,
        do_integral: settings.do_integral,
    }
}

/// What happened in one cell.
#[derive(Debug)]
pub struct CellOutcome {
    pub index: (usize, usize),
    pub result: Option<CellResult>,
    pub seconds: f64,
}

/// Run every cell of the sweep on a pool of `num-threads` threads, then write
/// `summary.json` into `out_dir`.
///
/// A failing cell does not stop the sweep; its causes are logged and its
/// entries in the summary stay `NaN`.
pub fn run_sweep(settings: &Settings, out_dir: &Path) -> FailResult<ExperimentSummary> {
    let objective = objective::by_name(&settings.model)?;
    let config = pipeline_config(settings);
    config.validate()?;

    let samples = sample_range(settings);
    let data = data_range(settings);
    info!("model {} ({}-dimensional), method {}", settings.model, objective.dim(), settings.method);
    info!("sample range: {:?}", samples);
    if settings.uses_data() {
        info!("data range: {:?}", data);
    }

    let cells: Vec<(usize, usize)> = iproduct!(0..samples.len(), 0..data.len()).collect();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.num_threads)
        .build()?;

    let outcomes: Vec<CellOutcome> = pool.install(|| {
        cells.par_iter()
            .map(|&(i, j)| {
                let save_dir = match settings.save_approximations {
                    true => Some(out_dir.join("cells").join(format!("{}_{}", i, j))),
                    false => None,
                };
                run_one(&*objective, &config, (i, j), samples[i], data[j], save_dir.as_deref())
            })
            .collect()
    });

    let mut summary = ExperimentSummary::new(settings, objective.dim(), samples, data);
    let mut failures = 0;
    for outcome in &outcomes {
        let (i, j) = outcome.index;
        summary.record_duration(i, j, outcome.seconds);
        match &outcome.result {
            Some(result) => summary.record(i, j, result),
            None => failures += 1,
        }
    }
    if failures > 0 {
        warn!("{} of {} cells failed", failures, outcomes.len());
    }

    Json(&summary).save(out_dir.join(SUMMARY_FILE))?;
    info!("wrote {}", out_dir.join(SUMMARY_FILE).display());
    Ok(summary)
}

fn run_one(
    objective: &dyn Objective,
    config: &PipelineConfig,
    index: (usize, usize),
    num_samples: usize,
    num_data: usize,
    save_dir: Option<&Path>,
) -> CellOutcome {
    let (i, j) = index;
    trace!("cell ({}, {}): {} samples, {} data points", i, j, num_samples, num_data);

    let start = Instant::now();
    let result = run_cell(objective, config, num_samples, num_data, save_dir);
    let seconds = start.elapsed().as_secs_f64();

    let result = match result {
        Ok(result) => {
            debug!(
                "cell ({}, {}): {} grid points, integral {:e}, integral error {:e}, l2 error {:e} ({:.3}s)",
                i, j, result.num_grid_points, result.integral, result.integral_error, result.l2_error, seconds,
            );
            Some(result)
        },
        Err(e) => {
            error!("cell ({}, {}) with {} samples failed: {}", i, j, num_samples, e);
            for cause in e.iter_causes() {
                error!("  caused by: {}", cause);
            }
            None
        },
    };
    CellOutcome { index, result, seconds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asgrid_subspace::{Method, Strategy};

    #[test]
    fn log_ranges() {
        assert_eq!(log_range(10, 100, 5), vec![10, 17, 31, 56, 100]);
        assert_eq!(log_range(10, 1000, 3), vec![10, 100, 1000]);
        assert_eq!(log_range(1, 3, 6), vec![1, 2, 3]);
        assert_eq!(log_range(40, 40, 3), vec![40]);
        assert_eq!(log_range(7, 100, 1), vec![7]);
    }

    #[test]
    fn data_range_is_trivial_without_data() {
        let settings = Settings::default();
        assert_eq!(data_range(&settings), vec![0]);

        let settings = Settings {
            method: Method::Sgpp,
            response_type: Strategy::DataR,
            min_data_points: 100,
            max_data_points: 10000,
            num_data_steps: 3,
            ..Default::default()
        };
        assert_eq!(data_range(&settings), vec![100, 1000, 10000]);
        assert_eq!(pipeline_config(&settings).data_dir, Some(PathBuf::from("results/sin5Dexp0.1")));
    }

    #[test]
    fn failing_cells_leave_nan() {
        let _ = env_logger::try_init();
        let tmp = asgrid_fs_util::TempDir::new("asgrid-driver").unwrap();
        let data_root = tmp.path().join("data-root");

        // a two-dimensional dataset cannot feed a three-dimensional model
        let cache = asgrid_subspace::sampling::DatasetCache::new(&data_root, 0);
        asgrid_fs_util::create_dir_all(data_root.join("data")).unwrap();
        asgrid_fs_util::write_atomic(cache.points_path(20), b"[[0.5, 0.5]]").unwrap();
        asgrid_fs_util::write_atomic(cache.values_path(20), b"[1.0]").unwrap();

        let settings = Settings {
            model: "exp3D".into(),
            method: Method::Ols,
            response_type: Strategy::Data,
            degree: 2,
            min_points: 10,
            max_points: 10,
            num_steps: 1,
            min_data_points: 20,
            max_data_points: 200,
            num_data_steps: 2,
            nboot: 0,
            num_threads: 2,
            data_dir: Some(data_root),
            ..Default::default()
        };
        let out = tmp.path().join("trial");
        asgrid_fs_util::create_dir_all(&out).unwrap();
        let summary = run_sweep(&settings, &out).unwrap();

        assert_eq!(summary.data_range, vec![20, 200]);
        assert!(summary.integrals[0][0].is_nan());
        assert!(summary.eigenvalues[0][0].iter().all(|x| x.is_nan()));
        assert!(summary.integrals[0][1].is_finite());
        assert!(summary.durations[0][0].is_finite());
        assert!(out.join(SUMMARY_FILE).exists());
    }
}
