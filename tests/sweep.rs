#[macro_use] extern crate asgrid_assert_close;

mod shared;

use self::shared::filetypes::Summary;
use self::shared::run_sweep_binary;

use asgrid_tasks::{ConfigSources, NewTrialDirArgs, TrialDir};

const QUICK: &[&str] = &[
    "-c", "model: exp3D",
    "-c", "min-points: 15",
    "-c", "max-points: 40",
    "-c", "num-steps: 2",
    "-c", "num-error-points: 500",
    "-c", "num-histogram-points: 10000",
    "-c", "num-shadow-1d-points: 9",
];

#[test]
fn as_sgpp_sweep() {
    let tmp = asgrid_fs_util::TempDir::new("asgrid-sweep").unwrap();
    let mut args = QUICK.to_vec();
    args.extend(&["-c", "save-approximations: true", "-o", "out", "--threads", "2"]);

    let output = run_sweep_binary(tmp.path(), &args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));

    let out = tmp.path().join("out");
    let summary = Summary::load(out.join("summary.json")).unwrap();
    assert_eq!(summary.sample_range, vec![15, 40]);
    assert_eq!(summary.data_range, vec![0]);
    assert_eq!((summary.model.as_str(), summary.method.as_str()), ("exp3D", "asSGpp"));

    for error in Summary::cells(&summary.integral_errors) {
        assert!(error.unwrap() < 0.1, "{:?}", summary.integral_errors);
    }
    assert_eq!(summary.eigenvalues.len(), 3);
    for points in Summary::cells(&summary.num_grid_points_array) {
        assert!(points.unwrap() <= 40.0);
    }
    assert_eq!(summary.shadow_1d_evaluations_array.len(), 9);
    assert_eq!(summary.bounds_array.len(), 2);
    for (lo, hi) in Summary::cells(&summary.bounds_array[0]).zip(Summary::cells(&summary.bounds_array[1])) {
        assert!(lo.unwrap() < hi.unwrap());
    }
    assert!(summary.response_grid_strs_dict.contains_key("1 0"));

    for name in &["settings.yaml", "input-config-sources.yaml", "input-cli-args.json", "cells/1_0/asm-grid.txt"] {
        assert!(out.join(name).exists(), "{}", name);
    }
    assert!(!out.join("asgrid.lock").exists());
    let log = asgrid_fs_util::read_to_string(out.join("asgrid.log")).unwrap();
    assert!(log.contains("sample range"));
}

#[test]
fn halton_baseline_without_output_dir() {
    let tmp = asgrid_fs_util::TempDir::new("asgrid-sweep").unwrap();
    let mut args = QUICK.to_vec();
    args.extend(&["-c", "method: Halton", "-c", "max-points: 400"]);

    let output = run_sweep_binary(tmp.path(), &args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));

    let out = tmp.path().join("results/exp3D/Halton_modBspline_3_400_adaptive_adaptive_Spline");
    let summary = Summary::load(out.join("summary.json")).unwrap();
    let errors: Vec<f64> = Summary::cells(&summary.integral_errors).map(|e| e.unwrap()).collect();
    assert!(errors[1] < errors[0], "{:?}", errors);
    assert!(Summary::cells(&summary.l2_errors).all(|e| e.is_none()));

    // a second run refuses to clobber it
    let again = run_sweep_binary(tmp.path(), &args);
    assert!(!again.status.success());
}

#[test]
fn bad_config_fails_before_anything_runs() {
    let tmp = asgrid_fs_util::TempDir::new("asgrid-sweep").unwrap();
    let output = run_sweep_binary(tmp.path(), &["-c", "method: Simpson", "-o", "out"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn classical_sweep_through_the_library() {
    let tmp = asgrid_fs_util::TempDir::new("asgrid-sweep").unwrap();
    let config_sources = ConfigSources::resolve_from_args(&[
        ":{model: exp3D, method: QPHD, response-type: regular, degree: 2}",
        ":{min-points: 100, max-points: 300, num-steps: 2, nboot: 3, num-threads: 1}",
        ":{num-error-points: 500}",
    ]).unwrap();
    let (trial, settings) = TrialDir::create_new(NewTrialDirArgs {
        trial_dir: Some(tmp.path().join("trial")),
        config_sources,
        err_if_existing: true,
    }).unwrap();

    let summary = asgrid_tasks::run_sweep(&settings, trial.path()).unwrap();
    let exact = asgrid_subspace::objective::by_name("exp3D").unwrap().true_integral().unwrap();
    for row in &summary.integrals {
        for &integral in row {
            assert_close!(rel=0.05, integral, exact);
        }
    }
    for ranges in summary.eigenvalue_bootstrap_ranges.iter().flatten() {
        assert_eq!(ranges.len(), 3);
        assert!(ranges.iter().all(|r| r[0] <= r[1]));
    }
    assert!(summary.response_grid_strs_dict.is_empty());
}
