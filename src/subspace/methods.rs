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

//! One cell of an experiment sweep, for every method.

use crate::approximation::{self, Approximation, ApproximationStrategy};
use crate::approximation::{DATA_RECOGNITION_LEVEL, FULL_DOMAIN_LAMBDA, REDUCED_LAMBDA};
use crate::integration::{self, IntegralEstimate, IntegrationParams};
use crate::objective::{Objective, NormalizedView, UnitCubeView};
use crate::recognition::{self, CMatrix, EigenDecomposition, NUM_C_POINTS};
use crate::reduced::{self, PolynomialSurface, ReducedSurrogate, SparseGridReducedSurface};
use crate::sampling::{self, DatasetCache, SampleSet};
use crate::{ConfigurationError, FailResult, InsufficientDataError};
use crate::{GridType, IntegralType, Method, Strategy};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

/// Everything a cell needs besides its sample and data counts.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub method: Method,
    pub grid_type: GridType,
    /// Basis degree for the grid methods; polynomial degree for the classical ones.
    pub degree: u32,
    pub response_type: Strategy,
    pub asm_type: Strategy,
    pub integral_type: IntegralType,
    pub num_refine: usize,
    pub initial_level: u32,
    pub integration: IntegrationParams,
    pub num_error_points: usize,
    pub num_shadow_1d_points: usize,
    pub nboot: usize,
    pub seed: u64,
    /// Root of the dataset cache. Required by the data strategies.
    pub data_dir: Option<PathBuf>,
    /// Compute the l2 error, bounds and shadow plot of the surrogate.
    pub do_response: bool,
    /// Integrate the surrogate.
    pub do_integral: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            method: Method::AsSgpp,
            grid_type: GridType::ModBspline,
            degree: 3,
            response_type: Strategy::Adaptive,
            asm_type: Strategy::Adaptive,
            integral_type: IntegralType::Spline,
            num_refine: 10,
            initial_level: 2,
            integration: IntegrationParams::default(),
            num_error_points: 10000,
            num_shadow_1d_points: 100,
            nboot: 100,
            seed: 0,
            data_dir: None,
            do_response: true,
            do_integral: true,
        }
    }
}

impl PipelineConfig {
    /// Reject combinations that no pipeline can run.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.method {
            Method::AsSgpp | Method::Sgpp => {
                self.grid_type.effective_degree(self.degree)?;
                let only_reduced = match self.method {
                    Method::AsSgpp => self.asm_type,
                    _ => self.response_type,
                };
                if only_reduced == Strategy::DataDrivenR {
                    return Err(ConfigurationError(format!(
                        "'{}' only builds reduced response surfaces, and is not supported for the {} of method '{}'",
                        Strategy::DataDrivenR,
                        if self.method == Method::AsSgpp { "recognition" } else { "response" },
                        self.method,
                    )));
                }
            },
            Method::As | Method::Ols | Method::Qphd => match self.response_type {
                Strategy::Regular | Strategy::Data => {},
                other => return Err(ConfigurationError(format!(
                    "method '{}' supports the response types 'regular' and 'data', not '{}'",
                    self.method, other,
                ))),
            },
            Method::Halton => {},
        }
        let needs_data = match self.method {
            Method::AsSgpp => self.asm_type.uses_data() || self.response_type.uses_data(),
            Method::Halton => false,
            _ => self.response_type.uses_data(),
        };
        if needs_data && self.data_dir.is_none() {
            return Err(ConfigurationError("data strategies need a data directory".into()));
        }
        Ok(())
    }

    /// Whether the sweep needs a range of dataset sizes.
    pub fn uses_data(&self) -> bool {
        match self.method {
            Method::Halton => false,
            _ => self.response_type.uses_data() || (self.method == Method::AsSgpp && self.asm_type.uses_data()),
        }
    }
}

/// The outcome of one cell. Quantities a method does not produce are `None`
/// or `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct CellResult {
    pub eigenvalues: Option<Array1<f64>>,
    pub eigenvectors: Option<Array2<f64>>,
    pub eigenvalue_bootstrap: Option<Vec<[f64; 2]>>,
    pub l2_error: f64,
    pub integral: f64,
    pub integral_error: f64,
    pub num_grid_points: usize,
    pub shadow_1d: Vec<f64>,
    pub bounds: [f64; 2],
    pub response_grid: Option<String>,
    pub response_coefficients: Option<Vec<f64>>,
}

impl CellResult {
    fn empty() -> Self {
        CellResult {
            eigenvalues: None,
            eigenvectors: None,
            eigenvalue_bootstrap: None,
            l2_error: std::f64::NAN,
            integral: std::f64::NAN,
            integral_error: std::f64::NAN,
            num_grid_points: 0,
            shadow_1d: vec![],
            bounds: [std::f64::NAN; 2],
            response_grid: None,
            response_coefficients: None,
        }
    }

    fn set_integral(&mut self, estimate: IntegralEstimate) {
        self.integral = estimate.value;
        self.integral_error = estimate.error.unwrap_or(std::f64::NAN);
    }

    fn set_eigen(&mut self, eig: EigenDecomposition) {
        self.eigenvalues = Some(eig.values);
        self.eigenvectors = Some(eig.vectors);
    }

    fn set_surface(&mut self, surface: &dyn ReducedSurrogate) {
        self.num_grid_points = surface.num_points();
        self.response_grid = surface.descriptor();
        self.response_coefficients = Some(surface.coefficients());
    }

    /// The l2 error, bounds and shadow plot of a reduced surface.
    fn set_response(
        &mut self,
        surface: &dyn ReducedSurrogate,
        validation: &SampleSet,
        num_shadow_1d_points: usize,
    ) -> FailResult<()> {
        self.l2_error = reduced::l2_error(surface, validation)?;
        let (lower, upper) = surface.bounds();
        self.bounds = [lower, upper];
        self.shadow_1d = reduced::shadow_1d(surface, num_shadow_1d_points);
        Ok(())
    }
}

/// Run one cell of the sweep.
///
/// `num_samples` is the point budget (grid methods) or the number of samples
/// (classical and Halton). `num_data` is the dataset size for data strategies.
/// If `save_dir` is given, the full-domain approximation is written there.
pub fn run_cell(
    objective: &dyn Objective,
    config: &PipelineConfig,
    num_samples: usize,
    num_data: usize,
    save_dir: Option<&Path>,
) -> FailResult<CellResult> {
    config.validate()?;
    let mut rng = sampling::cell_rng(config.seed, (num_samples as u64) << 32 | num_data as u64);
    match config.method {
        Method::AsSgpp => run_as_sgpp(objective, config, num_samples, num_data, save_dir, &mut rng),
        Method::Sgpp => run_sgpp(objective, config, num_samples, num_data, save_dir, &mut rng),
        Method::As | Method::Ols | Method::Qphd => run_classical(objective, config, num_samples, num_data, &mut rng),
        Method::Halton => run_halton(objective, config, num_samples),
    }
}

fn dataset(objective: &dyn Objective, config: &PipelineConfig, num_data: usize) -> FailResult<SampleSet> {
    let root = config.data_dir.as_ref()
        .ok_or_else(|| ConfigurationError("data strategies need a data directory".into()))?;
    DatasetCache::new(root, config.seed).load_or_create(objective, num_data)
}

/// Seeded uniform points in the unit cube, evaluated.
fn error_points(unit: &dyn Objective, config: &PipelineConfig, rng: &mut StdRng) -> FailResult<SampleSet> {
    let points = sampling::uniform(rng, config.num_error_points, unit.dim(), 0.0, 1.0);
    SampleSet::evaluate(unit, points)
}

fn budget_strategy(strategy: Strategy, initial_level: u32, config: &PipelineConfig) -> ApproximationStrategy {
    match strategy {
        Strategy::Regular => ApproximationStrategy::Regular,
        _ => ApproximationStrategy::Adaptive { initial_level, num_refine: config.num_refine },
    }
}

/// Level of the regular reduced grids: `⌊log2(n + 1)⌋`, which has `2^l + 1` points.
fn reduced_regular_level(num_samples: usize) -> u32 {
    (((num_samples + 1) as f64).log2().floor() as u32).max(1)
}

fn run_as_sgpp(
    objective: &dyn Objective,
    config: &PipelineConfig,
    num_samples: usize,
    num_data: usize,
    save_dir: Option<&Path>,
    rng: &mut StdRng,
) -> FailResult<CellResult> {
    let unit = UnitCubeView::new(objective);
    let degree = config.grid_type.effective_degree(config.degree)?;

    let (strategy, held_out) = match config.asm_type {
        Strategy::Adaptive | Strategy::Regular => {
            (budget_strategy(config.asm_type, config.initial_level, config), None)
        },
        Strategy::Data => {
            let (training, validation) = dataset(objective, config, num_data)?.split();
            let strategy = ApproximationStrategy::Data {
                training, lambda: FULL_DOMAIN_LAMBDA,
                initial_level: config.initial_level, num_refine: config.num_refine,
            };
            (strategy, Some(validation))
        },
        Strategy::DataR => {
            let (training, validation) = dataset(objective, config, num_data)?.split();
            let strategy = ApproximationStrategy::DataRegular {
                training, lambda: FULL_DOMAIN_LAMBDA, level: DATA_RECOGNITION_LEVEL,
            };
            (strategy, Some(validation))
        },
        Strategy::DataDrivenR => throw!(ConfigurationError(format!(
            "unsupported recognition strategy '{}'", config.asm_type,
        ))),
    };
    let approx = Approximation::build(objective, config.grid_type, degree, num_samples, strategy)?;
    debug!("recognition surrogate has {} points", approx.num_points());
    if let Some(dir) = save_dir {
        approx.save(dir)?;
    }

    let eig = CMatrix::from_interpolant(&approx.interpolant, NUM_C_POINTS)?.decompose()?;
    debug!("eigenvalues: {}", eig.values);
    let direction = eig.dominant();
    let direction = direction.view();

    let surface = match config.response_type {
        Strategy::Adaptive => SparseGridReducedSurface::adaptive(
            &unit, direction, degree, num_samples, config.initial_level, config.num_refine,
        )?,
        Strategy::Regular => SparseGridReducedSurface::regular(&unit, direction, degree, num_samples)?,
        Strategy::Data => SparseGridReducedSurface::from_data(
            direction, degree, &approx.samples, num_samples,
            config.initial_level, config.num_refine, REDUCED_LAMBDA,
        )?,
        Strategy::DataR => {
            let level = reduced_regular_level(num_samples);
            SparseGridReducedSurface::from_data_regular(direction, degree, &approx.samples, level, REDUCED_LAMBDA)?
        },
        Strategy::DataDrivenR => {
            let level = reduced_regular_level(num_samples);
            SparseGridReducedSurface::from_data_driven(direction, degree, &approx.samples, level, REDUCED_LAMBDA)?
        },
    };

    let mut result = CellResult::empty();
    result.set_surface(&surface);
    if config.do_response {
        let validation = match held_out {
            Some(validation) => validation,
            None => error_points(&unit, config, rng)?,
        };
        result.set_response(&surface, &validation, config.num_shadow_1d_points)?;
    }
    if config.do_integral {
        let estimate = integration::integrate(
            &surface, config.integral_type, &config.integration, objective.domain().volume(),
        )?;
        result.set_integral(estimate.with_reference(objective.true_integral()));
    }
    result.set_eigen(eig);
    Ok(result)
}

fn run_sgpp(
    objective: &dyn Objective,
    config: &PipelineConfig,
    num_samples: usize,
    num_data: usize,
    save_dir: Option<&Path>,
    rng: &mut StdRng,
) -> FailResult<CellResult> {
    let unit = UnitCubeView::new(objective);
    let degree = config.grid_type.effective_degree(config.degree)?;

    let (strategy, held_out) = match config.response_type {
        // a full-dimensional adaptive surrogate always starts from level 1
        Strategy::Adaptive | Strategy::Regular => (budget_strategy(config.response_type, 1, config), None),
        Strategy::Data => {
            let (training, validation) = dataset(objective, config, num_data)?.split();
            let strategy = ApproximationStrategy::Data {
                training, lambda: FULL_DOMAIN_LAMBDA,
                initial_level: config.initial_level, num_refine: config.num_refine,
            };
            (strategy, Some(validation))
        },
        Strategy::DataR => {
            let (training, validation) = dataset(objective, config, num_data)?.split();
            let level = approximation::data_regular_level(config.grid_type, objective.dim(), num_samples);
            info!("{} grid points requested, using level {}", num_samples, level);
            let strategy = ApproximationStrategy::DataRegular { training, lambda: FULL_DOMAIN_LAMBDA, level };
            (strategy, Some(validation))
        },
        Strategy::DataDrivenR => throw!(ConfigurationError(format!(
            "method '{}' does not support the response type '{}'", config.method, config.response_type,
        ))),
    };
    let approx = Approximation::build(objective, config.grid_type, degree, num_samples, strategy)?;
    if let Some(dir) = save_dir {
        approx.save(dir)?;
    }

    let mut result = CellResult::empty();
    if config.do_response {
        let validation = match held_out {
            Some(validation) => validation,
            None => error_points(&unit, config, rng)?,
        };
        result.l2_error = reduced::l2_error_of(|u| approx.eval(u), &validation)?;
    }
    if config.do_integral {
        let estimate = IntegralEstimate::new(approx.integral() * objective.domain().volume());
        result.set_integral(estimate.with_reference(objective.true_integral()));
    }
    result.num_grid_points = approx.num_points();
    result.response_grid = Some(approx.interpolant.descriptor());
    result.response_coefficients = Some(approx.interpolant.coefficients().to_vec());
    Ok(result)
}

/// Training points of the classical methods, in `[-1,1]^d`.
///
/// The borehole inputs follow its input distribution; everything else is uniform.
fn classical_points(objective: &dyn Objective, rng: &mut StdRng, num_samples: usize) -> Array2<f64> {
    let dim = objective.dim();
    match objective.name().as_str() {
        "borehole" => {
            let domain = objective.domain();
            let raw = sampling::borehole(rng, num_samples);
            let rows: Vec<Vec<f64>> = raw.outer_iter().map(|z| domain.to_normalized(&z.to_vec())).collect();
            Array2::from_shape_fn((num_samples, dim), |(i, k)| rows[i][k])
        },
        _ => sampling::uniform(rng, num_samples, dim, -1.0, 1.0),
    }
}

/// The classical method, on `[-1,1]^d`.
fn run_classical(
    objective: &dyn Objective,
    config: &PipelineConfig,
    num_samples: usize,
    num_data: usize,
    rng: &mut StdRng,
) -> FailResult<CellResult> {
    let normalized = NormalizedView::new(objective);
    let dim = objective.dim();
    let domain = objective.domain();

    let (training, validation) = match config.response_type {
        Strategy::Regular => {
            let points = classical_points(objective, rng, num_samples);
            let training = SampleSet::evaluate(&normalized, points)?;
            let error_points = sampling::uniform(rng, config.num_error_points, dim, -1.0, 1.0);
            (training, SampleSet::evaluate(&normalized, error_points)?)
        },
        Strategy::Data => {
            let data = dataset(objective, config, num_data)?;
            data.map_points(|u| u.iter().map(|u| 2.0 * u - 1.0).collect()).split()
        },
        other => throw!(ConfigurationError(format!(
            "method '{}' does not support the response type '{}'", config.method, other,
        ))),
    };

    let points = training.points();
    let values = training.values();
    let gradients = match config.method {
        Method::As => Some(gradients(&normalized, points)?),
        _ => None,
    };
    let build = |rows: Option<&[usize]>| -> FailResult<CMatrix> {
        let select = |a: ndarray::ArrayView2<'_, f64>| match rows {
            Some(rows) => recognition::select_rows(a, rows),
            None => a.to_owned(),
        };
        let select_values = |v: ArrayView1<'_, f64>| match rows {
            Some(rows) => v.select(Axis(0), rows),
            None => v.to_owned(),
        };
        match (config.method, &gradients) {
            (Method::As, Some(gradients)) => CMatrix::from_gradients(select(gradients.view()).view()),
            (Method::Qphd, _) => CMatrix::qphd(select(points).view(), select_values(values).view()),
            _ => CMatrix::ols(select(points).view(), select_values(values).view()),
        }
    };

    let eig = build(None)?.decompose()?;
    debug!("eigenvalues: {}", eig.values);

    let mut result = CellResult::empty();
    if config.nboot > 0 {
        let ranges = recognition::bootstrap_eigenvalues(rng, config.nboot, training.len(), |rows| build(Some(rows)))?;
        debug!("bootstrap eigenvalue ranges: {:?}", ranges);
        result.eigenvalue_bootstrap = Some(ranges);
    }

    let surface = PolynomialSurface::fit(eig.dominant().view(), &training, config.degree)?;
    result.set_surface(&surface);
    result.num_grid_points = training.len();
    result.response_grid = None;
    if config.do_response {
        result.set_response(&surface, &validation, config.num_shadow_1d_points)?;
    }
    if config.do_integral {
        let estimate = integration::av_integrate(&surface, domain.volume())?;
        result.set_integral(estimate.with_reference(objective.true_integral()));
    }
    result.set_eigen(eig);
    Ok(result)
}

fn gradients(objective: &dyn Objective, points: ndarray::ArrayView2<'_, f64>) -> FailResult<Array2<f64>> {
    let mut out = Array2::zeros(points.dim());
    for (x, mut row) in points.outer_iter().zip(out.outer_iter_mut()) {
        let grad = objective.eval_gradient(&x.to_vec()).ok_or_else(|| ConfigurationError(format!(
            "method 'AS' needs gradients, and objective '{}' has none", objective.name(),
        )))?;
        row.assign(&ArrayView1::from(&grad[..]));
    }
    Ok(out)
}

/// Quasi-Monte-Carlo: the mean over Halton points `0..n`, times the volume.
fn run_halton(objective: &dyn Objective, config: &PipelineConfig, num_samples: usize) -> FailResult<CellResult> {
    if num_samples == 0 {
        throw!(InsufficientDataError("Halton integration needs at least one point".into()));
    }
    let mut result = CellResult::empty();
    result.num_grid_points = num_samples;
    if !config.do_integral {
        return Ok(result);
    }
    let unit = UnitCubeView::new(objective);
    let points = sampling::halton(num_samples, objective.dim(), 0);
    let mean = unit.eval_many(points.view()).sum() / num_samples as f64;

    let estimate = IntegralEstimate::new(mean * objective.domain().volume());
    result.set_integral(estimate.with_reference(objective.true_integral()));
    Ok(result)
}
