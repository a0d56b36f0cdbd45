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

//! Integrals of reduced surrogates against the density of the projection.
//!
//! For `u` uniform on `[lo, hi]^d`, the integral of the objective is
//! approximated by `volume · ∫ g(y) ρ(y) dy`, where `g` is the reduced
//! surrogate and `ρ` is the density of `y = wᵀu`.

use crate::reduced::{reduced_grid_type, ReducedSurrogate};
use crate::sampling::{halton, radical_inverse};
use crate::{FailResult, IntegralType, IntegrationFailureError};
use asgrid_linalg::GaussRule;
use asgrid_sparse_grid::{Grid, SparseGridInterpolant};
use itertools::Itertools;
use ndarray::ArrayView1;

/// Weights below this fraction of the largest one are replaced by their mean.
pub const NEGLIGIBLE_WEIGHT: f64 = 1e-3;
/// The density has up to `2^m` pieces for `m` active weights.
pub const MAX_ACTIVE_WEIGHTS: usize = 16;

/// Histogram parameters of the classical quadrature.
const AV_CELLS: usize = 1000;
const AV_POINTS: usize = 10000;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IntegralEstimate {
    pub value: f64,
    /// `|value − exact|`, when the exact integral is known.
    pub error: Option<f64>,
}

impl IntegralEstimate {
    pub fn new(value: f64) -> Self {
        IntegralEstimate { value, error: None }
    }

    pub fn with_reference(self, exact: Option<f64>) -> Self {
        IntegralEstimate { error: exact.map(|exact| (self.value - exact).abs()), ..self }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IntegrationParams {
    /// Projected quasi-random points used to estimate the density.
    pub num_histogram_points: usize,
    /// Gauss-Legendre nodes per interval.
    pub quad_order: usize,
    pub app_spline_level: u32,
    pub app_spline_degree: u32,
    /// Evaluations of the surrogate for `MC`.
    pub mc_points: usize,
    /// Histogram cells for `MC` and `Hist`.
    pub cells: usize,
}

impl Default for IntegrationParams {
    fn default() -> Self {
        IntegrationParams {
            num_histogram_points: 100_000,
            quad_order: 7,
            app_spline_level: 5,
            app_spline_degree: 3,
            mc_points: 100,
            cells: 11,
        }
    }
}

//--------------------------------------------------------------------------------------

/// Density of `y = wᵀu` for `u` uniform on `[lo, hi]^d`.
///
/// This is the density of a sum of scaled uniforms: a piecewise polynomial of
/// degree `m − 1`, with `m` the number of non-negligible weights, and a break
/// at every subset sum of the weights.
///
/// It is built by convolving one box at a time, largest first. Each piece is
/// kept by its values at Chebyshev points, and every new value is a box
/// average `(F(y) − F(y − a)) / a` of the previous density. The result stays
/// accurate when some weights are a thousand times smaller than the others.
#[derive(Debug, Clone)]
pub struct ProjectedDensity {
    offset: f64,
    /// Relative to `offset`.
    density: Piecewise,
}

impl ProjectedDensity {
    pub fn new(direction: ArrayView1<'_, f64>, lo: f64, hi: f64) -> FailResult<Self> {
        let width = hi - lo;
        let weights: Vec<f64> = direction.iter().map(|w| w * width).collect();
        let largest = weights.iter().fold(0.0f64, |acc, w| acc.max(w.abs()));
        if !(largest > 0.0 && largest.is_finite()) {
            throw!(IntegrationFailureError(format!("direction {} has no usable weight", direction)));
        }

        let mut offset: f64 = direction.iter().map(|w| w * lo).sum();
        let mut scales = vec![];
        for &a in &weights {
            if a.abs() < NEGLIGIBLE_WEIGHT * largest {
                offset += a / 2.0;
            } else if a < 0.0 {
                // a·v = a + |a|·(1 − v)
                offset += a;
                scales.push(-a);
            } else {
                scales.push(a);
            }
        }
        if scales.len() > MAX_ACTIVE_WEIGHTS {
            throw!(IntegrationFailureError(format!(
                "the projected density supports at most {} active weights, got {}",
                MAX_ACTIVE_WEIGHTS, scales.len(),
            )));
        }
        scales.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let rule = GaussRule::legendre(MAX_ACTIVE_WEIGHTS / 2 + 1)?;
        let mut density = Piecewise::uniform(scales[0]);
        for &a in &scales[1..] {
            density = density.convolve_box(a, &rule);
        }
        trace!("projected density: {} active weights, {} pieces", scales.len(), density.pieces.len());
        Ok(ProjectedDensity { offset, density })
    }

    pub fn support(&self) -> (f64, f64) {
        let (lower, upper) = self.density.support();
        (self.offset + lower, self.offset + upper)
    }

    pub fn eval(&self, y: f64) -> f64 {
        // rounding can leave tiny negative values near the tails
        self.density.eval(y - self.offset).max(0.0)
    }

    /// Every break of the piecewise polynomial, sorted.
    pub fn breakpoints(&self) -> Vec<f64> {
        self.density.edges.iter().map(|e| self.offset + e).collect()
    }
}

/// A polynomial on `[left, right]`, by its values at the Chebyshev-Lobatto
/// points `cos(πj/n)`, mapped onto the interval.
#[derive(Debug, Clone)]
struct Piece {
    left: f64,
    right: f64,
    values: Vec<f64>,
}

fn lobatto_point(j: usize, degree: usize) -> f64 {
    match degree {
        0 => 0.0,
        n => (std::f64::consts::PI * j as f64 / n as f64).cos(),
    }
}

impl Piece {
    fn degree(&self) -> usize { self.values.len() - 1 }

    /// Barycentric interpolation through the stored values.
    fn eval(&self, y: f64) -> f64 {
        let n = self.degree();
        if n == 0 {
            return self.values[0];
        }
        let s = (2.0 * y - self.left - self.right) / (self.right - self.left);
        let (mut num, mut den) = (0.0, 0.0);
        for (j, &value) in self.values.iter().enumerate() {
            let diff = s - lobatto_point(j, n);
            if diff == 0.0 {
                return value;
            }
            let mut weight = if j % 2 == 0 { 1.0 } else { -1.0 };
            if j == 0 || j == n {
                weight /= 2.0;
            }
            weight /= diff;
            num += weight * value;
            den += weight;
        }
        num / den
    }

    /// `∫_a^b`, exact for the degrees `rule` was chosen for.
    fn integral(&self, a: f64, b: f64, rule: &GaussRule) -> f64 {
        if !(b > a) {
            return 0.0;
        }
        let (mid, half) = ((a + b) / 2.0, (b - a) / 2.0);
        half * rule.nodes.iter().zip(&rule.weights)
            .map(|(&x, &w)| w * self.eval(mid + half * x))
            .sum::<f64>()
    }
}

#[derive(Debug, Clone)]
struct Piecewise {
    edges: Vec<f64>,
    pieces: Vec<Piece>,
    /// Mass to the left of each edge.
    cumulative: Vec<f64>,
}

impl Piecewise {
    /// The density of `U[0, a]`.
    fn uniform(a: f64) -> Self {
        let piece = Piece { left: 0.0, right: a, values: vec![1.0 / a] };
        Piecewise { edges: vec![0.0, a], pieces: vec![piece], cumulative: vec![0.0, 1.0] }
    }

    fn support(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    fn piece_index(&self, y: f64) -> usize {
        let after = self.edges.partition_point(|&e| e <= y);
        after.saturating_sub(1).min(self.pieces.len() - 1)
    }

    fn eval(&self, y: f64) -> f64 {
        let (lower, upper) = self.support();
        if !(lower < y && y < upper) {
            return 0.0;
        }
        self.pieces[self.piece_index(y)].eval(y)
    }

    fn cdf(&self, y: f64, rule: &GaussRule) -> f64 {
        let (lower, upper) = self.support();
        if y <= lower {
            return 0.0;
        }
        if y >= upper {
            return self.cumulative[self.cumulative.len() - 1];
        }
        let k = self.piece_index(y);
        let piece = &self.pieces[k];
        self.cumulative[k] + piece.integral(piece.left, y, rule)
    }

    /// The density of `Y + V` with `V ~ U[0, a]` independent of `Y`.
    fn convolve_box(&self, a: f64, rule: &GaussRule) -> Self {
        let (lower, upper) = self.support();
        let tol = 1e-12 * (upper + a - lower);
        let mut edges: Vec<f64> = self.edges.iter()
            .flat_map(|&e| vec![e, e + a])
            .collect();
        edges.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
        edges.dedup_by(|x, y| (*x - *y).abs() <= tol);

        let degree = self.pieces[0].degree() + 1;
        let nodes: Vec<f64> = (0..=degree).map(|j| lobatto_point(j, degree)).collect();
        let pieces: Vec<Piece> = edges.windows(2)
            .map(|pair| {
                let (left, right) = (pair[0], pair[1]);
                let (mid, half) = ((left + right) / 2.0, (right - left) / 2.0);
                let values = nodes.iter()
                    .map(|&s| {
                        let y = mid + half * s;
                        (self.cdf(y, rule) - self.cdf(y - a, rule)) / a
                    })
                    .collect();
                Piece { left, right, values }
            })
            .collect();

        let mut cumulative = vec![0.0];
        for piece in &pieces {
            let last = cumulative[cumulative.len() - 1];
            cumulative.push(last + piece.integral(piece.left, piece.right, rule));
        }
        Piecewise { edges, pieces, cumulative }
    }
}

//--------------------------------------------------------------------------------------

/// `volume · ∫ g ρ` by the chosen rule.
pub fn integrate(
    surrogate: &dyn ReducedSurrogate,
    integral_type: IntegralType,
    params: &IntegrationParams,
    volume: f64,
) -> FailResult<IntegralEstimate> {
    let (lower, upper) = checked_interval(surrogate)?;
    let value = match integral_type {
        IntegralType::MonteCarlo => monte_carlo(surrogate, (lower, upper), params)?,
        IntegralType::Histogram => histogram_rule(surrogate, (lower, upper), params.cells, params.num_histogram_points)?,
        IntegralType::Spline => spline_rule(surrogate, (lower, upper), params.quad_order)?,
        IntegralType::ApproximateSpline => approximate_spline_rule(surrogate, (lower, upper), params)?,
    };
    finish(value, volume, integral_type.name())
}

/// The histogram rule used by the classical method: 1000 cells, 10000 points.
pub fn av_integrate(surrogate: &dyn ReducedSurrogate, volume: f64) -> FailResult<IntegralEstimate> {
    let interval = checked_interval(surrogate)?;
    let value = histogram_rule(surrogate, interval, AV_CELLS, AV_POINTS)?;
    finish(value, volume, "av")
}

fn finish(value: f64, volume: f64, rule: &str) -> FailResult<IntegralEstimate> {
    let value = value * volume;
    if !value.is_finite() {
        throw!(IntegrationFailureError(format!("{} integral is {}", rule, value)));
    }
    trace!("{} integral: {}", rule, value);
    Ok(IntegralEstimate::new(value))
}

fn checked_interval(surrogate: &dyn ReducedSurrogate) -> FailResult<(f64, f64)> {
    let (lower, upper) = surrogate.bounds();
    if !(lower.is_finite() && upper.is_finite() && upper > lower) {
        throw!(IntegrationFailureError(format!("degenerate reduced domain [{}, {}]", lower, upper)));
    }
    Ok((lower, upper))
}

fn checked_eval(surrogate: &dyn ReducedSurrogate, y: f64) -> FailResult<f64> {
    let value = surrogate.eval_reduced(y);
    if !value.is_finite() {
        throw!(IntegrationFailureError(format!("surrogate is {} at y = {}", value, y)));
    }
    Ok(value)
}

/// Fraction of `num_points` projected Halton points in each of `cells`
/// equal cells of `[lower, upper]`.
fn histogram(
    surrogate: &dyn ReducedSurrogate,
    (lower, upper): (f64, f64),
    cells: usize,
    num_points: usize,
) -> FailResult<Vec<f64>> {
    if cells == 0 || num_points == 0 {
        throw!(IntegrationFailureError("histogram needs at least one cell and one point".into()));
    }
    let direction = surrogate.direction();
    let (lo, hi) = surrogate.cube();
    let points = halton(num_points, direction.len(), 1);
    let mut counts = vec![0usize; cells];
    for row in points.outer_iter() {
        let y: f64 = row.iter().zip(direction).map(|(h, w)| w * (lo + (hi - lo) * h)).sum();
        // rounding can put a point just outside the bounds
        let cell = ((y - lower) / (upper - lower) * cells as f64).floor().max(0.0) as usize;
        counts[cell.min(cells - 1)] += 1;
    }
    Ok(counts.into_iter().map(|c| c as f64 / num_points as f64).collect())
}

fn monte_carlo(
    surrogate: &dyn ReducedSurrogate,
    (lower, upper): (f64, f64),
    params: &IntegrationParams,
) -> FailResult<f64> {
    if params.mc_points == 0 {
        throw!(IntegrationFailureError("no Monte Carlo points".into()));
    }
    let fractions = histogram(surrogate, (lower, upper), params.cells, params.num_histogram_points)?;
    let width = upper - lower;
    let cell_width = width / params.cells as f64;
    let mut sum = 0.0;
    for k in 0..params.mc_points {
        let t = radical_inverse(k as u64 + 1, 2);
        let y = lower + t * width;
        let cell = ((t * params.cells as f64) as usize).min(params.cells - 1);
        sum += checked_eval(surrogate, y)? * fractions[cell] / cell_width;
    }
    Ok(width * sum / params.mc_points as f64)
}

fn histogram_rule(
    surrogate: &dyn ReducedSurrogate,
    (lower, upper): (f64, f64),
    cells: usize,
    num_points: usize,
) -> FailResult<f64> {
    let fractions = histogram(surrogate, (lower, upper), cells, num_points)?;
    let cell_width = (upper - lower) / cells as f64;
    let mut sum = 0.0;
    for (k, fraction) in fractions.into_iter().enumerate() {
        if fraction == 0.0 {
            continue;
        }
        let mid = lower + (k as f64 + 0.5) * cell_width;
        sum += fraction * checked_eval(surrogate, mid)?;
    }
    Ok(sum)
}

/// Sorted union of breakpoints, clipped to `[lower, upper]`.
fn merged_edges(lower: f64, upper: f64, sets: &[Vec<f64>]) -> Vec<f64> {
    let tol = 1e-12 * (upper - lower);
    let mut edges: Vec<f64> = sets.iter().flatten().cloned()
        .filter(|&x| lower < x && x < upper)
        .chain(vec![lower, upper])
        .collect();
    edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    edges.dedup_by(|a, b| (*a - *b).abs() <= tol);
    edges
}

fn gauss_with_density(
    surrogate: &dyn ReducedSurrogate,
    edges: &[f64],
    quad_order: usize,
    density: impl Fn(f64) -> f64,
) -> FailResult<f64> {
    let rule = GaussRule::legendre(quad_order)?.piecewise(edges);
    let mut sum = 0.0;
    for (&y, &w) in rule.nodes.iter().zip(&rule.weights) {
        let rho = density(y);
        if rho != 0.0 {
            sum += w * checked_eval(surrogate, y)? * rho;
        }
    }
    Ok(sum)
}

fn spline_rule(surrogate: &dyn ReducedSurrogate, (lower, upper): (f64, f64), quad_order: usize) -> FailResult<f64> {
    let (lo, hi) = surrogate.cube();
    let density = ProjectedDensity::new(surrogate.direction(), lo, hi)?;
    let edges = merged_edges(lower, upper, &[surrogate.knots(), density.breakpoints()]);
    gauss_with_density(surrogate, &edges, quad_order, |y| density.eval(y))
}

fn approximate_spline_rule(
    surrogate: &dyn ReducedSurrogate,
    (lower, upper): (f64, f64),
    params: &IntegrationParams,
) -> FailResult<f64> {
    let (lo, hi) = surrogate.cube();
    let density = ProjectedDensity::new(surrogate.direction(), lo, hi)?;
    let width = upper - lower;

    let grid_type = reduced_grid_type(params.app_spline_degree);
    let degree = grid_type.effective_degree(params.app_spline_degree)?;
    let grid = Grid::regular(grid_type, degree, 1, params.app_spline_level)?;
    let values: Vec<f64> = grid.points().iter()
        .map(|p| density.eval(lower + p.coord(0) * width))
        .collect();
    let approx = SparseGridInterpolant::interpolate(grid, &values)?;

    let grid_knots = approx.grid().breakpoints(0).into_iter().map(|t| lower + t * width).collect();
    let edges = merged_edges(lower, upper, &[surrogate.knots(), grid_knots]);
    gauss_with_density(surrogate, &edges, params.quad_order, |y| {
        approx.eval(&[((y - lower) / width).max(0.0).min(1.0)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array1};

    /// `g(y) = f(y)` along a fixed direction.
    #[derive(Debug)]
    struct Line {
        direction: Array1<f64>,
        bounds: (f64, f64),
        cube: (f64, f64),
        f: fn(f64) -> f64,
    }

    impl Line {
        fn new(direction: &[f64], f: fn(f64) -> f64) -> Self {
            Line::new_on(direction, (0.0, 1.0), f)
        }

        fn new_on(direction: &[f64], cube: (f64, f64), f: fn(f64) -> f64) -> Self {
            let (lo, hi) = cube;
            let lower: f64 = direction.iter().map(|&w| f64::min(w * lo, w * hi)).sum();
            let upper: f64 = direction.iter().map(|&w| f64::max(w * lo, w * hi)).sum();
            Line { direction: Array1::from(direction.to_vec()), bounds: (lower, upper), cube, f }
        }
    }

    impl ReducedSurrogate for Line {
        fn direction(&self) -> ArrayView1<'_, f64> { self.direction.view() }
        fn bounds(&self) -> (f64, f64) { self.bounds }
        fn cube(&self) -> (f64, f64) { self.cube }
        fn eval_reduced(&self, y: f64) -> f64 { (self.f)(y) }
        fn knots(&self) -> Vec<f64> { vec![self.bounds.0, self.bounds.1] }
        fn coefficients(&self) -> Vec<f64> { vec![] }
    }

    fn total_mass(density: &ProjectedDensity) -> f64 {
        let (lower, upper) = density.support();
        let edges = merged_edges(lower, upper, &[density.breakpoints()]);
        GaussRule::legendre(7).unwrap().piecewise(&edges).integrate(|y| density.eval(y))
    }

    #[test]
    fn density_of_two_equal_weights_is_a_triangle() {
        let density = ProjectedDensity::new(arr1(&[1.0, 1.0]).view(), 0.0, 1.0).unwrap();
        assert_eq!(density.support(), (0.0, 2.0));
        assert_close!(abs=1e-14, density.eval(0.5), 0.5);
        assert_close!(abs=1e-14, density.eval(1.0), 1.0);
        assert_close!(abs=1e-14, density.eval(1.5), 0.5);
        assert_eq!(density.eval(2.5), 0.0);
        assert_eq!(density.breakpoints(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn negative_and_negligible_weights() {
        // w = (1, -1, 1e-6) on [0,1]^3: a triangle on [-1, 1], nudged by 5e-7
        let density = ProjectedDensity::new(arr1(&[1.0, -1.0, 1e-6]).view(), 0.0, 1.0).unwrap();
        let (lower, upper) = density.support();
        assert_close!(abs=1e-15, lower, -1.0 + 5e-7);
        assert_close!(abs=1e-15, upper, 1.0 + 5e-7);
        assert_close!(abs=1e-12, density.eval(5e-7), 1.0);
    }

    #[test]
    fn three_equal_weights_give_the_irwin_hall_density() {
        let density = ProjectedDensity::new(arr1(&[1.0, 1.0, 1.0]).view(), 0.0, 1.0).unwrap();
        assert_eq!(density.breakpoints(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_close!(abs=1e-13, density.eval(0.5), 0.125);
        assert_close!(abs=1e-13, density.eval(1.5), 0.75);
        assert_close!(abs=1e-13, density.eval(2.0), 0.5);
        assert_close!(abs=1e-13, density.eval(2.9), 0.005);
    }

    #[test]
    fn one_dominant_weight_and_many_small_ones() {
        // the small weights only blur the edges of the box:
        // the support is ±1.018 and the density is exactly 1/2 for |y| < 0.982
        let w = [1.0, 0.002, 0.003, 0.0025, 0.004, 0.0015, 0.002, 0.003];
        let density = ProjectedDensity::new(arr1(&w).view(), -1.0, 1.0).unwrap();
        let (lower, upper) = density.support();
        assert_close!(abs=1e-12, lower, -1.018);
        assert_close!(abs=1e-12, upper, 1.018);
        for k in 0..=12 {
            let y = -0.6 + 0.1 * k as f64;
            assert_close!(abs=1e-9, density.eval(y), 0.5, "y = {}", y);
        }
        assert_close!(abs=1e-9, density.eval(0.98), 0.5);
        assert!(density.eval(1.0) > 0.0 && density.eval(1.0) < 0.5);
        assert_close!(abs=1e-9, total_mass(&density), 1.0);

        // and the same shape integrates a quadratic exactly: E[y²] = Σ w_i² / 3
        let line = Line::new_on(&w, (-1.0, 1.0), |y| y * y);
        let exact = w.iter().map(|w| w * w).sum::<f64>() / 3.0;
        let estimate = integrate(&line, IntegralType::Spline, &Default::default(), 1.0).unwrap();
        assert_close!(abs=1e-9, estimate.value, exact);
    }

    #[test]
    fn densities_have_unit_mass() {
        for w in vec![vec![0.6, 0.8], vec![0.2, 0.3, 0.5, -0.4, 0.1], vec![0.3]] {
            for &(lo, hi) in &[(0.0, 1.0), (-1.0, 1.0)] {
                let density = ProjectedDensity::new(Array1::from(w.clone()).view(), lo, hi).unwrap();
                assert_close!(abs=1e-10, total_mass(&density), 1.0, "{:?} on [{}, {}]", w, lo, hi);
            }
        }
    }

    #[test]
    fn every_rule_integrates_a_constant() {
        let line = Line::new(&[0.6, 0.8], |_| 2.0);
        let params = IntegrationParams { num_histogram_points: 10000, ..Default::default() };
        for &ty in IntegralType::ALL {
            let estimate = integrate(&line, ty, &params, 3.0).unwrap();
            let tol = match ty {
                IntegralType::MonteCarlo => 0.7,
                IntegralType::ApproximateSpline => 2e-2,
                _ => 1e-10,
            };
            assert_close!(abs=tol, estimate.value, 6.0, "{}", ty);
        }
        assert_close!(abs=1e-10, av_integrate(&line, 1.0).unwrap().value, 2.0);
    }

    #[test]
    fn spline_rule_is_exact_for_polynomials() {
        // E[(wᵀu)²] for w = (0.6, 0.8): Var + mean² = (0.36 + 0.64) / 12 + 0.49
        let line = Line::new(&[0.6, 0.8], |y| y * y);
        let estimate = integrate(&line, IntegralType::Spline, &Default::default(), 1.0).unwrap();
        assert_close!(abs=1e-12, estimate.value, 1.0 / 12.0 + 0.49);
        let estimate = estimate.with_reference(Some(1.0 / 12.0 + 0.49));
        assert!(estimate.error.unwrap() < 1e-12);

        let estimate = integrate(&line, IntegralType::Histogram, &Default::default(), 1.0).unwrap();
        assert_close!(abs=1e-2, estimate.value, 1.0 / 12.0 + 0.49);
    }

    #[test]
    fn failures() {
        let nan = Line::new(&[0.6, 0.8], |_| std::f64::NAN);
        let err = integrate(&nan, IntegralType::Spline, &Default::default(), 1.0).unwrap_err();
        assert!(err.downcast_ref::<IntegrationFailureError>().is_some());

        let mut flat = Line::new(&[0.6, 0.8], |y| y);
        flat.bounds = (0.5, 0.5);
        for &ty in IntegralType::ALL {
            let err = integrate(&flat, ty, &Default::default(), 1.0).unwrap_err();
            assert!(err.downcast_ref::<IntegrationFailureError>().is_some());
        }
        let err = av_integrate(&flat, 1.0).unwrap_err();
        assert!(err.downcast_ref::<IntegrationFailureError>().is_some());
    }
}
