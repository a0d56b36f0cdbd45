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

//! Objective functions and the domains they live on.

use crate::numerical;
use crate::{ConfigurationError, FailResult};
use ndarray::{Array1, ArrayView2};
use std::f64::consts::PI;
use std::fmt;

/// An axis-aligned box `[lower, upper]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Domain {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> FailResult<Domain> {
        ensure!(lower.len() == upper.len(), "domain bounds have lengths {} and {}", lower.len(), upper.len());
        for (k, (lo, hi)) in lower.iter().zip(&upper).enumerate() {
            ensure!(lo < hi, "empty domain along axis {}: [{}, {}]", k, lo, hi);
        }
        Ok(Domain { lower, upper })
    }

    /// `[0,1]^dim`
    pub fn unit(dim: usize) -> Domain {
        Domain { lower: vec![0.0; dim], upper: vec![1.0; dim] }
    }

    /// `[-1,1]^dim`
    pub fn symmetric(dim: usize) -> Domain {
        Domain { lower: vec![-1.0; dim], upper: vec![1.0; dim] }
    }

    pub fn dim(&self) -> usize { self.lower.len() }

    pub fn widths(&self) -> Vec<f64> {
        self.lower.iter().zip(&self.upper).map(|(lo, hi)| hi - lo).collect()
    }

    pub fn volume(&self) -> f64 { self.widths().iter().product() }

    pub fn to_unit(&self, x: &[f64]) -> Vec<f64> {
        self.axes().zip(x).map(|((lo, hi), &x)| (x - lo) / (hi - lo)).collect()
    }

    pub fn from_unit(&self, u: &[f64]) -> Vec<f64> {
        self.axes().zip(u).map(|((lo, hi), &u)| lo + u * (hi - lo)).collect()
    }

    pub fn to_normalized(&self, x: &[f64]) -> Vec<f64> {
        self.to_unit(x).into_iter().map(|u| 2.0 * u - 1.0).collect()
    }

    pub fn from_normalized(&self, z: &[f64]) -> Vec<f64> {
        let u: Vec<f64> = z.iter().map(|z| (z + 1.0) / 2.0).collect();
        self.from_unit(&u)
    }

    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.dim() && self.axes().zip(x).all(|((lo, hi), &x)| lo <= x && x <= hi)
    }

    fn axes(&self) -> impl Iterator<Item=(f64, f64)> + '_ {
        self.lower.iter().cloned().zip(self.upper.iter().cloned())
    }
}

/// A black-box scalar function on a box.
///
/// Implementors are immutable, so a single objective can be shared by every
/// cell of a sweep.
pub trait Objective: Send + Sync {
    fn name(&self) -> String;

    fn dim(&self) -> usize { self.domain().dim() }

    fn domain(&self) -> Domain;

    fn eval(&self, x: &[f64]) -> f64;

    /// `None` if the objective has no gradient.
    fn eval_gradient(&self, _x: &[f64]) -> Option<Vec<f64>> { None }

    /// The exact integral over the domain, when known.
    fn true_integral(&self) -> Option<f64> { None }

    /// Evaluate at each row of `points`.
    fn eval_many(&self, points: ArrayView2<'_, f64>) -> Array1<f64> {
        points.outer_iter()
            .map(|row| self.eval(&row.to_vec()))
            .collect()
    }
}

impl<'a, T: Objective + ?Sized> Objective for &'a T {
    fn name(&self) -> String { (**self).name() }
    fn dim(&self) -> usize { (**self).dim() }
    fn domain(&self) -> Domain { (**self).domain() }
    fn eval(&self, x: &[f64]) -> f64 { (**self).eval(x) }
    fn eval_gradient(&self, x: &[f64]) -> Option<Vec<f64>> { (**self).eval_gradient(x) }
    fn true_integral(&self) -> Option<f64> { (**self).true_integral() }
}

impl<T: Objective + ?Sized> Objective for Box<T> {
    fn name(&self) -> String { (**self).name() }
    fn dim(&self) -> usize { (**self).dim() }
    fn domain(&self) -> Domain { (**self).domain() }
    fn eval(&self, x: &[f64]) -> f64 { (**self).eval(x) }
    fn eval_gradient(&self, x: &[f64]) -> Option<Vec<f64>> { (**self).eval_gradient(x) }
    fn true_integral(&self) -> Option<f64> { (**self).true_integral() }
}

type BoxFn<T> = Box<dyn Fn(&[f64]) -> T + Send + Sync>;

/// An objective built from closures.
pub struct FnObjective {
    name: String,
    domain: Domain,
    value: BoxFn<f64>,
    gradient: Option<BoxFn<Vec<f64>>>,
    integral: Option<f64>,
}

impl FnObjective {
    pub fn new(
        name: impl Into<String>,
        domain: Domain,
        value: impl Fn(&[f64]) -> f64 + Send + Sync + 'static,
    ) -> Self {
        FnObjective {
            name: name.into(),
            domain,
            value: Box::new(value),
            gradient: None,
            integral: None,
        }
    }

    pub fn with_gradient(mut self, gradient: impl Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static) -> Self {
        self.gradient = Some(Box::new(gradient));
        self
    }

    pub fn with_integral(mut self, integral: f64) -> Self {
        self.integral = Some(integral);
        self
    }
}

impl fmt::Debug for FnObjective {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FnObjective")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("has_gradient", &self.gradient.is_some())
            .field("integral", &self.integral)
            .finish()
    }
}

impl Objective for FnObjective {
    fn name(&self) -> String { self.name.clone() }
    fn domain(&self) -> Domain { self.domain.clone() }
    fn eval(&self, x: &[f64]) -> f64 { (self.value)(x) }
    fn eval_gradient(&self, x: &[f64]) -> Option<Vec<f64>> { self.gradient.as_ref().map(|g| g(x)) }
    fn true_integral(&self) -> Option<f64> { self.integral }
}

/// An objective seen through the affine map from `[0,1]^d` onto its domain.
///
/// Gradients are taken with respect to the unit-cube coordinates.
pub struct UnitCubeView<'a> {
    inner: &'a dyn Objective,
    domain: Domain,
}

impl<'a> UnitCubeView<'a> {
    pub fn new(inner: &'a dyn Objective) -> Self {
        UnitCubeView { inner, domain: inner.domain() }
    }
}

impl<'a> Objective for UnitCubeView<'a> {
    fn name(&self) -> String { self.inner.name() }
    fn dim(&self) -> usize { self.domain.dim() }
    fn domain(&self) -> Domain { Domain::unit(self.domain.dim()) }
    fn eval(&self, u: &[f64]) -> f64 { self.inner.eval(&self.domain.from_unit(u)) }

    fn eval_gradient(&self, u: &[f64]) -> Option<Vec<f64>> {
        let grad = self.inner.eval_gradient(&self.domain.from_unit(u))?;
        Some(grad.iter().zip(self.domain.widths()).map(|(g, w)| g * w).collect())
    }

    fn true_integral(&self) -> Option<f64> {
        self.inner.true_integral().map(|value| value / self.domain.volume())
    }
}

/// An objective seen through the affine map from `[-1,1]^d` onto its domain.
pub struct NormalizedView<'a> {
    inner: &'a dyn Objective,
    domain: Domain,
}

impl<'a> NormalizedView<'a> {
    pub fn new(inner: &'a dyn Objective) -> Self {
        NormalizedView { inner, domain: inner.domain() }
    }
}

impl<'a> Objective for NormalizedView<'a> {
    fn name(&self) -> String { self.inner.name() }
    fn dim(&self) -> usize { self.domain.dim() }
    fn domain(&self) -> Domain { Domain::symmetric(self.domain.dim()) }
    fn eval(&self, z: &[f64]) -> f64 { self.inner.eval(&self.domain.from_normalized(z)) }

    fn eval_gradient(&self, z: &[f64]) -> Option<Vec<f64>> {
        let grad = self.inner.eval_gradient(&self.domain.from_normalized(z))?;
        Some(grad.iter().zip(self.domain.widths()).map(|(g, w)| g * w / 2.0).collect())
    }

    fn true_integral(&self) -> Option<f64> {
        let scale = 2f64.powi(self.domain.dim() as i32) / self.domain.volume();
        self.inner.true_integral().map(|value| value * scale)
    }
}

//--------------------------------------------------------------------------------------
// catalog

/// Look up a test function by name.
///
/// Known names are `sin{d}Dexp{r}`, `exp{d}D`, `const{d}D` and `borehole`.
pub fn by_name(name: &str) -> FailResult<Box<dyn Objective>> {
    let unknown = || ConfigurationError(format!(
        "unknown model '{}' (expected sin{{d}}Dexp{{r}}, exp{{d}}D, const{{d}}D or borehole)", name,
    ));
    let parse_dim = |s: &str| match s.parse::<usize>() {
        Ok(d) if d > 0 => Ok(d),
        _ => Err(unknown()),
    };

    if name == "borehole" {
        return Ok(Box::new(Borehole));
    }
    if name.starts_with("sin") {
        let rest = &name["sin".len()..];
        let pos = rest.find("Dexp").ok_or_else(unknown)?;
        let dim = parse_dim(&rest[..pos])?;
        let rate: f64 = rest[pos + "Dexp".len()..].parse().map_err(|_| unknown())?;
        return Ok(Box::new(SinExp { name: name.to_string(), dim, rate }));
    }
    if name.starts_with("exp") && name.ends_with('D') {
        let dim = parse_dim(&name["exp".len()..name.len() - 1])?;
        return Ok(Box::new(ExpSum { dim }));
    }
    if name.starts_with("const") && name.ends_with('D') {
        let dim = parse_dim(&name["const".len()..name.len() - 1])?;
        return Ok(Box::new(Constant { dim }));
    }
    throw!(unknown())
}

/// `sin(Σ_i exp(-r i) x_i)` on `[0,1]^d`, with `i` counting from 1.
#[derive(Debug, Clone)]
pub struct SinExp {
    name: String,
    dim: usize,
    rate: f64,
}

impl SinExp {
    pub fn new(dim: usize, rate: f64) -> Self {
        SinExp { name: format!("sin{}Dexp{}", dim, rate), dim, rate }
    }

    pub fn weights(&self) -> Vec<f64> {
        (1..=self.dim).map(|i| (-self.rate * i as f64).exp()).collect()
    }

    fn argument(&self, x: &[f64]) -> f64 {
        self.weights().iter().zip(x).map(|(a, x)| a * x).sum()
    }
}

impl Objective for SinExp {
    fn name(&self) -> String { self.name.clone() }
    fn dim(&self) -> usize { self.dim }
    fn domain(&self) -> Domain { Domain::unit(self.dim) }
    fn eval(&self, x: &[f64]) -> f64 { self.argument(x).sin() }

    fn eval_gradient(&self, x: &[f64]) -> Option<Vec<f64>> {
        let c = self.argument(x).cos();
        Some(self.weights().into_iter().map(|a| a * c).collect())
    }

    /// `Im Π_k (e^{i a_k} - 1) / (i a_k)`
    fn true_integral(&self) -> Option<f64> {
        // complex numbers as (re, im)
        let mut acc = (1.0, 0.0);
        for a in self.weights() {
            // (e^{ia} - 1) / (ia) = (sin a + i (1 - cos a)) / a
            let factor = (a.sin() / a, (1.0 - a.cos()) / a);
            acc = (acc.0 * factor.0 - acc.1 * factor.1, acc.0 * factor.1 + acc.1 * factor.0);
        }
        Some(acc.1)
    }
}

/// `exp(Σ x_i / d)` on `[0,1]^d`.
#[derive(Debug, Clone)]
pub struct ExpSum {
    dim: usize,
}

impl Objective for ExpSum {
    fn name(&self) -> String { format!("exp{}D", self.dim) }
    fn dim(&self) -> usize { self.dim }
    fn domain(&self) -> Domain { Domain::unit(self.dim) }

    fn eval(&self, x: &[f64]) -> f64 {
        (x.iter().sum::<f64>() / self.dim as f64).exp()
    }

    fn eval_gradient(&self, x: &[f64]) -> Option<Vec<f64>> {
        let value = self.eval(x) / self.dim as f64;
        Some(vec![value; self.dim])
    }

    fn true_integral(&self) -> Option<f64> {
        let d = self.dim as f64;
        Some((d * ((1.0 / d).exp() - 1.0)).powi(self.dim as i32))
    }
}

/// The constant 1 on `[0,1]^d`.
#[derive(Debug, Clone)]
pub struct Constant {
    dim: usize,
}

impl Objective for Constant {
    fn name(&self) -> String { format!("const{}D", self.dim) }
    fn dim(&self) -> usize { self.dim }
    fn domain(&self) -> Domain { Domain::unit(self.dim) }
    fn eval(&self, _: &[f64]) -> f64 { 1.0 }
    fn eval_gradient(&self, _: &[f64]) -> Option<Vec<f64>> { Some(vec![0.0; self.dim]) }
    fn true_integral(&self) -> Option<f64> { Some(1.0) }
}

/// Water flow rate through a borehole, in normalized inputs.
///
/// Inputs are `(rw, r, Tu, Hu, Tl, Hl, L, Kw)`. `rw` is normal and `log r`
/// is normal; both are given in standard deviations from their means and
/// cut off at three of them. The remaining six are uniform and mapped to
/// `[-1, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct Borehole;

impl Borehole {
    pub const RW_MEAN: f64 = 0.1;
    pub const RW_STD: f64 = 0.016_181_2;
    pub const LOG_R_MEAN: f64 = 7.71;
    pub const LOG_R_STD: f64 = 1.0056;
    pub const UNIFORM_LOWER: [f64; 6] = [63070.0, 990.0, 63.1, 700.0, 1120.0, 9855.0];
    pub const UNIFORM_UPPER: [f64; 6] = [115600.0, 1110.0, 116.0, 820.0, 1680.0, 12045.0];

    const FD_STEP: f64 = 1e-3;

    /// Physical inputs for a normalized point.
    pub fn physical(z: &[f64]) -> [f64; 8] {
        let mut out = [0.0; 8];
        out[0] = Self::RW_MEAN + Self::RW_STD * z[0];
        out[1] = (Self::LOG_R_MEAN + Self::LOG_R_STD * z[1]).exp();
        for k in 0..6 {
            let (lo, hi) = (Self::UNIFORM_LOWER[k], Self::UNIFORM_UPPER[k]);
            out[k + 2] = lo + (z[k + 2] + 1.0) / 2.0 * (hi - lo);
        }
        out
    }

    pub fn flow_rate(p: &[f64; 8]) -> f64 {
        let [rw, r, tu, hu, tl, hl, l, kw] = *p;
        let log_ratio = (r / rw).ln();
        2.0 * PI * tu * (hu - hl)
            / (log_ratio * (1.0 + 2.0 * l * tu / (log_ratio * rw * rw * kw) + tu / tl))
    }
}

impl Objective for Borehole {
    fn name(&self) -> String { "borehole".to_string() }
    fn dim(&self) -> usize { 8 }

    fn domain(&self) -> Domain {
        let mut lower = vec![-1.0; 8];
        let mut upper = vec![1.0; 8];
        lower[0] = -3.0; upper[0] = 3.0;
        lower[1] = -3.0; upper[1] = 3.0;
        Domain { lower, upper }
    }

    fn eval(&self, z: &[f64]) -> f64 { Self::flow_rate(&Self::physical(z)) }

    fn eval_gradient(&self, z: &[f64]) -> Option<Vec<f64>> {
        Some(numerical::gradient(Self::FD_STEP, None, z, |z| self.eval(z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_maps() {
        let domain = Domain::new(vec![1.0, -2.0], vec![3.0, 2.0]).unwrap();
        assert_eq!(domain.volume(), 8.0);
        assert_eq!(domain.to_unit(&[2.0, 0.0]), vec![0.5, 0.5]);
        assert_eq!(domain.from_unit(&[1.0, 0.0]), vec![3.0, -2.0]);
        assert_eq!(domain.to_normalized(&[3.0, -2.0]), vec![1.0, -1.0]);
        assert_eq!(domain.from_normalized(&[0.0, 0.5]), vec![2.0, 1.0]);
        assert!(Domain::new(vec![0.0], vec![0.0]).is_err());
    }

    #[test]
    fn sin_integral_matches_one_dimensional_formula() {
        let f = SinExp::new(1, 0.0);
        // ∫_0^1 sin(x) dx
        assert_close!(abs=1e-15, f.true_integral().unwrap(), 1.0 - 1f64.cos());
    }

    #[test]
    fn sin_integral_against_quadrature() {
        let f = SinExp::new(2, 0.5);
        let rule = asgrid_linalg::GaussRule::legendre(12).unwrap().reseat(0.0, 1.0);
        let mut total = 0.0;
        for (&x, &wx) in rule.nodes.iter().zip(&rule.weights) {
            for (&y, &wy) in rule.nodes.iter().zip(&rule.weights) {
                total += wx * wy * f.eval(&[x, y]);
            }
        }
        assert_close!(abs=1e-12, f.true_integral().unwrap(), total);
    }

    #[test]
    fn catalog() {
        let f = by_name("sin5Dexp0.1").unwrap();
        assert_eq!(f.dim(), 5);
        assert_eq!(f.name(), "sin5Dexp0.1");
        assert_eq!(by_name("exp3D").unwrap().dim(), 3);
        assert_eq!(by_name("const2D").unwrap().eval(&[0.3, 0.4]), 1.0);
        assert_eq!(by_name("borehole").unwrap().dim(), 8);
        for bad in &["sinDexp0.1", "sin5Dexpx", "exp0D", "SingleDiode"] {
            let err = by_name(bad).err().unwrap();
            assert!(err.downcast_ref::<ConfigurationError>().is_some(), "{}", bad);
        }
    }

    #[test]
    fn exp_integral() {
        let f = by_name("exp2D").unwrap();
        let expected = (2.0 * (0.5f64.exp() - 1.0)).powi(2);
        assert_close!(abs=1e-15, f.true_integral().unwrap(), expected);
    }

    #[test]
    fn views_rescale_gradients() {
        let domain = Domain::new(vec![0.0, 0.0], vec![2.0, 4.0]).unwrap();
        let f = FnObjective::new("plane", domain, |x| x[0] + 3.0 * x[1])
            .with_gradient(|_| vec![1.0, 3.0])
            .with_integral(2.0 * 4.0 * (1.0 + 6.0));
        let unit = UnitCubeView::new(&f);
        assert_eq!(unit.eval(&[0.5, 0.5]), 7.0);
        assert_eq!(unit.eval_gradient(&[0.1, 0.2]).unwrap(), vec![2.0, 12.0]);
        assert_eq!(unit.true_integral(), Some(7.0));

        let normalized = NormalizedView::new(&f);
        assert_eq!(normalized.eval(&[0.0, 0.0]), 7.0);
        assert_eq!(normalized.eval_gradient(&[0.0, 0.0]).unwrap(), vec![1.0, 6.0]);
        assert_eq!(normalized.true_integral(), Some(4.0 * 7.0));
    }

    #[test]
    fn borehole_at_nominal_point() {
        let f = Borehole;
        let z = [0.0; 8];
        let value = f.eval(&z);
        assert!(value.is_finite() && value > 0.0);
        let grad = f.eval_gradient(&z).unwrap();
        // flow increases with the well radius and with the upper head
        assert!(grad[0] > 0.0);
        assert!(grad[3] > 0.0);
        assert!(grad[5] < 0.0);
    }
}
