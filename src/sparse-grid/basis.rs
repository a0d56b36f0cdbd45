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

//! One-dimensional hierarchical basis functions.
//!
//! Every basis is built from the centred cardinal B-spline `B_p` of odd
//! degree `p` (`p = 1` gives the hat function). The function of level `l`
//! and index `i` is `B_p(x / h - i)` with `h = 2^-l`; level 0 only exists on
//! boundary grids and holds the indices 0 and 1 with `h = 1`.

use crate::ConfigurationError;
use asgrid_linalg::GaussRule;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// Highest supported spline degree.
pub const MAX_DEGREE: u32 = 7;

#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GridType {
    /// Hats without boundary points.
    Linear,
    /// Hats, plus level-0 functions centred on the boundary.
    LinearBoundary,
    /// Hats whose boundary-adjacent members extrapolate linearly;
    /// level 1 is the constant function.
    ModLinear,
    /// B-splines without boundary points.
    Bspline,
    /// B-splines with level-0 boundary functions.
    BsplineBoundary,
    /// B-splines, modified at the boundary like `ModLinear`.
    ModBspline,
}

impl GridType {
    pub const ALL: &'static [GridType] = &[
        GridType::Linear, GridType::LinearBoundary, GridType::ModLinear,
        GridType::Bspline, GridType::BsplineBoundary, GridType::ModBspline,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GridType::Linear => "linear",
            GridType::LinearBoundary => "linearBoundary",
            GridType::ModLinear => "modlinear",
            GridType::Bspline => "bspline",
            GridType::BsplineBoundary => "bsplineBoundary",
            GridType::ModBspline => "modBspline",
        }
    }

    pub fn has_boundary(self) -> bool {
        match self {
            GridType::LinearBoundary | GridType::BsplineBoundary => true,
            _ => false,
        }
    }

    /// Other accepted spellings, as the grid type names of SG++.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            GridType::ModBspline => &["nakbsplinemodified"],
            _ => &[],
        }
    }

    pub fn is_modified(self) -> bool {
        match self {
            GridType::ModLinear | GridType::ModBspline => true,
            _ => false,
        }
    }

    pub fn is_bspline(self) -> bool {
        match self {
            GridType::Bspline | GridType::BsplineBoundary | GridType::ModBspline => true,
            _ => false,
        }
    }

    /// The degree actually used for a requested degree.
    ///
    /// Hat types ignore the request. B-spline types require an odd degree
    /// no larger than `MAX_DEGREE`.
    pub fn effective_degree(self, requested: u32) -> Result<u32, ConfigurationError> {
        if !self.is_bspline() {
            return Ok(1);
        }
        if requested % 2 == 0 || requested > MAX_DEGREE {
            return Err(ConfigurationError(format!(
                "grid type '{}' needs an odd degree between 1 and {}, got {}",
                self, MAX_DEGREE, requested,
            )));
        }
        Ok(requested)
    }

    /// The boundary grid type with the same family of basis functions.
    pub fn with_boundary(self) -> GridType {
        match self.is_bspline() {
            true => GridType::BsplineBoundary,
            false => GridType::LinearBoundary,
        }
    }
}

impl fmt::Display for GridType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GridType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GridType::ALL.iter().cloned()
            .find(|ty| ty.name() == s || ty.aliases().contains(&s))
            .ok_or_else(|| {
                let names: Vec<_> = GridType::ALL.iter().map(|ty| ty.name()).collect();
                ConfigurationError(format!(
                    "unsupported grid type '{}' (expected one of: {})", s, names.join(", "),
                ))
            })
    }
}

impl TryFrom<String> for GridType {
    type Error = ConfigurationError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<GridType> for String {
    fn from(ty: GridType) -> String { ty.name().to_string() }
}

/// A single 1D basis function.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Basis1d {
    pub grid_type: GridType,
    pub degree: u32,
    pub level: u32,
    pub index: u32,
}

impl Basis1d {
    fn h(&self) -> f64 {
        match self.level {
            0 => 1.0,
            l => 0.5f64.powi(l as i32),
        }
    }

    fn half_width(&self) -> f64 { (self.degree as f64 + 1.0) / 2.0 }

    fn is_constant(&self) -> bool { self.grid_type.is_modified() && self.level == 1 }

    fn last_index(&self) -> u32 { (1u32 << self.level) - 1 }

    fn is_left_modified(&self) -> bool {
        self.grid_type.is_modified() && self.level > 1 && self.index == 1
    }

    fn is_right_modified(&self) -> bool {
        self.grid_type.is_modified() && self.level > 1 && self.index == self.last_index()
    }

    pub fn eval(&self, x: f64) -> f64 {
        if self.is_constant() {
            return 1.0;
        }
        let h = self.h();
        if self.is_left_modified() {
            return self.modified_left(x / h);
        }
        if self.is_right_modified() {
            return self.modified_left((1.0 - x) / h);
        }
        cardinal_bspline(self.degree, x / h - self.index as f64)
    }

    pub fn deriv(&self, x: f64) -> f64 {
        if self.is_constant() {
            return 0.0;
        }
        let h = self.h();
        if self.is_left_modified() {
            return self.modified_left_deriv(x / h) / h;
        }
        if self.is_right_modified() {
            return -self.modified_left_deriv((1.0 - x) / h) / h;
        }
        cardinal_bspline_deriv(self.degree, x / h - self.index as f64) / h
    }

    // sum_{k=0}^{(p+1)/2} (k+1) B_p(t - 1 + k), with t = x / h
    fn modified_left(&self, t: f64) -> f64 {
        let m = (self.degree + 1) / 2;
        (0..=m)
            .map(|k| (k + 1) as f64 * cardinal_bspline(self.degree, t - 1.0 + k as f64))
            .sum()
    }

    fn modified_left_deriv(&self, t: f64) -> f64 {
        let m = (self.degree + 1) / 2;
        (0..=m)
            .map(|k| (k + 1) as f64 * cardinal_bspline_deriv(self.degree, t - 1.0 + k as f64))
            .sum()
    }

    /// Support of the function, clipped to `[0, 1]`.
    pub fn support(&self) -> (f64, f64) {
        if self.is_constant() {
            return (0.0, 1.0);
        }
        let h = self.h();
        let center = self.index as f64 * h;
        let (lo, hi) = (center - self.half_width() * h, center + self.half_width() * h);
        if self.is_left_modified() {
            (0.0, hi.min(1.0))
        } else if self.is_right_modified() {
            (lo.max(0.0), 1.0)
        } else {
            (lo.max(0.0), hi.min(1.0))
        }
    }

    /// Polynomial pieces of the function inside `[0, 1]`.
    ///
    /// All knots lie on multiples of `h`.
    pub fn breakpoints(&self) -> Vec<f64> {
        let (lo, hi) = self.support();
        let h = self.h();
        let first = (lo / h).floor() as i64;
        let last = (hi / h).ceil() as i64;
        (first..=last)
            .map(|k| (k as f64 * h).max(lo).min(hi))
            .collect()
    }

    /// `∫_0^1 φ(x) dx`, exact for the piecewise polynomial.
    pub fn integral(&self) -> f64 {
        if self.is_constant() {
            return 1.0;
        }
        let order = (self.degree as usize + 1) / 2 + 1;
        let rule = GaussRule::legendre(order).expect("(BUG) order is positive");
        rule.piecewise(&self.breakpoints()).integrate(|x| self.eval(x))
    }
}

/// Centred cardinal B-spline of degree `p`, supported on `(-(p+1)/2, (p+1)/2)`.
pub fn cardinal_bspline(p: u32, t: f64) -> f64 {
    let shifted = t + (p as f64 + 1.0) / 2.0;
    if !(shifted > 0.0 && shifted < p as f64 + 1.0) {
        return 0.0;
    }
    uniform_bspline(p as usize, shifted)
}

pub fn cardinal_bspline_deriv(p: u32, t: f64) -> f64 {
    if p == 0 {
        return 0.0;
    }
    let shifted = t + (p as f64 + 1.0) / 2.0;
    if !(shifted > 0.0 && shifted < p as f64 + 1.0) {
        return 0.0;
    }
    let p = p as usize;
    uniform_bspline(p - 1, shifted) - uniform_bspline(p - 1, shifted - 1.0)
}

// N_p(t) on the integer knots 0, 1, ..., p + 1.
fn uniform_bspline(p: usize, t: f64) -> f64 {
    let mut vals = [0.0f64; MAX_DEGREE as usize + 2];
    for k in 0..=p {
        let s = t - k as f64;
        vals[k] = if s >= 0.0 && s < 1.0 { 1.0 } else { 0.0 };
    }
    // after stage q, vals[k] holds N_q(t - k)
    for q in 1..=p {
        for k in 0..=(p - q) {
            let s = t - k as f64;
            vals[k] = (s * vals[k] + (q as f64 + 1.0 - s) * vals[k + 1]) / q as f64;
        }
    }
    vals[0]
}
