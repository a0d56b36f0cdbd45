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

use crate::basis::{Basis1d, GridType};
use crate::{ConfigurationError, DimensionMismatchError, FailResult};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

/// First line of every grid descriptor.
pub const DESCRIPTOR_MAGIC: &str = "asgrid-grid 1";

/// Cap on regular levels considered when searching by budget.
const MAX_REGULAR_LEVEL: u32 = 30;

/// A hierarchical point, given by its level and index in each dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPoint {
    pub level: Vec<u32>,
    pub index: Vec<u32>,
}

impl GridPoint {
    pub fn dim(&self) -> usize { self.level.len() }

    pub fn coord(&self, k: usize) -> f64 {
        match self.level[k] {
            0 => self.index[k] as f64,
            l => self.index[k] as f64 * 0.5f64.powi(l as i32),
        }
    }

    pub fn coords(&self) -> Vec<f64> {
        (0..self.dim()).map(|k| self.coord(k)).collect()
    }

    fn with(&self, k: usize, level: u32, index: u32) -> GridPoint {
        let mut out = self.clone();
        out.level[k] = level;
        out.index[k] = index;
        out
    }

    /// Hierarchical parents along dimension `k`.
    fn parents_in(&self, k: usize, boundary: bool) -> Vec<GridPoint> {
        match self.level[k] {
            0 => vec![],
            1 => match boundary {
                true => vec![self.with(k, 0, 0), self.with(k, 0, 1)],
                false => vec![],
            },
            l => vec![self.with(k, l - 1, (self.index[k] >> 1) | 1)],
        }
    }

    /// Hierarchical children along dimension `k`.
    fn children_in(&self, k: usize) -> Vec<GridPoint> {
        match self.level[k] {
            0 => vec![self.with(k, 1, 1)],
            l => {
                let i = self.index[k];
                vec![self.with(k, l + 1, 2 * i - 1), self.with(k, l + 1, 2 * i + 1)]
            },
        }
    }
}

/// A set of hierarchical points with a basis attached.
///
/// Point order is insertion order, and coefficient vectors elsewhere in the
/// crate are indexed the same way.
#[derive(Debug, Clone)]
pub struct Grid {
    grid_type: GridType,
    degree: u32,
    dim: usize,
    points: Vec<GridPoint>,
    lookup: HashMap<GridPoint, usize>,
}

impl Grid {
    pub fn new(grid_type: GridType, degree: u32, dim: usize) -> FailResult<Grid> {
        if dim == 0 {
            throw!(ConfigurationError("a sparse grid needs at least one dimension".into()));
        }
        let degree = grid_type.effective_degree(degree)?;
        Ok(Grid { grid_type, degree, dim, points: vec![], lookup: HashMap::new() })
    }

    /// Regular sparse grid of the given level (level 1 is a single point
    /// for non-boundary types).
    pub fn regular(grid_type: GridType, degree: u32, dim: usize, level: u32) -> FailResult<Grid> {
        let mut grid = Grid::new(grid_type, degree, dim)?;
        if level == 0 {
            throw!(ConfigurationError("regular grids start at level 1".into()));
        }
        for levels in regular_levels(grid_type, dim, level) {
            for point in points_of_level(&levels) {
                grid.insert(point);
            }
        }
        Ok(grid)
    }

    pub fn grid_type(&self) -> GridType { self.grid_type }
    pub fn degree(&self) -> u32 { self.degree }
    pub fn dim(&self) -> usize { self.dim }
    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }
    pub fn points(&self) -> &[GridPoint] { &self.points }
    pub fn point(&self, i: usize) -> &GridPoint { &self.points[i] }
    pub fn contains(&self, point: &GridPoint) -> bool { self.lookup.contains_key(point) }
    pub fn index_of(&self, point: &GridPoint) -> Option<usize> { self.lookup.get(point).cloned() }

    pub fn coordinates(&self) -> Vec<Vec<f64>> {
        self.points.iter().map(|p| p.coords()).collect()
    }

    /// Returns `false` if the point was already present.
    pub fn insert(&mut self, point: GridPoint) -> bool {
        debug_assert_eq!(point.dim(), self.dim);
        if self.lookup.contains_key(&point) {
            return false;
        }
        self.lookup.insert(point.clone(), self.points.len());
        self.points.push(point);
        true
    }

    /// Ancestors of `point` that are not yet in the grid, each listed after
    /// its own ancestors.
    pub fn missing_ancestors(&self, point: &GridPoint) -> Vec<GridPoint> {
        let mut seen = HashSet::new();
        let mut out = vec![];
        self.collect_missing_ancestors(point, &mut seen, &mut out);
        out
    }

    fn collect_missing_ancestors(
        &self,
        point: &GridPoint,
        seen: &mut HashSet<GridPoint>,
        out: &mut Vec<GridPoint>,
    ) {
        let boundary = self.grid_type.has_boundary();
        for k in 0..self.dim {
            for parent in point.parents_in(k, boundary) {
                if self.contains(&parent) || seen.contains(&parent) {
                    continue;
                }
                self.collect_missing_ancestors(&parent, seen, out);
                seen.insert(parent.clone());
                out.push(parent);
            }
        }
    }

    /// Children of `point` (in every dimension) that are not in the grid.
    pub fn missing_children(&self, point: &GridPoint) -> Vec<GridPoint> {
        let mut out: Vec<GridPoint> = vec![];
        for k in 0..self.dim {
            for child in point.children_in(k) {
                if !self.contains(&child) && !out.contains(&child) {
                    out.push(child);
                }
            }
        }
        out
    }

    fn basis_1d(&self, point: &GridPoint, k: usize) -> Basis1d {
        Basis1d {
            grid_type: self.grid_type,
            degree: self.degree,
            level: point.level[k],
            index: point.index[k],
        }
    }

    pub fn basis_value(&self, i: usize, x: &[f64]) -> f64 {
        let point = &self.points[i];
        let mut value = 1.0;
        for k in 0..self.dim {
            value *= self.basis_1d(point, k).eval(x[k]);
            if value == 0.0 {
                return 0.0;
            }
        }
        value
    }

    /// Writes the gradient of basis function `i` at `x` into `out`.
    pub fn basis_gradient(&self, i: usize, x: &[f64], out: &mut [f64]) {
        let point = &self.points[i];
        let values: Vec<f64> = (0..self.dim).map(|k| self.basis_1d(point, k).eval(x[k])).collect();
        for j in 0..self.dim {
            let mut partial = self.basis_1d(point, j).deriv(x[j]);
            for k in (0..self.dim).filter(|&k| k != j) {
                partial *= values[k];
            }
            out[j] = partial;
        }
    }

    /// `∫_{[0,1]^d} φ_i`.
    pub fn basis_integral(&self, i: usize) -> f64 {
        let point = &self.points[i];
        (0..self.dim).map(|k| self.basis_1d(point, k).integral()).product()
    }

    /// Nonzero basis values at `x`, as `(index, value)` pairs.
    pub fn sparse_row(&self, x: &[f64]) -> Vec<(usize, f64)> {
        (0..self.len())
            .map(|i| (i, self.basis_value(i, x)))
            .filter(|&(_, v)| v != 0.0)
            .collect()
    }

    /// Every knot of the basis in dimension `k`: the multiples of the
    /// finest spacing present.
    pub fn breakpoints(&self, k: usize) -> Vec<f64> {
        let finest = self.points.iter().map(|p| p.level[k]).max().unwrap_or(0);
        let n = 1u64 << finest;
        (0..=n).map(|j| j as f64 / n as f64).collect()
    }

    pub fn check_point_dim(&self, x: &[f64]) -> FailResult<()> {
        if x.len() != self.dim {
            throw!(DimensionMismatchError { expected: self.dim, actual: x.len() });
        }
        Ok(())
    }

    /// Plain-text description of the grid.
    ///
    /// ```text
    /// asgrid-grid 1
    /// type modBspline
    /// degree 3
    /// dim 2
    /// points 1
    /// 1 1 1 1
    /// ```
    ///
    /// Each point line holds `level index` pairs, one per dimension.
    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        // writing to a String cannot fail
        let _ = writeln!(out, "{}", DESCRIPTOR_MAGIC);
        let _ = writeln!(out, "type {}", self.grid_type);
        let _ = writeln!(out, "degree {}", self.degree);
        let _ = writeln!(out, "dim {}", self.dim);
        let _ = writeln!(out, "points {}", self.len());
        for point in &self.points {
            let fields: Vec<String> = point.level.iter().zip(&point.index)
                .map(|(l, i)| format!("{} {}", l, i))
                .collect();
            let _ = writeln!(out, "{}", fields.join(" "));
        }
        out
    }

    pub fn from_descriptor(text: &str) -> FailResult<Grid> {
        let bad = |msg: String| ConfigurationError(format!("malformed grid descriptor: {}", msg));

        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
        match lines.next() {
            Some(DESCRIPTOR_MAGIC) => {},
            other => throw!(bad(format!("expected '{}', found {:?}", DESCRIPTOR_MAGIC, other))),
        }

        let mut header = |key: &str| -> Result<String, ConfigurationError> {
            let line = lines.next().ok_or_else(|| bad(format!("missing '{}' line", key)))?;
            let mut words = line.splitn(2, ' ');
            match (words.next(), words.next()) {
                (Some(k), Some(value)) if k == key => Ok(value.trim().to_string()),
                _ => Err(bad(format!("expected '{} <value>', found '{}'", key, line))),
            }
        };
        let grid_type: GridType = header("type")?.parse()?;
        let degree: u32 = header("degree")?.parse().map_err(|e| bad(format!("degree: {}", e)))?;
        let dim: usize = header("dim")?.parse().map_err(|e| bad(format!("dim: {}", e)))?;
        let count: usize = header("points")?.parse().map_err(|e| bad(format!("points: {}", e)))?;

        let mut grid = Grid::new(grid_type, degree, dim)?;
        for (n, line) in lines.enumerate() {
            let numbers = line.split_whitespace()
                .map(|word| word.parse::<u32>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| bad(format!("point {}: {}", n, e)))?;
            if numbers.len() != 2 * dim {
                throw!(bad(format!("point {} has {} fields, expected {}", n, numbers.len(), 2 * dim)));
            }
            let point = GridPoint {
                level: numbers.iter().step_by(2).cloned().collect(),
                index: numbers.iter().skip(1).step_by(2).cloned().collect(),
            };
            validate_point(grid_type, &point).map_err(|msg| bad(format!("point {}: {}", n, msg)))?;
            if !grid.insert(point) {
                throw!(bad(format!("point {} is a duplicate", n)));
            }
        }
        if grid.len() != count {
            throw!(bad(format!("header announces {} points, found {}", count, grid.len())));
        }
        Ok(grid)
    }
}

fn validate_point(grid_type: GridType, point: &GridPoint) -> Result<(), String> {
    for (&l, &i) in point.level.iter().zip(&point.index) {
        let ok = match l {
            0 => grid_type.has_boundary() && i <= 1,
            l if l >= 31 => false,
            l => i % 2 == 1 && i < (1u32 << l),
        };
        if !ok {
            return Err(format!("invalid level/index pair ({}, {})", l, i));
        }
    }
    Ok(())
}

/// Level vectors making up the regular grid of level `n`.
///
/// Without boundary: `|l|_1 <= n + d - 1` with every `l_k >= 1`.
/// With boundary: `sum(max(l_k, 1)) <= n + d - 1` with every `l_k >= 0`.
fn regular_levels(grid_type: GridType, dim: usize, n: u32) -> Vec<Vec<u32>> {
    fn recurse(dim: usize, budget: u32, min_level: u32, prefix: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
        if prefix.len() == dim {
            out.push(prefix.clone());
            return;
        }
        // every remaining dimension costs at least one
        let remaining = (dim - prefix.len() - 1) as u32;
        if budget < 1 + remaining {
            return;
        }
        for level in min_level..=(budget - remaining) {
            prefix.push(level);
            recurse(dim, budget - level.max(1), min_level, prefix, out);
            prefix.pop();
        }
    }
    let min_level = if grid_type.has_boundary() { 0 } else { 1 };
    let mut out = vec![];
    recurse(dim, n + dim as u32 - 1, min_level, &mut vec![], &mut out);
    out
}

fn indices_of_level(level: u32) -> Vec<u32> {
    match level {
        0 => vec![0, 1],
        l => (1..(1u32 << l)).step_by(2).collect(),
    }
}

fn points_of_level(levels: &[u32]) -> Vec<GridPoint> {
    use itertools::Itertools;

    levels.iter()
        .map(|&l| indices_of_level(l))
        .multi_cartesian_product()
        .map(|index| GridPoint { level: levels.to_vec(), index })
        .collect()
}

/// Number of points in a regular grid, without building it.
pub fn regular_point_count(grid_type: GridType, dim: usize, level: u32) -> usize {
    regular_levels(grid_type, dim, level).iter()
        .map(|levels| levels.iter().map(|&l| indices_of_level_count(l)).product::<usize>())
        .sum()
}

fn indices_of_level_count(level: u32) -> usize {
    match level {
        0 => 2,
        l => 1usize << (l - 1),
    }
}

/// The largest regular level whose point count stays within `budget`.
///
/// Returns `None` when even level 1 is too large.
pub fn regular_level_for_budget(grid_type: GridType, dim: usize, budget: usize) -> Option<u32> {
    let mut best = None;
    for level in 1..=MAX_REGULAR_LEVEL {
        if regular_point_count(grid_type, dim, level) > budget {
            break;
        }
        best = Some(level);
    }
    best
}
