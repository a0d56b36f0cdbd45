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

//! Bounds of the reduced coordinate `y = W1ᵀx` over a box.
//!
//! Two procedures are kept, and they are not interchangeable:
//!
//! * [`hull_bounds`] (classical method) gives the exact convex hull of the
//!   projection of `[-1,1]^d`.
//! * [`sample_bounds`] and [`grid_bounds`] (sparse-grid method) take the
//!   component-wise min and max over projected samples. For `n = 1` this
//!   is the exact interval; for `n >= 2` it is only the bounding box.

use crate::FailResult;
use itertools::Itertools;
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::cmp::Ordering;

/// Above this dimension the unit cube has too many vertices to enumerate.
const MAX_ENUMERATED_DIM: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum ReducedBounds {
    /// One reduced dimension.
    Interval { lower: f64, upper: f64 },
    /// Component-wise bounds only.
    Box { lower: Vec<f64>, upper: Vec<f64> },
    /// A convex polygon (counter-clockwise vertices) and its bounding box.
    Polytope { vertices: Vec<[f64; 2]>, lower: Vec<f64>, upper: Vec<f64> },
}

impl ReducedBounds {
    pub fn interval(&self) -> Option<(f64, f64)> {
        match *self {
            ReducedBounds::Interval { lower, upper } => Some((lower, upper)),
            _ => None,
        }
    }

    pub fn lower(&self) -> Vec<f64> {
        match self {
            ReducedBounds::Interval { lower, .. } => vec![*lower],
            ReducedBounds::Box { lower, .. } => lower.clone(),
            ReducedBounds::Polytope { lower, .. } => lower.clone(),
        }
    }

    pub fn upper(&self) -> Vec<f64> {
        match self {
            ReducedBounds::Interval { upper, .. } => vec![*upper],
            ReducedBounds::Box { upper, .. } => upper.clone(),
            ReducedBounds::Polytope { upper, .. } => upper.clone(),
        }
    }

    /// Whether `y` lies inside, up to `tol`.
    pub fn contains(&self, y: &[f64], tol: f64) -> bool {
        let in_box = self.lower().iter().zip(self.upper()).zip(y)
            .all(|((&lo, hi), &y)| lo - tol <= y && y <= hi + tol);
        match self {
            ReducedBounds::Polytope { vertices, .. } if in_box => {
                // left of (or on) every counter-clockwise edge
                vertices.iter().zip(vertices.iter().cycle().skip(1))
                    .all(|(a, b)| cross(*a, *b, [y[0], y[1]]) >= -tol * edge_len(*a, *b))
            },
            _ => in_box,
        }
    }
}

/// Exact projection of `[-1,1]^d` through the columns of `w1`.
pub fn hull_bounds(w1: ArrayView2<'_, f64>) -> ReducedBounds {
    let radius: Vec<f64> = w1.columns().into_iter()
        .map(|col| col.iter().map(|w| w.abs()).sum())
        .collect();
    let lower: Vec<f64> = radius.iter().map(|r| -r).collect();
    match w1.ncols() {
        1 => ReducedBounds::Interval { lower: lower[0], upper: radius[0] },
        2 => {
            let generators: Vec<[f64; 2]> = w1.rows().into_iter().map(|r| [r[0], r[1]]).collect();
            let vertices = convex_hull(zonotope_walk(&generators));
            ReducedBounds::Polytope { vertices, lower, upper: radius }
        },
        _ => ReducedBounds::Box { lower, upper: radius },
    }
}

/// Component-wise min/max of the projected rows of `samples`.
pub fn sample_bounds(w1: ArrayView2<'_, f64>, samples: ArrayView2<'_, f64>) -> FailResult<ReducedBounds> {
    ensure!(samples.nrows() > 0, "cannot bound an empty sample set");
    ensure!(samples.ncols() == w1.nrows(), "samples have dimension {}, W1 has {} rows", samples.ncols(), w1.nrows());
    let projected = samples.dot(&w1);
    let lower: Vec<f64> = projected.columns().into_iter()
        .map(|c| c.iter().cloned().fold(f64::INFINITY, f64::min))
        .collect();
    let upper: Vec<f64> = projected.columns().into_iter()
        .map(|c| c.iter().cloned().fold(f64::NEG_INFINITY, f64::max))
        .collect();
    Ok(match w1.ncols() {
        1 => ReducedBounds::Interval { lower: lower[0], upper: upper[0] },
        _ => ReducedBounds::Box { lower, upper },
    })
}

/// [`sample_bounds`] over the `2^d` vertices of `[0,1]^d`.
pub fn grid_bounds(w1: ArrayView2<'_, f64>) -> FailResult<ReducedBounds> {
    let dim = w1.nrows();
    if dim <= MAX_ENUMERATED_DIM {
        return sample_bounds(w1, unit_cube_vertices(dim).view());
    }
    // the same extremes, without the enumeration
    let lower = w1.columns().into_iter().map(|c| c.iter().map(|&w| w.min(0.0)).sum()).collect_vec();
    let upper = w1.columns().into_iter().map(|c| c.iter().map(|&w| w.max(0.0)).sum()).collect_vec();
    Ok(match w1.ncols() {
        1 => ReducedBounds::Interval { lower: lower[0], upper: upper[0] },
        _ => ReducedBounds::Box { lower, upper },
    })
}

pub fn unit_cube_vertices(dim: usize) -> Array2<f64> {
    Array2::from_shape_fn((1 << dim, dim), |(i, k)| ((i >> k) & 1) as f64)
}

/// `y = W1ᵀ x` for a single point.
pub fn project(w1: ArrayView2<'_, f64>, x: &[f64]) -> Vec<f64> {
    w1.t().dot(&ArrayView1::from(x)).to_vec()
}

fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn edge_len(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt().max(1.0)
}

// Boundary of the zonotope Σ [-1,1] g_i: sort the generators by angle and
// walk around once.
fn zonotope_walk(generators: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut gens: Vec<[f64; 2]> = generators.iter()
        .filter(|g| g[0] != 0.0 || g[1] != 0.0)
        .map(|&g| match g[1] < 0.0 || (g[1] == 0.0 && g[0] < 0.0) {
            true => [-g[0], -g[1]],
            false => g,
        })
        .collect();
    if gens.is_empty() {
        return vec![[0.0, 0.0]];
    }
    gens.sort_by(|a, b| {
        a[1].atan2(a[0]).partial_cmp(&b[1].atan2(b[0])).unwrap_or(Ordering::Equal)
    });
    let mut point = [
        -gens.iter().map(|g| g[0]).sum::<f64>(),
        -gens.iter().map(|g| g[1]).sum::<f64>(),
    ];
    let mut out = vec![point];
    for sign in &[2.0, -2.0] {
        for g in &gens {
            point = [point[0] + sign * g[0], point[1] + sign * g[1]];
            out.push(point);
        }
    }
    out
}

/// Andrew's monotone chain. Returns counter-clockwise vertices without
/// collinear points.
pub fn convex_hull(mut points: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    points.sort_by(|a, b| {
        a[0].partial_cmp(&b[0]).unwrap_or(Ordering::Equal)
            .then(a[1].partial_cmp(&b[1]).unwrap_or(Ordering::Equal))
    });
    points.dedup();
    if points.len() < 3 {
        return points;
    }
    let mut lower: Vec<[f64; 2]> = vec![];
    for &p in &points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<[f64; 2]> = vec![];
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{cell_rng, uniform};
    use ndarray::{arr2, Array2};

    #[test]
    fn classical_interval() {
        let w1 = arr2(&[[0.6], [-0.8], [0.0]]);
        assert_eq!(hull_bounds(w1.view()), ReducedBounds::Interval { lower: -1.4, upper: 1.4 });
    }

    #[test]
    fn grid_interval_in_one_dimension_is_exact() {
        let w1 = arr2(&[[0.6], [-0.8], [0.0]]);
        let bounds = grid_bounds(w1.view()).unwrap();
        let (lo, hi) = bounds.interval().unwrap();
        assert_close!(abs=1e-15, lo, -0.8);
        assert_close!(abs=1e-15, hi, 0.6);
    }

    #[test]
    fn projections_lie_within_bounds() {
        let w1 = arr2(&[[0.5, 0.1], [0.5, -0.7], [0.5, 0.7], [0.5, 0.0]]);
        let classical = hull_bounds(w1.view());
        let grid = grid_bounds(w1.view()).unwrap();
        let symmetric = uniform(&mut cell_rng(5, 0), 500, 4, -1.0, 1.0);
        let unit = uniform(&mut cell_rng(5, 1), 500, 4, 0.0, 1.0);
        for (z, u) in symmetric.outer_iter().zip(unit.outer_iter()) {
            assert!(classical.contains(&project(w1.view(), &z.to_vec()), 1e-12));
            assert!(grid.contains(&project(w1.view(), &u.to_vec()), 1e-12));
        }
    }

    #[test]
    fn hull_of_a_square_projection() {
        // identity in 2D: the hull is the square itself
        let w1 = Array2::<f64>::eye(2);
        match hull_bounds(w1.view()) {
            ReducedBounds::Polytope { vertices, .. } => {
                assert_eq!(vertices.len(), 4);
                for v in &vertices {
                    assert_eq!(v[0].abs(), 1.0);
                    assert_eq!(v[1].abs(), 1.0);
                }
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn hull_is_tighter_than_the_box() {
        let s = 0.5f64.sqrt();
        let w1 = arr2(&[[s, s], [s, -s]]);
        let bounds = hull_bounds(w1.view());
        // (√2, √2) is a corner of the box but not of the rotated square
        assert!(!bounds.contains(&[1.4, 1.4], 1e-12));
        assert!(bounds.contains(&[2f64.sqrt() - 1e-9, 0.0], 1e-12));
    }

    #[test]
    fn monotone_chain() {
        let hull = convex_hull(vec![[0.0, 0.0], [1.0, 0.0], [0.5, 0.5], [1.0, 1.0], [0.0, 1.0], [0.5, 0.0]]);
        assert_eq!(hull, vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    }
}
