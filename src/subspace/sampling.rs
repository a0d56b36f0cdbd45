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

//! Point sets: pseudo-random, quasi-random, and cached datasets.

use crate::objective::{Borehole, Objective, UnitCubeView};
use crate::{DimensionMismatchError, FailResult};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

/// Points (one per row) and the values observed at them.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    points: Array2<f64>,
    values: Array1<f64>,
}

impl SampleSet {
    pub fn new(points: Array2<f64>, values: Array1<f64>) -> FailResult<Self> {
        if points.nrows() != values.len() {
            throw!(DimensionMismatchError { expected: points.nrows(), actual: values.len() });
        }
        Ok(SampleSet { points, values })
    }

    /// Evaluate `objective` at each row of `points`.
    pub fn evaluate(objective: &dyn Objective, points: Array2<f64>) -> FailResult<Self> {
        if points.ncols() != objective.dim() {
            throw!(DimensionMismatchError { expected: objective.dim(), actual: points.ncols() });
        }
        let values = objective.eval_many(points.view());
        SampleSet::new(points, values)
    }

    pub fn points(&self) -> ArrayView2<'_, f64> { self.points.view() }
    pub fn values(&self) -> ArrayView1<'_, f64> { self.values.view() }
    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
    pub fn dim(&self) -> usize { self.points.ncols() }

    /// Order-preserving split into `(training, validation)` at the given row.
    pub fn split_at(&self, index: usize) -> (SampleSet, SampleSet) {
        let index = index.min(self.len());
        let training = SampleSet {
            points: self.points.slice(s![..index, ..]).to_owned(),
            values: self.values.slice(s![..index]).to_owned(),
        };
        let validation = SampleSet {
            points: self.points.slice(s![index.., ..]).to_owned(),
            values: self.values.slice(s![index..]).to_owned(),
        };
        (training, validation)
    }

    /// The usual 80/20 split, at row `N * 8 / 10`.
    pub fn split(&self) -> (SampleSet, SampleSet) {
        self.split_at(self.len() * 8 / 10)
    }

    /// Apply `f` to every point, keeping the values.
    pub fn map_points(&self, mut f: impl FnMut(&[f64]) -> Vec<f64>) -> SampleSet {
        let rows: Vec<Vec<f64>> = self.points.outer_iter().map(|row| f(&row.to_vec())).collect();
        let dim = rows.first().map_or(self.dim(), |r| r.len());
        let points = Array2::from_shape_fn((rows.len(), dim), |(i, k)| rows[i][k]);
        SampleSet { points, values: self.values.clone() }
    }
}

/// Uniform points in `[lower, upper]^dim`.
pub fn uniform(rng: &mut impl Rng, n: usize, dim: usize, lower: f64, upper: f64) -> Array2<f64> {
    Array2::from_shape_fn((n, dim), |_| rng.gen_range(lower..upper))
}

fn standard_normal(rng: &mut impl Rng) -> f64 {
    // Box-Muller; 1 - u keeps the logarithm finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Standard normal draws outside `±cutoff` are redrawn.
fn truncated_normal(rng: &mut impl Rng, cutoff: f64) -> f64 {
    loop {
        let z = standard_normal(rng);
        if z.abs() <= cutoff {
            return z;
        }
    }
}

/// Points following the borehole input distribution, in the coordinates of
/// [`Borehole`]. The two normal inputs are truncated to its domain.
pub fn borehole(rng: &mut impl Rng, n: usize) -> Array2<f64> {
    let domain = Borehole.domain();
    Array2::from_shape_fn((n, 8), |(_, k)| match k {
        0 | 1 => truncated_normal(rng, domain.upper[k]),
        _ => rng.gen_range(-1.0..1.0),
    })
}

/// The first `dim` primes.
pub fn primes(dim: usize) -> Vec<u64> {
    let mut out: Vec<u64> = vec![];
    let mut candidate = 2;
    while out.len() < dim {
        if out.iter().take_while(|&&p| p * p <= candidate).all(|&p| candidate % p != 0) {
            out.push(candidate);
        }
        candidate += 1;
    }
    out
}

/// Van der Corput radical inverse of `index` in `base`.
pub fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let inv_base = 1.0 / base as f64;
    let mut factor = inv_base;
    let mut out = 0.0;
    while index > 0 {
        out += (index % base) as f64 * factor;
        index /= base;
        factor *= inv_base;
    }
    out
}

/// `n` Halton points in `[0,1]^dim`, starting at sequence index `skip`.
///
/// Index 0 is the origin.
pub fn halton(n: usize, dim: usize, skip: usize) -> Array2<f64> {
    let bases = primes(dim);
    Array2::from_shape_fn((n, dim), |(i, k)| radical_inverse((skip + i) as u64, bases[k]))
}

/// `n` evenly spaced values from `lower` to `upper` inclusive.
pub fn linspace(lower: f64, upper: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![lower],
        _ => (0..n).map(|i| lower + (upper - lower) * i as f64 / (n - 1) as f64).collect(),
    }
}

/// A seeded generator for one purpose within one sweep cell.
pub fn cell_rng(seed: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

//--------------------------------------------------------------------------------------

/// Datasets of uniform points in the unit cube, cached on disk by size.
///
/// Files are `data/dataPoints{N}.json` and `data/dataValues{N}.json` below
/// `root`. Points are in unit-cube coordinates; values are those of the
/// objective at the corresponding domain points.
#[derive(Debug, Clone)]
pub struct DatasetCache {
    root: PathBuf,
    seed: u64,
}

impl DatasetCache {
    pub fn new(root: impl AsRef<Path>, seed: u64) -> Self {
        DatasetCache { root: root.as_ref().to_owned(), seed }
    }

    pub fn points_path(&self, n: usize) -> PathBuf {
        self.root.join("data").join(format!("dataPoints{}.json", n))
    }

    pub fn values_path(&self, n: usize) -> PathBuf {
        self.root.join("data").join(format!("dataValues{}.json", n))
    }

    /// Load the dataset of size `n`, creating it first if necessary.
    pub fn load_or_create(&self, objective: &dyn Objective, n: usize) -> FailResult<SampleSet> {
        let (points_path, values_path) = (self.points_path(n), self.values_path(n));
        if points_path.exists() && values_path.exists() {
            debug!("loading cached dataset from {}", points_path.display());
            return self.load(objective.dim(), &points_path, &values_path);
        }

        info!("creating dataset of {} points in {}", n, self.root.join("data").display());
        // seeded by size alone, so concurrent writers produce identical files
        let mut rng = cell_rng(self.seed, n as u64);
        let points = uniform(&mut rng, n, objective.dim(), 0.0, 1.0);
        let samples = SampleSet::evaluate(&UnitCubeView::new(objective), points)?;

        asgrid_fs_util::create_dir_all(self.root.join("data"))?;
        let rows: Vec<Vec<f64>> = samples.points.outer_iter().map(|r| r.to_vec()).collect();
        asgrid_fs_util::write_atomic(&points_path, serde_json::to_string(&rows)?.as_bytes())?;
        asgrid_fs_util::write_atomic(&values_path, serde_json::to_string(&samples.values.to_vec())?.as_bytes())?;
        Ok(samples)
    }

    fn load(&self, dim: usize, points_path: &Path, values_path: &Path) -> FailResult<SampleSet> {
        let rows: Vec<Vec<f64>> = serde_json::from_reader(asgrid_fs_util::open(points_path)?)?;
        let values: Vec<f64> = serde_json::from_reader(asgrid_fs_util::open(values_path)?)?;
        for row in &rows {
            if row.len() != dim {
                throw!(DimensionMismatchError { expected: dim, actual: row.len() });
            }
        }
        let points = Array2::from_shape_fn((rows.len(), dim), |(i, k)| rows[i][k]);
        SampleSet::new(points, Array1::from(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::{by_name, FnObjective, Domain};

    #[test]
    fn halton_sequence() {
        let points = halton(4, 2, 0);
        assert_eq!(points.row(0).to_vec(), vec![0.0, 0.0]);
        assert_eq!(points.row(1).to_vec(), vec![0.5, 1.0 / 3.0]);
        assert_eq!(points.row(2).to_vec(), vec![0.25, 2.0 / 3.0]);
        assert_close!(abs=1e-15, points[(3, 0)], 0.75);
        assert_close!(abs=1e-15, points[(3, 1)], 1.0 / 9.0);
        assert_eq!(primes(6), vec![2, 3, 5, 7, 11, 13]);
        assert_eq!(halton(2, 2, 1).row(0).to_vec(), vec![0.5, 1.0 / 3.0]);
    }

    #[test]
    fn split_is_order_preserving_and_complete() {
        for &n in &[0, 1, 4, 5, 10, 37] {
            let points = Array2::from_shape_fn((n, 2), |(i, k)| (2 * i + k) as f64);
            let values = Array1::from_shape_fn(n, |i| i as f64);
            let set = SampleSet::new(points, values).unwrap();
            let (training, validation) = set.split();
            assert_eq!(training.len(), n * 8 / 10);
            assert_eq!(training.len() + validation.len(), n);
            let joined: Vec<f64> = training.values().iter().chain(validation.values()).cloned().collect();
            assert_eq!(joined, set.values().to_vec());
            if !validation.is_empty() {
                assert_eq!(validation.points()[(0, 0)], 2.0 * training.len() as f64);
            }
        }
    }

    #[test]
    fn mismatched_sample_set() {
        let err = SampleSet::new(Array2::zeros((3, 2)), Array1::zeros(2)).unwrap_err();
        assert!(err.downcast_ref::<DimensionMismatchError>().is_some());
    }

    #[test]
    fn samplers_are_seeded() {
        let a = uniform(&mut cell_rng(3, 1), 5, 2, -1.0, 1.0);
        let b = uniform(&mut cell_rng(3, 1), 5, 2, -1.0, 1.0);
        assert_eq!(a, b);
        assert!(a.iter().all(|&x| -1.0 <= x && x < 1.0));

        let normals = borehole(&mut cell_rng(0, 0), 2000);
        let mean = normals.column(0).sum() / 2000.0;
        assert!(mean.abs() < 0.1);
        for k in 0..2 {
            assert!(normals.column(k).iter().all(|&z| z.abs() <= 3.0));
        }
        assert!(normals.column(4).iter().all(|&x| -1.0 <= x && x < 1.0));
    }

    #[test]
    fn linspace_endpoints() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
    }

    #[test]
    fn dataset_cache_round_trip() {
        let _ = env_logger::try_init();
        let dir = asgrid_fs_util::TempDir::new("asgrid-cache").unwrap();
        let cache = DatasetCache::new(dir.path(), 7);
        let f = by_name("exp3D").unwrap();

        let created = cache.load_or_create(&*f, 20).unwrap();
        assert!(cache.points_path(20).exists());
        assert_eq!(created.len(), 20);

        // a second call must read the files rather than regenerate
        let tampered = serde_json::to_string(&vec![1.5; 20]).unwrap();
        asgrid_fs_util::write_atomic(cache.values_path(20), tampered.as_bytes()).unwrap();
        let loaded = cache.load_or_create(&*f, 20).unwrap();
        assert_close!(abs=1e-15, loaded.points(), created.points());
        assert!(loaded.values().iter().all(|&v| v == 1.5));

        let other = FnObjective::new("wide", Domain::unit(4), |_| 0.0);
        let err = cache.load_or_create(&other, 20).unwrap_err();
        assert!(err.downcast_ref::<DimensionMismatchError>().is_some());
    }
}
