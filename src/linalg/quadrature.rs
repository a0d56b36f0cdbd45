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

use crate::FailResult;

/// A quadrature rule: nodes and weights on an interval `[a, b]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussRule {
    pub nodes: Vec<f64>,
    pub weights: Vec<f64>,
    pub a: f64,
    pub b: f64,
}

impl GaussRule {
    /// Gauss-Legendre rule with `order` nodes on `[-1, 1]`.
    ///
    /// It integrates polynomials up to degree `2 * order - 1` exactly.
    /// Nodes are found by Newton iteration on the Legendre polynomial.
    pub fn legendre(order: usize) -> FailResult<GaussRule> {
        ensure!(order > 0, "a quadrature rule needs at least one node");
        let n = order;
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];

        for i in 0..(n + 1) / 2 {
            let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
            let mut converged = false;
            for _ in 0..100 {
                let (p, dp) = legendre_with_deriv(n, x);
                let dx = p / dp;
                x -= dx;
                if dx.abs() < 3e-14 {
                    converged = true;
                    break;
                }
            }
            ensure!(converged, "Newton iteration for Gauss-Legendre node {} of {} did not converge", i, n);
            let (_, dp) = legendre_with_deriv(n, x);

            let w = 2.0 / ((1.0 - x * x) * dp * dp);
            nodes[i] = -x;
            nodes[n - 1 - i] = x;
            weights[i] = w;
            weights[n - 1 - i] = w;
        }
        Ok(GaussRule { nodes, weights, a: -1.0, b: 1.0 })
    }

    /// The same rule, affinely moved onto `[a, b]`.
    pub fn reseat(&self, a: f64, b: f64) -> GaussRule {
        let scale = (b - a) / (self.b - self.a);
        GaussRule {
            nodes: self.nodes.iter().map(|&x| a + (x - self.a) * scale).collect(),
            weights: self.weights.iter().map(|&w| w * scale).collect(),
            a,
            b,
        }
    }

    /// Composite rule with one copy of `self` on each interval between
    /// consecutive `edges`. Empty intervals are skipped.
    pub fn piecewise(&self, edges: &[f64]) -> GaussRule {
        let mut nodes = vec![];
        let mut weights = vec![];
        for pair in edges.windows(2) {
            if pair[1] <= pair[0] {
                continue;
            }
            let piece = self.reseat(pair[0], pair[1]);
            nodes.extend(piece.nodes);
            weights.extend(piece.weights);
        }
        let a = edges.first().cloned().unwrap_or(self.a);
        let b = edges.last().cloned().unwrap_or(self.b);
        GaussRule { nodes, weights, a, b }
    }

    pub fn integrate(&self, mut f: impl FnMut(f64) -> f64) -> f64 {
        self.nodes.iter().zip(&self.weights)
            .map(|(&x, &w)| w * f(x))
            .sum()
    }
}

// P_n(x) and P_n'(x) by the three-term recurrence.
fn legendre_with_deriv(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 2..=n {
        let k = k as f64;
        let p2 = ((2.0 * k - 1.0) * x * p1 - (k - 1.0) * p0) / k;
        p0 = p1;
        p1 = p2;
    }
    let dp = n as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, dp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_for_polynomials() {
        for order in 1..=9 {
            let rule = GaussRule::legendre(order).unwrap();
            assert_close!(abs=1e-13, rule.weights.iter().sum::<f64>(), 2.0);
            let max_degree = 2 * order - 1;
            for degree in 0..=max_degree {
                let exact = if degree % 2 == 1 { 0.0 } else { 2.0 / (degree as f64 + 1.0) };
                let got = rule.integrate(|x| x.powi(degree as i32));
                assert_close!(abs=1e-13, got, exact, "order {} degree {}", order, degree);
            }
        }
    }

    #[test]
    fn known_three_point_nodes() {
        let rule = GaussRule::legendre(3).unwrap();
        let r = (0.6f64).sqrt();
        assert_close!(abs=1e-14, rule.nodes.clone(), vec![-r, 0.0, r]);
        assert_close!(abs=1e-14, rule.weights.clone(), vec![5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0]);
    }

    #[test]
    fn piecewise_handles_kinks() {
        // |x - 0.3| on [0, 1] is a polynomial on each side of the kink
        let rule = GaussRule::legendre(2).unwrap().piecewise(&[0.0, 0.3, 0.3, 1.0]);
        let got = rule.integrate(|x| (x - 0.3f64).abs());
        assert_close!(abs=1e-14, got, 0.5 * (0.09 + 0.49));
        assert_eq!(rule.nodes.len(), 4);
    }

    #[test]
    fn zero_order_is_an_error() {
        assert!(GaussRule::legendre(0).is_err());
    }
}
