//! Finite-difference derivatives, for objectives without analytic gradients.

/// Approximation method for a numerical 1D derivative.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DerivativeKind {
    /// n-point central stencil. Only implemented for `n = 3, 5, 7`.
    Stencil(u32),
}

impl Default for DerivativeKind {
    fn default() -> DerivativeKind {
        DerivativeKind::Stencil(5)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&a, &b)| a * b).sum()
}

macro_rules! stencil_sum {
    ($value_fn:expr, $point:expr, $step:expr, [
        $((offset: $sign:tt $offset:expr, coeff: $(+)?$coeff:expr),)*
    ]) => {{
        let value_fn = &mut $value_fn;
        let point = $point;
        let step = $step;
        let values = [$(value_fn(point $sign $offset * step),)+];
        let coeffs = [$($coeff),*];
        dot(&values, &coeffs)
    }};
}

/// Derivative of a 1D function at `point`.
pub fn slope(
    step: f64,
    kind: Option<DerivativeKind>,
    point: f64,
    mut value_fn: impl FnMut(f64) -> f64,
) -> f64 {
    // http://www.holoborodko.com/pavel/numerical-methods/numerical-derivative/central-differences/
    match kind.unwrap_or_default() {
        DerivativeKind::Stencil(3) => {
            let numer = stencil_sum!(value_fn, point, step, [
                (offset: -1.0, coeff: -1.0),
                (offset: +1.0, coeff: +1.0),
            ]);
            numer / (2.0 * step)
        },

        DerivativeKind::Stencil(5) => {
            let numer = stencil_sum!(value_fn, point, step, [
                (offset: -2.0, coeff: +1.0),
                (offset: -1.0, coeff: -8.0),
                (offset: +1.0, coeff: +8.0),
                (offset: +2.0, coeff: -1.0),
            ]);
            numer / (12.0 * step)
        },

        DerivativeKind::Stencil(7) => {
            let numer = stencil_sum!(value_fn, point, step, [
                (offset: -3.0, coeff: -1.0),
                (offset: -2.0, coeff: +9.0),
                (offset: -1.0, coeff: -45.0),
                (offset: +1.0, coeff: +45.0),
                (offset: +2.0, coeff: -9.0),
                (offset: +3.0, coeff: +1.0),
            ]);
            numer / (60.0 * step)
        },

        DerivativeKind::Stencil(n) => panic!("unsupported stencil size: {}", n),
    }
}

/// Gradient of a function of several variables, one stencil per axis.
pub fn gradient(
    step: f64,
    kind: Option<DerivativeKind>,
    point: &[f64],
    mut value_fn: impl FnMut(&[f64]) -> f64,
) -> Vec<f64> {
    let mut x = point.to_vec();
    (0..point.len())
        .map(|k| {
            let d = slope(step, kind, point[k], |xk| {
                x[k] = xk;
                value_fn(&x)
            });
            x[k] = point[k];
            d
        })
        .collect()
}
