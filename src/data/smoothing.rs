//! Savitzky-Golay smoothing.
//!
//! A degree-`p` polynomial is least-squares fitted to each window of `w`
//! consecutive samples and evaluated at the window centre `(w - 1) / 2`.
//! Interior outputs use the window `[i - (w-1)/2, i - (w-1)/2 + w)`, which
//! reduces to a fixed convolution kernel computed once. For an even `w` that
//! centre falls half a sample after `i`, the same as `scipy.signal.savgol_filter`.
//! The first `w/2` and last `w/2` outputs are evaluated from the polynomial
//! fitted to the first (resp. last) full window.
//!
//! Inputs shorter than the window are rejected with
//! [`SiriusError::InsufficientSamples`]; there is no shrinking of the window.

use crate::config::SmoothingConfig;
use crate::error::{Result, SiriusError};

#[derive(Debug, Clone, PartialEq)]
pub struct SavitzkyGolay {
    window: usize,
    poly_order: usize,
    /// Interior convolution weights, `kernel[j]` multiplies `x[i - (w-1)/2 + j]`.
    kernel: Vec<f64>,
}

impl SavitzkyGolay {
    pub fn new(window: usize, poly_order: usize) -> Result<Self> {
        if window == 0 || poly_order >= window {
            return Err(SiriusError::InvalidWindow { window, poly_order });
        }
        let basis = Basis::new(window, poly_order);
        let gram = basis.gram();
        // Window centre, which the basis maps to 0.
        let target = basis.powers(0.0);
        let h = solve(gram, target).ok_or(SiriusError::InvalidWindow { window, poly_order })?;
        let kernel = (0..window)
            .map(|j| dot(&h, &basis.powers(basis.position(j))))
            .collect();
        Ok(Self {
            window,
            poly_order,
            kernel,
        })
    }

    pub fn from_config(cfg: &SmoothingConfig) -> Result<Self> {
        Self::new(cfg.window, cfg.poly_order)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn poly_order(&self) -> usize {
        self.poly_order
    }

    /// Smooth `samples`, returning one value per input.
    pub fn smooth(&self, samples: &[f64]) -> Result<Vec<f64>> {
        let n = samples.len();
        let w = self.window;
        if n < w {
            return Err(SiriusError::InsufficientSamples {
                required: w,
                available: n,
            });
        }
        let half = w / 2;
        let lead = (w - 1) / 2;

        let mut out = Vec::with_capacity(n);

        let head = self.fit_window(&samples[..w]);
        for i in 0..half {
            out.push(head.eval(i));
        }
        for i in half..n - half {
            let win = &samples[i - lead..i - lead + w];
            out.push(dot(&self.kernel, win));
        }
        if half > 0 {
            let tail = self.fit_window(&samples[n - w..]);
            for i in n - half..n {
                out.push(tail.eval(i - (n - w)));
            }
        }
        debug_assert_eq!(out.len(), n);
        Ok(out)
    }

    fn fit_window(&self, win: &[f64]) -> FittedPoly {
        let basis = Basis::new(self.window, self.poly_order);
        let mut rhs = vec![0.0; self.poly_order + 1];
        for (j, &y) in win.iter().enumerate() {
            for (k, p) in basis.powers(basis.position(j)).into_iter().enumerate() {
                rhs[k] += p * y;
            }
        }
        let coeffs = solve(basis.gram(), rhs).unwrap_or_else(|| vec![f64::NAN; self.poly_order + 1]);
        FittedPoly { basis, coeffs }
    }
}

/// [`SavitzkyGolay::smooth`] with the default window of 1000 and cubic fit.
pub fn smooth(samples: &[f64]) -> Result<Vec<f64>> {
    SavitzkyGolay::from_config(&SmoothingConfig::default())?.smooth(samples)
}

// ─────────────────────────────────────────────────────────────────────────────
// Least-squares helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Monomial basis over window offsets mapped to [-1, 1].
#[derive(Debug, Clone, Copy)]
struct Basis {
    window: usize,
    order: usize,
}

impl Basis {
    fn new(window: usize, order: usize) -> Self {
        Self { window, order }
    }

    fn position(&self, j: usize) -> f64 {
        let center = (self.window as f64 - 1.0) / 2.0;
        if center == 0.0 {
            0.0
        } else {
            (j as f64 - center) / center
        }
    }

    fn powers(&self, t: f64) -> Vec<f64> {
        let mut v = Vec::with_capacity(self.order + 1);
        let mut p = 1.0;
        for _ in 0..=self.order {
            v.push(p);
            p *= t;
        }
        v
    }

    fn gram(&self) -> Vec<Vec<f64>> {
        let m = self.order + 1;
        let mut g = vec![vec![0.0; m]; m];
        for j in 0..self.window {
            let ps = self.powers(self.position(j));
            for r in 0..m {
                for c in 0..m {
                    g[r][c] += ps[r] * ps[c];
                }
            }
        }
        g
    }
}

struct FittedPoly {
    basis: Basis,
    coeffs: Vec<f64>,
}

impl FittedPoly {
    fn eval(&self, j: usize) -> f64 {
        dot(&self.coeffs, &self.basis.powers(self.basis.position(j)))
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Gaussian elimination with partial pivoting. `None` if singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let f = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= f * a[col][k];
            }
            b[row] -= f * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let s: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - s) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_preserves_constants() {
        let sg = SavitzkyGolay::new(11, 3).unwrap();
        let sum: f64 = sg.kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn five_point_quadratic_kernel() {
        // Classic coefficients (-3, 12, 17, 12, -3) / 35.
        let sg = SavitzkyGolay::new(5, 2).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|c| c / 35.0);
        for (k, e) in sg.kernel.iter().zip(expected) {
            assert!((k - e).abs() < 1e-12, "{k} vs {e}");
        }
    }

    #[test]
    fn solve_small_system() {
        let x = solve(vec![vec![2.0, 1.0], vec![1.0, 3.0]], vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
        assert!(solve(vec![vec![1.0, 2.0], vec![2.0, 4.0]], vec![1.0, 2.0]).is_none());
    }
}
