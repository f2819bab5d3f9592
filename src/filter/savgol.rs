use nalgebra::DMatrix;

use crate::error::FilterError;

/// Savitzky-Golay smoother (zeroth derivative).
///
/// Interior samples are the value at the window center of a least-squares
/// polynomial fit over the window. The first and last `window_length / 2`
/// samples come from a single fit over the first (resp. last) full window,
/// evaluated at their positions, which matches scipy's `mode="interp"`.
///
/// Both cases use the same hat matrix `V (VᵀV)⁻¹ Vᵀ` of the window, because
/// projecting onto polynomials of fixed degree does not depend on where the
/// window sits along the axis.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window_length: usize,
    hat: DMatrix<f64>,
}

impl SavitzkyGolay {
    pub fn new(window_length: usize, polyorder: usize) -> Result<Self, FilterError> {
        if window_length % 2 == 0 {
            return Err(FilterError::EvenWindow(window_length));
        }
        if polyorder >= window_length {
            return Err(FilterError::PolyorderTooLarge {
                window_length,
                polyorder,
            });
        }

        let half = window_length / 2;
        // Scaled positions in [-1, 1] keep VᵀV well conditioned for wide windows.
        let scale = half.max(1) as f64;
        let vander = DMatrix::from_fn(window_length, polyorder + 1, |i, j| {
            ((i as f64 - half as f64) / scale).powi(j as i32)
        });
        let pinv = vander
            .clone()
            .pseudo_inverse(1e-12)
            .map_err(|_| FilterError::DegenerateFit {
                window_length,
                polyorder,
            })?;
        let hat = vander * pinv;

        Ok(Self { window_length, hat })
    }

    /// Smooth `data`, which must hold at least `window_length` samples.
    pub fn apply(&self, data: &[f64]) -> Result<Vec<f64>, FilterError> {
        let n = data.len();
        let w = self.window_length;
        if n < w {
            return Err(FilterError::WindowTooLong {
                window_length: w,
                len: n,
            });
        }
        let half = w / 2;
        let fit = |row: usize, window: &[f64]| -> f64 {
            window
                .iter()
                .enumerate()
                .map(|(k, v)| self.hat[(row, k)] * v)
                .sum()
        };

        let mut out = vec![0.0; n];
        for (i, window) in data.windows(w).enumerate() {
            out[i + half] = fit(half, window);
        }

        let head = &data[..w];
        for (i, slot) in out.iter_mut().take(half).enumerate() {
            *slot = fit(i, head);
        }
        let tail = &data[n - w..];
        for row in half + 1..w {
            out[n - w + row] = fit(row, tail);
        }
        Ok(out)
    }
}

/// One-shot convenience wrapper around [`SavitzkyGolay`].
pub fn savgol_filter(
    data: &[f64],
    window_length: usize,
    polyorder: usize,
) -> Result<Vec<f64>, FilterError> {
    SavitzkyGolay::new(window_length, polyorder)?.apply(data)
}
