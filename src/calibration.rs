use anyhow::{Result, bail};

/// Production fit of detector center pixel against reported wavelength (nm),
/// highest power first.
pub const PRODUCTION_COEFFS: [f64; 2] = [-2.27116816e-02, 5.42828888e+02];

/// Polynomial mapping a spectrometer-reported wavelength to the detector pixel
/// expected at the center of the frame. Diagnostic only; never used to correct data.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationCurve {
    /// Highest power first.
    coeffs: Vec<f64>,
}

impl Default for CalibrationCurve {
    fn default() -> Self {
        Self {
            coeffs: PRODUCTION_COEFFS.to_vec(),
        }
    }
}

impl CalibrationCurve {
    pub fn new(coeffs: Vec<f64>) -> Result<Self> {
        if coeffs.is_empty() {
            bail!("calibration polynomial needs at least one coefficient");
        }
        if coeffs.iter().any(|c| !c.is_finite()) {
            bail!("calibration coefficients must be finite: {coeffs:?}");
        }
        Ok(Self { coeffs })
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn evaluate(&self, wavelength: f64) -> f64 {
        self.coeffs.iter().fold(0.0, |acc, c| acc * wavelength + c)
    }

    /// Nearest detector pixel for the given settled wavelength.
    pub fn center_pixel(&self, wavelength: f64) -> i64 {
        self.evaluate(wavelength).round() as i64
    }
}
