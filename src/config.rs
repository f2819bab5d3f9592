use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationCurve, PRODUCTION_COEFFS};
use crate::error::{FilterError, FrameTableError};
use crate::sweep::FrameTable;

/// Sensor edge columns discarded on each side of a full detector readout.
pub const DEFAULT_EDGE_TRIM: usize = 12;

// ---------------------------------------------------------------------------
// SpikeFilterParams
// ---------------------------------------------------------------------------

/// Tuning of [`crate::filter::filter_spikes`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeFilterParams {
    /// Minimum excess over the baseline that counts as a spike.
    pub threshold: f64,
    /// Samples scanned forward for the trailing edge of a spike.
    pub max_spike_width: usize,
    /// Savitzky-Golay window, odd.
    pub window_length: usize,
    /// Order of the first smoothing pass.
    pub polyorder1: usize,
    /// Order of the second, flatter pass.
    pub polyorder2: usize,
}

impl Default for SpikeFilterParams {
    fn default() -> Self {
        Self {
            threshold: 500.0,
            max_spike_width: 10,
            window_length: 51,
            polyorder1: 3,
            polyorder2: 1,
        }
    }
}

impl SpikeFilterParams {
    /// Check everything that does not depend on the data length.
    pub fn validate(&self) -> Result<(), FilterError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(FilterError::InvalidThreshold(self.threshold));
        }
        if self.max_spike_width == 0 {
            return Err(FilterError::ZeroSpikeWidth);
        }
        if self.window_length % 2 == 0 {
            return Err(FilterError::EvenWindow(self.window_length));
        }
        let polyorder = self.polyorder1.max(self.polyorder2);
        if polyorder >= self.window_length {
            return Err(FilterError::PolyorderTooLarge {
                window_length: self.window_length,
                polyorder,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SweepConfig
// ---------------------------------------------------------------------------

/// Process-wide acquisition settings, read once at startup.
///
/// ```json
/// {
///   "frames": [500.0, 526.977, 553.64],
///   "calibration": [-0.0227116816, 542.828888],
///   "edge_trim": 12,
///   "spike_filter": { "threshold": 500.0, "max_spike_width": 10 }
/// }
/// ```
///
/// Every field is optional; missing ones take the production values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub frames: Vec<f64>,
    /// Highest power first.
    pub calibration: Vec<f64>,
    pub edge_trim: usize,
    /// Despike every collected frame when set.
    pub spike_filter: Option<SpikeFilterParams>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            frames: FrameTable::production().centers().to_vec(),
            calibration: PRODUCTION_COEFFS.to_vec(),
            edge_trim: DEFAULT_EDGE_TRIM,
            spike_filter: None,
        }
    }
}

impl SweepConfig {
    pub fn frame_table(&self) -> Result<FrameTable, FrameTableError> {
        FrameTable::new(self.frames.clone())
    }

    pub fn calibration_curve(&self) -> anyhow::Result<CalibrationCurve> {
        CalibrationCurve::new(self.calibration.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_setup() {
        let params = SpikeFilterParams::default();
        assert_eq!(params.threshold, 500.0);
        assert_eq!(params.max_spike_width, 10);
        assert_eq!(params.window_length, 51);
        assert_eq!((params.polyorder1, params.polyorder2), (3, 1));
        assert!(params.validate().is_ok());

        let config = SweepConfig::default();
        assert_eq!(config.frame_table().unwrap().len(), 50);
        assert_eq!(config.edge_trim, 12);
        assert!(config.spike_filter.is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SweepConfig = serde_json::from_str(
            r#"{ "frames": [600.0, 700.0], "spike_filter": { "threshold": 250.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.frames, vec![600.0, 700.0]);
        assert_eq!(config.calibration, PRODUCTION_COEFFS.to_vec());
        let params = config.spike_filter.unwrap();
        assert_eq!(params.threshold, 250.0);
        assert_eq!(params.window_length, 51);
    }

    #[test]
    fn validate_flags_each_bad_parameter() {
        let base = SpikeFilterParams::default();
        let cases = [
            (
                SpikeFilterParams { threshold: -1.0, ..base },
                FilterError::InvalidThreshold(-1.0),
            ),
            (
                SpikeFilterParams { max_spike_width: 0, ..base },
                FilterError::ZeroSpikeWidth,
            ),
            (
                SpikeFilterParams { window_length: 50, ..base },
                FilterError::EvenWindow(50),
            ),
            (
                SpikeFilterParams { window_length: 3, ..base },
                FilterError::PolyorderTooLarge {
                    window_length: 3,
                    polyorder: 3,
                },
            ),
        ];
        for (params, expected) in cases {
            assert_eq!(params.validate(), Err(expected));
        }
    }

    #[test]
    fn bad_frame_list_is_reported() {
        let config = SweepConfig {
            frames: vec![700.0, 600.0],
            ..SweepConfig::default()
        };
        assert!(config.frame_table().is_err());
    }
}
