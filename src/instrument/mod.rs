//! Seams to the hardware.
//!
//! The sweep controller only needs two blocking calls from the instrument:
//! move the grating to a frame center and read one frame. Device SDKs and
//! serial protocols live behind these traits; their failures are opaque
//! `anyhow` errors.

pub mod sim;

use anyhow::{Result, ensure};

use crate::config::DEFAULT_EDGE_TRIM;
use crate::data::model::RawFrame;

/// Grating positioning.
pub trait Positioner {
    /// Move to `center` (nm), block until settled and return the center the
    /// spectrometer actually reports.
    fn move_to(&mut self, center: f64) -> Result<f64>;
}

/// Detector readout.
pub trait Acquisition {
    /// Expose and read the frame at the current position, trimmed to the
    /// active pixel window.
    fn acquire(&mut self) -> Result<RawFrame>;
}

/// Columns kept from a full detector row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePixelWindow {
    /// Columns dropped on each side.
    pub edge_trim: usize,
}

impl Default for ActivePixelWindow {
    fn default() -> Self {
        Self {
            edge_trim: DEFAULT_EDGE_TRIM,
        }
    }
}

impl ActivePixelWindow {
    pub fn new(edge_trim: usize) -> Self {
        Self { edge_trim }
    }

    /// Active pixels for a detector row of `full_len` columns.
    pub fn active_len(&self, full_len: usize) -> usize {
        full_len.saturating_sub(2 * self.edge_trim)
    }

    pub fn trim(&self, full: &[f64]) -> Result<RawFrame> {
        ensure!(
            self.active_len(full.len()) > 0,
            "readout of {} columns is too short to trim {} from each side",
            full.len(),
            self.edge_trim
        );
        Ok(full[self.edge_trim..full.len() - self.edge_trim].to_vec())
    }
}
