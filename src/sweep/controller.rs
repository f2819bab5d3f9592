use log::{debug, info};

use super::planner::{FrameTable, SweepPlan};
use crate::calibration::CalibrationCurve;
use crate::config::SpikeFilterParams;
use crate::data::model::{AxisStore, CollectedFrame};
use crate::error::SweepError;
use crate::filter::filter_spikes;
use crate::instrument::{Acquisition, Positioner};

/// Drives an instrument through a planned sweep, one frame per [`collect`](Self::collect).
///
/// States: not started (no plan), in progress, exhausted. `init_sweep` is the
/// only way into "in progress" and may be called again at any time.
pub struct SweepController<I, S> {
    instrument: I,
    axes: S,
    table: FrameTable,
    calibration: CalibrationCurve,
    spike_filter: Option<SpikeFilterParams>,
    plan: Option<SweepPlan>,
}

impl<I, S> SweepController<I, S>
where
    I: Positioner + Acquisition,
    S: AxisStore,
{
    pub fn new(instrument: I, axes: S, table: FrameTable, calibration: CalibrationCurve) -> Self {
        Self {
            instrument,
            axes,
            table,
            calibration,
            spike_filter: None,
            plan: None,
        }
    }

    /// Despike every frame with `params` before it is returned.
    pub fn with_spike_filter(mut self, params: SpikeFilterParams) -> Self {
        self.spike_filter = Some(params);
        self
    }

    /// Plan a new sweep over `[wavelength_start, wavelength_end]`, dropping any
    /// previous plan, and return the planned frame centers.
    pub fn init_sweep(&mut self, wavelength_start: f64, wavelength_end: f64) -> &[f64] {
        let plan = self.table.plan_sweep(wavelength_start, wavelength_end);
        info!(
            "sweep {wavelength_start}..{wavelength_end} nm planned over {} frame(s): {:?}",
            plan.len(),
            plan.frames()
        );
        self.plan.insert(plan).frames()
    }

    /// Collect the next frame of the current sweep.
    ///
    /// Returns `Ok(None)` before the first `init_sweep` and once the sweep is
    /// exhausted. The axis is looked up before the grating moves; on any error
    /// the cursor stays put so the same frame can be retried.
    pub fn collect(&mut self) -> Result<Option<CollectedFrame>, SweepError> {
        let Some(center) = self.plan.as_ref().and_then(SweepPlan::peek) else {
            return Ok(None);
        };

        let wavelengths = self.axes.lookup(center)?.to_vec();

        let settled_wavelength = self
            .instrument
            .move_to(center)
            .map_err(|source| SweepError::Instrument { center, source })?;
        let center_pixel = self.calibration.center_pixel(settled_wavelength);

        let raw = self
            .instrument
            .acquire()
            .map_err(|source| SweepError::Instrument { center, source })?;
        if raw.len() != wavelengths.len() {
            return Err(SweepError::LengthMismatch {
                center,
                counts: raw.len(),
                pixels: wavelengths.len(),
            });
        }

        let counts = match &self.spike_filter {
            Some(params) => filter_spikes(&raw, params)
                .map_err(|source| SweepError::Filter { center, source })?,
            None => raw,
        };

        if let Some(plan) = self.plan.as_mut() {
            plan.next_frame();
        }
        debug!("collected frame {center} nm (settled {settled_wavelength} nm, center pixel {center_pixel})");

        Ok(Some(CollectedFrame {
            center_wavelength: center,
            settled_wavelength,
            center_pixel,
            counts,
            wavelengths,
        }))
    }

    /// Plan a sweep and collect all of its frames.
    pub fn run(
        &mut self,
        wavelength_start: f64,
        wavelength_end: f64,
    ) -> Result<Vec<CollectedFrame>, SweepError> {
        self.init_sweep(wavelength_start, wavelength_end);
        let mut frames = Vec::new();
        while let Some(frame) = self.collect()? {
            frames.push(frame);
        }
        info!("sweep finished with {} frame(s)", frames.len());
        Ok(frames)
    }

    pub fn plan(&self) -> Option<&SweepPlan> {
        self.plan.as_ref()
    }

    pub fn frame_table(&self) -> &FrameTable {
        &self.table
    }

    pub fn wavelength_axes(&self) -> &S {
        &self.axes
    }

    pub fn instrument(&self) -> &I {
        &self.instrument
    }

    pub fn into_instrument(self) -> I {
        self.instrument
    }
}
