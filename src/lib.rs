//! Acquisition core of a scanning spectrometer / camera pair.
//!
//! A sweep over a wavelength range is recorded as a run of overlapping
//! detector frames. [`sweep`] picks the frames and walks the instrument
//! through them, [`filter`] removes cosmic-ray spikes from each readout, and
//! [`data`] pairs every frame with its precomputed wavelength axis.

pub mod calibration;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod instrument;
pub mod sweep;

pub use calibration::CalibrationCurve;
pub use config::{SpikeFilterParams, SweepConfig};
pub use data::model::{AxisStore, CollectedFrame, RawFrame, SpectralDataset, WavelengthAxisMap};
pub use error::{AxisStoreError, FilterError, FrameTableError, SweepError};
pub use filter::filter_spikes;
pub use instrument::{Acquisition, ActivePixelWindow, Positioner};
pub use sweep::{FrameTable, SweepController, SweepPlan, SweepState};
