//! Spike removal for single detector traces.
//!
//! ```text
//!  raw counts ──► savgol(polyorder1) ──► savgol(polyorder2) = baseline
//!      │                                        │
//!      └──────────── data - baseline > threshold ┘
//!                           │
//!                           ▼
//!              bracket + linear interpolation
//! ```

pub mod savgol;
pub mod spike;

pub use savgol::{SavitzkyGolay, savgol_filter};
pub use spike::filter_spikes;
