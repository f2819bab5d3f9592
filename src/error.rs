use thiserror::Error;

/// Frame table construction failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameTableError {
    #[error("frame table is empty")]
    Empty,
    #[error("frame table entry {index} is not finite")]
    NonFinite { index: usize },
    #[error("frame table is not strictly increasing at index {index} ({previous} >= {current})")]
    NotIncreasing {
        index: usize,
        previous: f64,
        current: f64,
    },
}

/// Spike filter parameter and data problems.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("window length {0} must be odd")]
    EvenWindow(usize),
    #[error("window length {window_length} must exceed polynomial order {polyorder}")]
    PolyorderTooLarge {
        window_length: usize,
        polyorder: usize,
    },
    #[error("window length {window_length} is longer than the data ({len} samples)")]
    WindowTooLong { window_length: usize, len: usize },
    #[error("threshold must be a non-negative finite number, got {0}")]
    InvalidThreshold(f64),
    #[error("max spike width must be at least 1")]
    ZeroSpikeWidth,
    #[error("least-squares fit for window {window_length}, order {polyorder} is degenerate")]
    DegenerateFit {
        window_length: usize,
        polyorder: usize,
    },
    #[error("spike at index {index} has no baseline crossing before it")]
    InsufficientLeadingContext { index: usize },
}

/// Wavelength-axis store consistency problems.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AxisStoreError {
    #[error("no wavelength axis stored for frame center {0} nm")]
    MissingAxis(f64),
    #[error("stored axis key {0} nm is not an entry of the frame table")]
    UnknownKey(f64),
    #[error("duplicate axis for frame center {0} nm")]
    DuplicateKey(f64),
    #[error("axis for {center} nm has {len} pixels, expected {expected}")]
    PixelCountMismatch {
        center: f64,
        len: usize,
        expected: usize,
    },
}

/// Failures while collecting one sweep step.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Axis(#[from] AxisStoreError),
    #[error("instrument failure at {center} nm")]
    Instrument {
        center: f64,
        #[source]
        source: anyhow::Error,
    },
    #[error("frame at {center} nm has {counts} samples but its axis has {pixels}")]
    LengthMismatch {
        center: f64,
        counts: usize,
        pixels: usize,
    },
    #[error("spike filtering failed at {center} nm")]
    Filter {
        center: f64,
        #[source]
        source: FilterError,
    },
}
