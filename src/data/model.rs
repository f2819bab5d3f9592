use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use log::warn;

use crate::error::AxisStoreError;
use crate::sweep::FrameTable;

/// One trimmed detector readout (active pixels only).
pub type RawFrame = Vec<f64>;

// ---------------------------------------------------------------------------
// WavelengthAxisMap – precomputed per-pixel wavelengths for every frame
// ---------------------------------------------------------------------------

/// Lookup of the per-pixel wavelength axis of a frame by its center wavelength.
pub trait AxisStore {
    /// Must fail rather than invent an axis when `center` is unknown.
    fn lookup(&self, center: f64) -> Result<&[f64], AxisStoreError>;
}

/// Read-only map from frame center (nm) to the per-pixel wavelengths of that frame.
///
/// Keys are matched on the exact bit pattern of the `f64`, the same value the
/// frame table hands out. A store generated by a different code path than the
/// table (e.g. re-parsed from rounded text) can silently stop matching; run
/// [`WavelengthAxisMap::validate_against`] after loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WavelengthAxisMap {
    axes: HashMap<u64, Vec<f64>>,
    pixel_count: usize,
}

impl WavelengthAxisMap {
    /// Build from `(center, wavelengths)` pairs; every axis must have the same length.
    pub fn from_entries<I>(entries: I) -> Result<Self, AxisStoreError>
    where
        I: IntoIterator<Item = (f64, Vec<f64>)>,
    {
        let mut axes = HashMap::new();
        let mut pixel_count = None;
        for (center, wavelengths) in entries {
            let expected = *pixel_count.get_or_insert(wavelengths.len());
            if wavelengths.len() != expected {
                return Err(AxisStoreError::PixelCountMismatch {
                    center,
                    len: wavelengths.len(),
                    expected,
                });
            }
            if axes.insert(center.to_bits(), wavelengths).is_some() {
                return Err(AxisStoreError::DuplicateKey(center));
            }
        }
        Ok(Self {
            axes,
            pixel_count: pixel_count.unwrap_or(0),
        })
    }

    /// Every stored key must be a frame of `table`. Frames without an axis are
    /// only logged: sweeps that avoid them still work.
    pub fn validate_against(&self, table: &FrameTable) -> Result<(), AxisStoreError> {
        if let Some(center) = self.centers().into_iter().find(|c| !table.contains(*c)) {
            return Err(AxisStoreError::UnknownKey(center));
        }
        for &center in table.centers() {
            if !self.axes.contains_key(&center.to_bits()) {
                warn!("frame {center} nm has no stored wavelength axis");
            }
        }
        Ok(())
    }

    /// Stored frame centers in ascending order.
    pub fn centers(&self) -> Vec<f64> {
        let mut centers: Vec<f64> = self.axes.keys().map(|bits| f64::from_bits(*bits)).collect();
        centers.sort_by(f64::total_cmp);
        centers
    }

    /// `(center, axis)` pairs in ascending center order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &[f64])> + '_ {
        self.centers()
            .into_iter()
            .filter_map(move |c| self.axes.get(&c.to_bits()).map(|axis| (c, axis.as_slice())))
    }

    /// Detector pixels per axis (0 for an empty store).
    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }
}

impl AxisStore for WavelengthAxisMap {
    fn lookup(&self, center: f64) -> Result<&[f64], AxisStoreError> {
        self.axes
            .get(&center.to_bits())
            .map(Vec::as_slice)
            .ok_or(AxisStoreError::MissingAxis(center))
    }
}

// ---------------------------------------------------------------------------
// CollectedFrame – one sweep step
// ---------------------------------------------------------------------------

/// Everything recorded for one frame of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedFrame {
    /// Planned frame center, the key into the axis store.
    pub center_wavelength: f64,
    /// Center reported by the spectrometer after the move.
    pub settled_wavelength: f64,
    /// Detector pixel expected at `settled_wavelength` (diagnostic).
    pub center_pixel: i64,
    /// Counts per active pixel, despiked if the sweep asked for it.
    pub counts: RawFrame,
    /// Wavelength (nm) per active pixel – same length as `counts`.
    pub wavelengths: Vec<f64>,
}

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a metadata column
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value attached to an output spectrum.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetadataValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Spectrum – one row of an output dataset
// ---------------------------------------------------------------------------

/// One calibrated frame as written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Wavelength axis (x, nm).
    pub x: Vec<f64>,
    /// Counts (y) – same length as `x`.
    pub y: Vec<f64>,
    /// Dynamic metadata columns: column_name → value.
    pub metadata: BTreeMap<String, MetadataValue>,
}

// ---------------------------------------------------------------------------
// SpectralDataset – a whole sweep
// ---------------------------------------------------------------------------

/// All frames of a sweep with the union of their metadata columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralDataset {
    pub spectra: Vec<Spectrum>,
    /// Ordered list of metadata column names (excludes x, y).
    pub column_names: Vec<String>,
}

impl SpectralDataset {
    pub fn from_spectra(spectra: Vec<Spectrum>) -> Self {
        let column_names: BTreeSet<String> = spectra
            .iter()
            .flat_map(|sp| sp.metadata.keys().cloned())
            .collect();
        SpectralDataset {
            spectra,
            column_names: column_names.into_iter().collect(),
        }
    }

    /// One row per collected frame, in sweep order.
    pub fn from_frames(frames: &[CollectedFrame]) -> Self {
        let spectra = frames
            .iter()
            .enumerate()
            .map(|(index, frame)| {
                let metadata = BTreeMap::from([
                    ("frame_index".to_string(), MetadataValue::Integer(index as i64)),
                    (
                        "center_wavelength".to_string(),
                        MetadataValue::Float(frame.center_wavelength),
                    ),
                    (
                        "settled_wavelength".to_string(),
                        MetadataValue::Float(frame.settled_wavelength),
                    ),
                    (
                        "center_pixel".to_string(),
                        MetadataValue::Integer(frame.center_pixel),
                    ),
                ]);
                Spectrum {
                    x: frame.wavelengths.clone(),
                    y: frame.counts.clone(),
                    metadata,
                }
            })
            .collect();
        Self::from_spectra(spectra)
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}
