use anyhow::{Context, Result, ensure};
use log::debug;

use super::{Acquisition, ActivePixelWindow, Positioner};
use crate::data::model::{RawFrame, WavelengthAxisMap};
use crate::error::AxisStoreError;
use crate::sweep::FrameTable;

/// Cosmic rays are kept this far from the ends of the active window so the
/// spike filter always has baseline on both sides.
const COSMIC_RAY_MARGIN: usize = 64;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

// ---------------------------------------------------------------------------
// Dispersion model
// ---------------------------------------------------------------------------

/// Linear pixel → wavelength model around the frame center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearDispersion {
    pub nm_per_pixel: f64,
    /// Active pixels per frame.
    pub pixels: usize,
}

impl LinearDispersion {
    /// Recover the model from an existing axis (first and last pixel).
    pub fn from_axis(axis: &[f64]) -> Result<Self> {
        ensure!(axis.len() >= 2, "need at least two pixels, got {}", axis.len());
        let span = axis[axis.len() - 1] - axis[0];
        ensure!(span.is_finite() && span != 0.0, "degenerate wavelength axis");
        Ok(Self {
            nm_per_pixel: span / (axis.len() - 1) as f64,
            pixels: axis.len(),
        })
    }

    pub fn axis(&self, center: f64) -> Vec<f64> {
        let mid = (self.pixels as f64 - 1.0) / 2.0;
        (0..self.pixels)
            .map(|p| center + (p as f64 - mid) * self.nm_per_pixel)
            .collect()
    }

    /// Axis store for every frame of `table`, keyed by the table's own values.
    pub fn axis_store(&self, table: &FrameTable) -> Result<WavelengthAxisMap, AxisStoreError> {
        WavelengthAxisMap::from_entries(table.centers().iter().map(|&c| (c, self.axis(c))))
    }
}

/// Emission line rendered by the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionLine {
    pub wavelength: f64,
    pub sigma: f64,
    pub amplitude: f64,
}

// ---------------------------------------------------------------------------
// SimulatedSpectrometer
// ---------------------------------------------------------------------------

/// Knobs of [`SimulatedSpectrometer`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedSetup {
    pub dispersion: LinearDispersion,
    pub window: ActivePixelWindow,
    pub lines: Vec<EmissionLine>,
    pub background: f64,
    pub noise_sigma: f64,
    /// Difference between the settled and the requested center (nm).
    pub settle_offset: f64,
    pub cosmic_rays_per_frame: usize,
    pub cosmic_ray_amplitude: f64,
    pub seed: u64,
}

impl Default for SimulatedSetup {
    fn default() -> Self {
        Self {
            dispersion: LinearDispersion {
                nm_per_pixel: 0.05,
                pixels: 1000,
            },
            window: ActivePixelWindow::default(),
            lines: vec![
                EmissionLine {
                    wavelength: 532.0,
                    sigma: 2.0,
                    amplitude: 900.0,
                },
                EmissionLine {
                    wavelength: 785.0,
                    sigma: 3.0,
                    amplitude: 600.0,
                },
            ],
            background: 200.0,
            noise_sigma: 5.0,
            settle_offset: 0.012,
            cosmic_rays_per_frame: 2,
            cosmic_ray_amplitude: 4000.0,
            seed: 42,
        }
    }
}

/// Deterministic stand-in for the camera / spectrometer pair.
#[derive(Debug, Clone)]
pub struct SimulatedSpectrometer {
    setup: SimulatedSetup,
    rng: SimpleRng,
    position: Option<f64>,
    frames_read: u64,
}

impl SimulatedSpectrometer {
    pub fn new(setup: SimulatedSetup) -> Self {
        let rng = SimpleRng::new(setup.seed);
        Self {
            setup,
            rng,
            position: None,
            frames_read: 0,
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Counts the simulator renders before noise and cosmic rays.
    pub fn noiseless(&self, wavelength: f64) -> f64 {
        self.setup.background
            + self
                .setup
                .lines
                .iter()
                .map(|l| gaussian(wavelength, l.wavelength, l.sigma, l.amplitude))
                .sum::<f64>()
    }
}

impl Positioner for SimulatedSpectrometer {
    fn move_to(&mut self, center: f64) -> Result<f64> {
        let settled = center + self.setup.settle_offset;
        debug!("simulated grating moved to {center} nm, settled at {settled} nm");
        self.position = Some(center);
        Ok(settled)
    }
}

impl Acquisition for SimulatedSpectrometer {
    fn acquire(&mut self) -> Result<RawFrame> {
        let center = self
            .position
            .context("acquire called before the grating was positioned")?;
        let trim = self.setup.window.edge_trim;
        let dispersion = self.setup.dispersion;
        let full_len = dispersion.pixels + 2 * trim;
        let mid = (dispersion.pixels as f64 - 1.0) / 2.0;

        let mut full: Vec<f64> = (0..full_len)
            .map(|col| {
                let wl = center + (col as f64 - trim as f64 - mid) * dispersion.nm_per_pixel;
                self.noiseless(wl)
            })
            .collect();
        for v in &mut full {
            *v += self.rng.gauss(0.0, self.setup.noise_sigma);
        }

        let span = dispersion.pixels.saturating_sub(2 * COSMIC_RAY_MARGIN);
        if span > 0 {
            for _ in 0..self.setup.cosmic_rays_per_frame {
                let pixel = COSMIC_RAY_MARGIN + (self.rng.next_u64() as usize % span);
                full[trim + pixel] += self.setup.cosmic_ray_amplitude;
            }
        }

        self.frames_read += 1;
        self.setup.window.trim(&full)
    }
}

// ---------------------------------------------------------------------------
// PRNG
// ---------------------------------------------------------------------------

/// Minimal deterministic PRNG (xoshiro256**)
#[derive(Debug, Clone)]
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}
