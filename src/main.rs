use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use spectro_sweep::data::loader::{load_axis_store, load_config};
use spectro_sweep::data::writer::write_dataset;
use spectro_sweep::instrument::sim::{LinearDispersion, SimulatedSetup, SimulatedSpectrometer};
use spectro_sweep::{ActivePixelWindow, SpectralDataset, SweepConfig, SweepController};

/// Run one sweep against the simulated spectrometer and write the calibrated frames.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Precomputed wavelength-axis store (.parquet, .json or .csv)
    #[arg(long)]
    axes: PathBuf,

    /// Sweep start wavelength in nanometers
    #[arg(long)]
    start: f64,

    /// Sweep end wavelength in nanometers
    #[arg(long)]
    end: f64,

    /// Output dataset (.parquet, .json or .csv)
    #[arg(long)]
    output: PathBuf,

    /// JSON sweep configuration; production defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Despike frames even if the configuration has no spike filter section
    #[arg(long, default_value_t = false)]
    despike: bool,

    /// Cosmic rays injected per simulated frame
    #[arg(long, default_value_t = 2)]
    cosmic_rays: usize,

    /// Seed of the simulated detector noise
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SweepConfig::default(),
    };
    let table = config.frame_table().context("invalid frame table")?;
    let calibration = config.calibration_curve()?;

    let axes = load_axis_store(&args.axes)?;
    axes.validate_against(&table)
        .context("axis store does not match the frame table")?;
    let first_axis = axes
        .iter()
        .next()
        .map(|(_, axis)| axis)
        .context("axis store is empty")?;

    let setup = SimulatedSetup {
        dispersion: LinearDispersion::from_axis(first_axis)?,
        window: ActivePixelWindow::new(config.edge_trim),
        cosmic_rays_per_frame: args.cosmic_rays,
        seed: args.seed,
        ..SimulatedSetup::default()
    };
    let instrument = SimulatedSpectrometer::new(setup);

    let spike_filter = config
        .spike_filter
        .or_else(|| args.despike.then(Default::default));
    let mut controller = SweepController::new(instrument, axes, table, calibration);
    if let Some(params) = spike_filter {
        params.validate().context("invalid spike filter parameters")?;
        controller = controller.with_spike_filter(params);
    }

    let frames = controller.run(args.start, args.end)?;
    let dataset = SpectralDataset::from_frames(&frames);
    write_dataset(&args.output, &dataset)?;
    info!(
        "{} frame(s) from {} to {} nm written to {}",
        frames.len(),
        args.start,
        args.end,
        args.output.display()
    );
    Ok(())
}
