use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use spectro_sweep::data::loader::load_config;
use spectro_sweep::data::writer::write_axis_store;
use spectro_sweep::instrument::sim::LinearDispersion;
use spectro_sweep::SweepConfig;

/// Write a synthetic wavelength-axis store (linear dispersion) for every frame of the table.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Output store (.parquet, .json or .csv)
    #[arg(long, default_value = "wavelength_axes.parquet")]
    output: PathBuf,

    /// JSON sweep configuration supplying the frame table
    #[arg(long)]
    config: Option<PathBuf>,

    /// Active detector pixels per frame
    #[arg(long, default_value_t = 1000)]
    pixels: usize,

    /// Dispersion in nanometers per pixel
    #[arg(long, default_value_t = 0.05)]
    nm_per_pixel: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SweepConfig::default(),
    };
    let table = config.frame_table().context("invalid frame table")?;
    let dispersion = LinearDispersion {
        nm_per_pixel: args.nm_per_pixel,
        pixels: args.pixels,
    };
    let store = dispersion.axis_store(&table)?;
    write_axis_store(&args.output, &store)?;

    println!(
        "Wrote {} wavelength axes ({} pixels each) to {}",
        store.len(),
        args.pixels,
        args.output.display()
    );
    Ok(())
}
