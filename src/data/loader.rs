use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, LargeListArray, ListArray};
use arrow::datatypes::DataType;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::WavelengthAxisMap;
use crate::config::SweepConfig;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a precomputed wavelength-axis store.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – `center` (Float64) and `wavelengths` (list of floats) columns
/// * `.json`    – `[{ "center": 500.0, "wavelengths": [...] }, ...]`
/// * `.csv`     – columns `center` and `wavelengths`, the latter semicolon-separated
///
/// Centers are used as exact keys, so they must be written with full precision.
pub fn load_axis_store(path: &Path) -> Result<WavelengthAxisMap> {
    let entries = match extension(path).as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    let store = WavelengthAxisMap::from_entries(entries)
        .with_context(|| format!("inconsistent axis store {}", path.display()))?;
    info!(
        "loaded {} wavelength axes ({} pixels) from {}",
        store.len(),
        store.pixel_count(),
        path.display()
    );
    Ok(store)
}

/// Load a JSON [`SweepConfig`]; absent fields keep their defaults.
pub fn load_config(path: &Path) -> Result<SweepConfig> {
    let text = std::fs::read_to_string(path).context("reading config file")?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AxisRecord {
    center: f64,
    wavelengths: Vec<f64>,
}

fn load_json(path: &Path) -> Result<Vec<(f64, Vec<f64>)>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let records: Vec<AxisRecord> = serde_json::from_str(&text).context("parsing JSON")?;
    Ok(records
        .into_iter()
        .map(|r| (r.center, r.wavelengths))
        .collect())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with `center` and `wavelengths`.
/// `wavelengths` holds semicolon-separated floats: `"489.9;489.95;490.0"`.
/// Other columns are ignored.
fn load_csv(path: &Path) -> Result<Vec<(f64, Vec<f64>)>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();

    let center_idx = headers
        .iter()
        .position(|h| h == "center")
        .context("CSV missing 'center' column")?;
    let axis_idx = headers
        .iter()
        .position(|h| h == "wavelengths")
        .context("CSV missing 'wavelengths' column")?;

    let mut entries = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let center_text = record.get(center_idx).unwrap_or("").trim();
        let center = center_text
            .parse::<f64>()
            .with_context(|| format!("Row {row_no}: center '{center_text}' is not a number"))?;
        let wavelengths = parse_semicolon_floats(record.get(axis_idx).unwrap_or(""), row_no)?;
        entries.push((center, wavelengths));
    }
    Ok(entries)
}

fn parse_semicolon_floats(s: &str, row: usize) -> Result<Vec<f64>> {
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, wavelengths[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Expected schema:
/// - `center`: Float64 – frame center; Float32 is rejected because widening
///   it would not reproduce the table's keys
/// - `wavelengths`: List<Float64|Float32> or LargeList<...>
fn load_parquet(path: &Path) -> Result<Vec<(f64, Vec<f64>)>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut entries = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let center_idx = schema
            .index_of("center")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'center' column"))?;
        let axis_idx = schema
            .index_of("wavelengths")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'wavelengths' column"))?;

        let centers = batch
            .column(center_idx)
            .as_any()
            .downcast_ref::<Float64Array>()
            .with_context(|| {
                format!(
                    "'center' must be Float64, got {:?}",
                    batch.column(center_idx).data_type()
                )
            })?;
        let axes = batch.column(axis_idx);

        for row in 0..batch.num_rows() {
            if centers.is_null(row) {
                bail!("Row {row}: null center");
            }
            let wavelengths = extract_f64_list(axes, row)
                .with_context(|| format!("Row {row}: failed to read 'wavelengths'"))?;
            entries.push((centers.value(row), wavelengths));
        }
    }
    Ok(entries)
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => col
            .as_any()
            .downcast_ref::<ListArray>()
            .context("expected ListArray")?
            .value(row),
        DataType::LargeList(_) => col
            .as_any()
            .downcast_ref::<LargeListArray>()
            .context("expected LargeListArray")?
            .value(row),
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        f64_arr
            .iter()
            .enumerate()
            .map(|(j, v)| v.with_context(|| format!("null wavelength at pixel {j}")))
            .collect()
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        f32_arr
            .iter()
            .enumerate()
            .map(|(j, v)| {
                v.map(f64::from)
                    .with_context(|| format!("null wavelength at pixel {j}"))
            })
            .collect()
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::AxisStore;
    use arrow::array::{Float64Builder, ListBuilder};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    #[test]
    fn json_store_keeps_exact_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("axes.json");
        std::fs::write(
            &path,
            r#"[{"center": 526.977, "wavelengths": [526.9, 527.0]},
                {"center": 553.64, "wavelengths": [553.6, 553.7]}]"#,
        )
        .unwrap();
        let store = load_axis_store(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup(526.977).unwrap(), &[526.9, 527.0]);
        assert_eq!(store.lookup(553.640).unwrap(), &[553.6, 553.7]);
    }

    #[test]
    fn csv_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("axes.csv");
        std::fs::write(
            &path,
            "center,wavelengths,note\n500.0,499.5;500.0;500.5,a\n600,599.5; 600.0 ;600.5,b\n",
        )
        .unwrap();
        let store = load_axis_store(&path).unwrap();
        assert_eq!(store.pixel_count(), 3);
        assert_eq!(store.lookup(600.0).unwrap(), &[599.5, 600.0, 600.5]);
    }

    #[test]
    fn csv_with_bad_number_names_the_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("axes.csv");
        std::fs::write(&path, "center,wavelengths\n500.0,1;2\n600.0,1;x\n").unwrap();
        let err = load_axis_store(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Row 1"), "{err:#}");
    }

    #[test]
    fn parquet_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("axes.parquet");

        let mut axes = ListBuilder::new(Float64Builder::new());
        for center in [500.0, 526.977] {
            for p in 0..4 {
                axes.values().append_value(center + p as f64);
            }
            axes.append(true);
        }
        let item = Arc::new(Field::new("item", DataType::Float64, true));
        let schema = Arc::new(Schema::new(vec![
            Field::new("center", DataType::Float64, false),
            Field::new("wavelengths", DataType::List(item), false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![500.0, 526.977])),
                Arc::new(axes.finish()),
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(std::fs::File::create(&path).unwrap(), schema, None)
            .unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let store = load_axis_store(&path).unwrap();
        assert_eq!(store.centers(), vec![500.0, 526.977]);
        assert_eq!(store.lookup(526.977).unwrap()[3], 526.977 + 3.0);
    }

    #[test]
    fn ragged_store_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("axes.json");
        std::fs::write(
            &path,
            r#"[{"center": 1.0, "wavelengths": [1.0]}, {"center": 2.0, "wavelengths": [1.0, 2.0]}]"#,
        )
        .unwrap();
        assert!(load_axis_store(&path).is_err());
    }

    #[test]
    fn unknown_extension() {
        let err = load_axis_store(Path::new("axes.bin")).unwrap_err();
        assert!(err.to_string().contains(".bin"));
    }

    #[test]
    fn config_from_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sweep.json");
        std::fs::write(&path, r#"{ "edge_trim": 8, "spike_filter": {} }"#).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.edge_trim, 8);
        assert_eq!(config.frames.len(), 50);
        assert!(config.spike_filter.is_some());
    }
}
