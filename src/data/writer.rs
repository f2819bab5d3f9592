use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, ArrayRef, Float64Array, Float64Builder, Int64Array, ListBuilder, StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

use super::loader::extension;
use super::model::{MetadataValue, SpectralDataset, WavelengthAxisMap};

static MISSING: MetadataValue = MetadataValue::Null;

/// Write a dataset next to the formats the loader understands.  Dispatch by extension.
///
/// Every row carries `x` (wavelengths), `y` (counts) and one column per metadata key:
/// * `.parquet` – `x` / `y` as List<Float64>, metadata as typed columns
/// * `.json`    – `[{ "x": [...], "y": [...], ...meta }, ...]`
/// * `.csv`     – `x` / `y` as semicolon-separated floats
pub fn write_dataset(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    match extension(path).as_str() {
        "parquet" | "pq" => write_parquet(path, dataset)?,
        "json" => write_json(path, dataset)?,
        "csv" => write_csv(path, dataset)?,
        other => bail!("Unsupported file extension: .{other}"),
    }
    info!("wrote {} spectra to {}", dataset.len(), path.display());
    Ok(())
}

/// Write a wavelength-axis store in the layout [`super::loader::load_axis_store`] reads.
pub fn write_axis_store(path: &Path, store: &WavelengthAxisMap) -> Result<()> {
    match extension(path).as_str() {
        "parquet" | "pq" => {
            let schema = Arc::new(Schema::new(vec![
                Field::new("center", DataType::Float64, false),
                Field::new(
                    "wavelengths",
                    DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
                    false,
                ),
            ]));
            let centers: Vec<f64> = store.iter().map(|(c, _)| c).collect();
            let batch = RecordBatch::try_new(
                schema.clone(),
                vec![
                    Arc::new(Float64Array::from(centers)),
                    Arc::new(list_array(store.iter().map(|(_, axis)| axis))),
                ],
            )
            .context("building record batch")?;
            let file = std::fs::File::create(path).context("creating parquet file")?;
            let mut writer =
                ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
            writer.write(&batch).context("writing parquet batch")?;
            writer.close().context("closing parquet writer")?;
        }
        "json" => {
            let records: Vec<JsonValue> = store
                .iter()
                .map(|(center, axis)| serde_json::json!({ "center": center, "wavelengths": axis }))
                .collect();
            let file = std::fs::File::create(path).context("creating JSON file")?;
            serde_json::to_writer(std::io::BufWriter::new(file), &records)
                .context("writing JSON")?;
        }
        "csv" => {
            let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
            writer
                .write_record(["center", "wavelengths"])
                .context("writing CSV header")?;
            for (center, axis) in store.iter() {
                writer
                    .write_record([center.to_string(), join_semicolon(axis)])
                    .with_context(|| format!("writing axis for {center} nm"))?;
            }
            writer.flush().context("flushing CSV")?;
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
    info!("wrote {} wavelength axes to {}", store.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON writer
// ---------------------------------------------------------------------------

fn write_json(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    let records: Vec<JsonValue> = dataset
        .spectra
        .iter()
        .map(|sp| {
            let mut obj = Map::new();
            obj.insert("x".into(), sp.x.clone().into());
            obj.insert("y".into(), sp.y.clone().into());
            for (key, val) in &sp.metadata {
                obj.insert(key.clone(), metadata_to_json(val));
            }
            JsonValue::Object(obj)
        })
        .collect();
    let file = std::fs::File::create(path).context("creating JSON file")?;
    serde_json::to_writer(std::io::BufWriter::new(file), &records).context("writing JSON")
}

fn metadata_to_json(val: &MetadataValue) -> JsonValue {
    match val {
        MetadataValue::String(s) => JsonValue::String(s.clone()),
        MetadataValue::Integer(i) => (*i).into(),
        MetadataValue::Float(f) => (*f).into(),
        MetadataValue::Null => JsonValue::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

fn write_csv(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;

    let mut header = vec!["x".to_string(), "y".to_string()];
    header.extend(dataset.column_names.iter().cloned());
    writer.write_record(&header).context("writing CSV header")?;

    for (row_no, sp) in dataset.spectra.iter().enumerate() {
        let mut record = vec![join_semicolon(&sp.x), join_semicolon(&sp.y)];
        for col in &dataset.column_names {
            record.push(match sp.metadata.get(col) {
                None | Some(MetadataValue::Null) => String::new(),
                Some(MetadataValue::Float(v)) => v.to_string(),
                Some(other) => other.to_string(),
            });
        }
        writer
            .write_record(&record)
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn join_semicolon(values: &[f64]) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

fn write_parquet(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    let item = Arc::new(Field::new("item", DataType::Float64, true));
    let mut fields = vec![
        Field::new("x", DataType::List(item.clone()), false),
        Field::new("y", DataType::List(item), false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(list_array(dataset.spectra.iter().map(|sp| sp.x.as_slice()))),
        Arc::new(list_array(dataset.spectra.iter().map(|sp| sp.y.as_slice()))),
    ];

    for col in &dataset.column_names {
        let values: Vec<&MetadataValue> = dataset
            .spectra
            .iter()
            .map(|sp| sp.metadata.get(col).unwrap_or(&MISSING))
            .collect();
        let array = metadata_array(&values);
        fields.push(Field::new(col.as_str(), array.data_type().clone(), true));
        columns.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn list_array<'a>(rows: impl Iterator<Item = &'a [f64]>) -> arrow::array::ListArray {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in rows {
        builder.values().append_slice(row);
        builder.append(true);
    }
    builder.finish()
}

/// Narrowest Arrow type holding every value of a metadata column:
/// Int64 if all integers, Float64 if all numeric, else Utf8.
fn metadata_array(values: &[&MetadataValue]) -> ArrayRef {
    let present = || values.iter().filter(|v| !matches!(v, MetadataValue::Null));

    if present().all(|v| matches!(v, MetadataValue::Integer(_))) {
        return Arc::new(Int64Array::from(
            values
                .iter()
                .map(|v| match v {
                    MetadataValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ));
    }
    if present().all(|v| v.as_f64().is_some()) {
        return Arc::new(Float64Array::from(
            values.iter().map(|v| v.as_f64()).collect::<Vec<_>>(),
        ));
    }
    Arc::new(StringArray::from(
        values
            .iter()
            .map(|v| match v {
                MetadataValue::Null => None,
                other => Some(other.to_string()),
            })
            .collect::<Vec<_>>(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CollectedFrame;
    use arrow::array::{Array, ListArray};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::TempDir;

    fn dataset() -> SpectralDataset {
        SpectralDataset::from_frames(&[
            CollectedFrame {
                center_wavelength: 500.0,
                settled_wavelength: 500.012,
                center_pixel: 531,
                counts: vec![10.0, 11.5, 12.0],
                wavelengths: vec![499.95, 500.0, 500.05],
            },
            CollectedFrame {
                center_wavelength: 526.977,
                settled_wavelength: 526.989,
                center_pixel: 531,
                counts: vec![20.0, 21.0, 22.25],
                wavelengths: vec![526.927, 526.977, 527.027],
            },
        ])
    }

    #[test]
    fn parquet_columns_are_typed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sweep.parquet");
        write_dataset(&path, &dataset()).unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.num_rows(), 2);

        let schema = batch.schema();
        assert_eq!(
            schema.field_with_name("frame_index").unwrap().data_type(),
            &DataType::Int64
        );
        assert_eq!(
            schema.field_with_name("settled_wavelength").unwrap().data_type(),
            &DataType::Float64
        );

        let y = batch
            .column(schema.index_of("y").unwrap())
            .as_any()
            .downcast_ref::<ListArray>()
            .unwrap()
            .value(1);
        let y = y.as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(y.values().to_vec(), vec![20.0, 21.0, 22.25]);
    }

    #[test]
    fn json_rows_carry_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sweep.json");
        write_dataset(&path, &dataset()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<JsonValue> = serde_json::from_str(&text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["center_wavelength"], 526.977);
        assert_eq!(rows[1]["center_pixel"], 531);
        assert_eq!(rows[0]["x"][2], 500.05);
    }

    #[test]
    fn csv_uses_semicolon_lists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sweep.csv");
        write_dataset(&path, &dataset()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "x,y,center_pixel,center_wavelength,frame_index,settled_wavelength"
        );
        assert_eq!(
            lines.next().unwrap(),
            "499.95;500;500.05,10;11.5;12,531,500,0,500.012"
        );
    }

    #[test]
    fn mixed_metadata_falls_back_to_strings() {
        let values = [
            MetadataValue::Integer(1),
            MetadataValue::Null,
            MetadataValue::String("dark".into()),
        ];
        let refs: Vec<&MetadataValue> = values.iter().collect();
        let array = metadata_array(&refs);
        assert_eq!(array.data_type(), &DataType::Utf8);
        assert!(array.is_null(1));

        let numeric = [MetadataValue::Integer(1), MetadataValue::Float(2.5)];
        let refs: Vec<&MetadataValue> = numeric.iter().collect();
        assert_eq!(metadata_array(&refs).data_type(), &DataType::Float64);
    }

    #[test]
    fn axis_store_reloads_with_identical_keys() {
        use crate::data::loader::load_axis_store;
        use crate::data::model::AxisStore;
        use crate::instrument::sim::LinearDispersion;
        use crate::sweep::FrameTable;

        let table = FrameTable::production();
        let store = LinearDispersion {
            nm_per_pixel: 0.05,
            pixels: 16,
        }
        .axis_store(&table)
        .unwrap();

        let dir = TempDir::new().unwrap();
        for name in ["axes.parquet", "axes.json", "axes.csv"] {
            let path = dir.path().join(name);
            write_axis_store(&path, &store).unwrap();
            let loaded = load_axis_store(&path).unwrap();
            assert_eq!(loaded, store, "{name}");
            assert!(loaded.validate_against(&table).is_ok());
            for &center in table.centers() {
                assert!(loaded.lookup(center).is_ok(), "{name}: {center}");
            }
        }
    }

    #[test]
    fn unsupported_extension() {
        let dir = TempDir::new().unwrap();
        assert!(write_dataset(&dir.path().join("sweep.h5"), &dataset()).is_err());
    }
}
