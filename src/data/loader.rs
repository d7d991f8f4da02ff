use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{Field, NumericField, Record, RecordSet};
use crate::error::LoadError;

/// Columns every source must provide, in header order.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Employee Name",
    "Store",
    "Entity Id",
    "Country",
    "Audit Status",
    "Result",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an audit dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with at least the [`REQUIRED_COLUMNS`]
/// * `.json`    – `[{ "Employee Name": "...", "Result": 87, ... }, ...]`
/// * `.parquet` – one column per field, any string or numeric type
pub fn load_file(path: &Path) -> Result<RecordSet, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let io_err = |source| LoadError::Io {
        path: path.display().to_string(),
        source,
    };

    match ext.as_str() {
        "csv" => read_csv(File::open(path).map_err(io_err)?),
        "json" => read_json(&std::fs::read_to_string(path).map_err(io_err)?),
        "parquet" | "pq" => read_parquet(File::open(path).map_err(io_err)?),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }
}

/// Permissive numeric coercion: anything that is not a finite number is missing.
pub fn parse_score(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn require_columns<'a>(headers: impl IntoIterator<Item = &'a str>) -> Result<(), LoadError> {
    let present: Vec<&str> = headers.into_iter().map(str::trim).collect();
    match REQUIRED_COLUMNS.iter().find(|c| !present.contains(*c)) {
        Some(missing) => Err(LoadError::MissingColumn(missing.to_string())),
        None => Ok(()),
    }
}

fn finish(records: Vec<Record>) -> RecordSet {
    let set = RecordSet::from_records(records);
    log::info!(
        "Loaded {} audit records ({} without a numeric {})",
        set.len(),
        set.missing_results(),
        NumericField::Result.column_name()
    );
    set
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Employee Name")]
    employee_name: String,
    #[serde(rename = "Store")]
    store: String,
    #[serde(rename = "Entity Id")]
    entity_id: String,
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Audit Status")]
    audit_status: String,
    #[serde(rename = "Result")]
    result: String,
}

/// Read CSV with a header row. Extra columns are ignored.
pub fn read_csv<R: Read>(source: R) -> Result<RecordSet, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    require_columns(reader.headers()?.iter())?;

    let mut records = Vec::new();
    for (row_no, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        let result = parse_score(&row.result);
        if result.is_none() {
            log::debug!("CSV row {row_no}: non-numeric Result '{}'", row.result);
        }
        records.push(Record {
            employee_name: row.employee_name,
            store: row.store,
            entity_id: row.entity_id,
            country: row.country,
            audit_status: row.audit_status,
            result,
        });
    }

    Ok(finish(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (the `df.to_json(orient='records')` layout).
pub fn read_json(text: &str) -> Result<RecordSet, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let rows = root
        .as_array()
        .ok_or_else(|| LoadError::InvalidShape("expected top-level JSON array".into()))?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj: BTreeMap<&str, &JsonValue> = row
            .as_object()
            .ok_or_else(|| LoadError::InvalidShape(format!("row {i} is not a JSON object")))?
            .iter()
            .map(|(k, v)| (k.trim(), v))
            .collect();
        require_columns(obj.keys().copied())?;

        let text = |field: Field| json_cell(&obj, field.column_name()).map(json_to_text);
        let result = match json_cell(&obj, NumericField::Result.column_name())? {
            JsonValue::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            JsonValue::String(s) => parse_score(s),
            _ => None,
        };
        if result.is_none() {
            log::debug!("JSON row {i}: non-numeric Result");
        }

        records.push(Record {
            employee_name: text(Field::EmployeeName)?,
            store: text(Field::Store)?,
            entity_id: text(Field::EntityId)?,
            country: text(Field::Country)?,
            audit_status: text(Field::AuditStatus)?,
            result,
        });
    }

    Ok(finish(records))
}

fn json_cell<'a>(
    row: &BTreeMap<&str, &'a JsonValue>,
    name: &str,
) -> Result<&'a JsonValue, LoadError> {
    row.get(name)
        .copied()
        .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
}

fn json_to_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Read a Parquet file written by Pandas (`df.to_parquet()`) or Polars.
///
/// Text columns may use any Arrow type that renders to a string; `Result`
/// may be integer, float or text.
pub fn read_parquet<R: ChunkReader + 'static>(source: R) -> Result<RecordSet, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(source)?;

    // Column positions by trimmed name, checked before any row is read.
    let schema = builder.schema().clone();
    require_columns(schema.fields().iter().map(|f| f.name().as_str()))?;
    let positions: BTreeMap<&str, usize> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name().trim(), i))
        .collect();

    let reader = builder.build()?;
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;

        let column = |name: &str| -> Result<Arc<dyn Array>, LoadError> {
            let idx = positions
                .get(name)
                .copied()
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
            Ok(batch.column(idx).clone())
        };

        let names = column(Field::EmployeeName.column_name())?;
        let stores = column(Field::Store.column_name())?;
        let entities = column(Field::EntityId.column_name())?;
        let countries = column(Field::Country.column_name())?;
        let statuses = column(Field::AuditStatus.column_name())?;
        let results = column(NumericField::Result.column_name())?;

        for row in 0..batch.num_rows() {
            records.push(Record {
                employee_name: cell_text(&names, row)?,
                store: cell_text(&stores, row)?,
                entity_id: cell_text(&entities, row)?,
                country: cell_text(&countries, row)?,
                audit_status: cell_text(&statuses, row)?,
                result: cell_number(&results, row)?,
            });
        }
    }

    Ok(finish(records))
}

// -- Parquet / Arrow helpers --

fn cell_text(col: &Arc<dyn Array>, row: usize) -> Result<String, LoadError> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    Ok(array_value_to_string(col, row)?.trim().to_string())
}

fn cell_number(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>, LoadError> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| a.value(row)),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Utf8 => parse_score(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => parse_score(col.as_string::<i64>().value(row)),
        _ => parse_score(&array_value_to_string(col, row)?),
    };
    Ok(value.filter(|v| v.is_finite()))
}
