use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Clarity, ColorGrade, Cut, DataError, Dataset, Record};

/// Columns every source file must carry.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "price", "carat", "cut", "color", "clarity", "depth", "table", "x", "y", "z",
];

// ---------------------------------------------------------------------------
// Memoized entry-point
// ---------------------------------------------------------------------------

static CACHE: OnceLock<Mutex<HashMap<PathBuf, Arc<Dataset>>>> = OnceLock::new();

/// Load a gemstone dataset, memoized per source path for the process
/// lifetime.  Repeated calls with the same path return the same `Arc`
/// without touching storage; the cached value is never invalidated.
pub fn load(path: &Path) -> Result<Arc<Dataset>> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let cache = CACHE.get_or_init(Default::default);

    if let Some(ds) = cache.lock().ok().and_then(|m| m.get(&key).cloned()) {
        return Ok(ds);
    }

    let ds = Arc::new(load_file(path)?);
    if let Ok(mut map) = cache.lock() {
        map.insert(key, Arc::clone(&ds));
    }
    Ok(ds)
}

/// Load a gemstone dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, comma-delimited (the deployed format)
/// * `.parquet` – flat scalar columns with the same names
/// * `.json`    – `[{ "carat": 0.5, "cut": "Ideal", ... }, ...]`
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV file")?;
            read_csv(file)?
        }
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let total = table.records.len();
    let records: Vec<Record> = table
        .records
        .into_iter()
        .filter(Record::has_valid_dimensions)
        .collect();
    let dropped = total - records.len();

    log::info!(
        "Loaded {} records from {} ({dropped} rows with non-positive dimensions dropped)",
        records.len(),
        path.display()
    );

    let dataset = Dataset::from_records(records, table.columns);
    if dataset.is_empty() {
        log::warn!("{} contains no valid records", path.display());
    }
    Ok(dataset)
}

/// A parsed table before the load-time dimension filter.
#[derive(Debug)]
struct RawTable {
    columns: Vec<String>,
    records: Vec<Record>,
}

fn check_required(columns: &[String]) -> Result<(), DataError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !columns.iter().any(|h| h == *c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DataError::MissingColumns { columns: missing })
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Parse CSV from any reader.  Split out from [`load_file`] so tests can
/// feed string fixtures without touching the filesystem.
fn read_csv<R: io::Read>(input: R) -> Result<RawTable> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    check_required(&headers)?;

    let idx = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
    let (carat_i, cut_i, color_i, clarity_i) =
        (idx("carat"), idx("cut"), idx("color"), idx("clarity"));
    let (depth_i, table_i, price_i) = (idx("depth"), idx("table"), idx("price"));
    let (x_i, y_i, z_i) = (idx("x"), idx("y"), idx("z"));

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let field = |i: usize| row.get(i).unwrap_or("").trim();

        let num = |i: usize, col: &str| -> Result<f64> {
            field(i)
                .parse::<f64>()
                .with_context(|| format!("Row {row_no}, {col}: '{}' is not a number", field(i)))
        };

        records.push(Record {
            carat: num(carat_i, "carat")?,
            cut: parse_cut(field(cut_i), row_no)?,
            color: parse_color(field(color_i), row_no)?,
            clarity: parse_clarity(field(clarity_i), row_no)?,
            depth: num(depth_i, "depth")?,
            table: num(table_i, "table")?,
            price: num(price_i, "price")?,
            x: num(x_i, "x")?,
            y: num(y_i, "y")?,
            z: num(z_i, "z")?,
        });
    }

    Ok(RawTable {
        columns: headers,
        records,
    })
}

fn parse_cut(s: &str, row: usize) -> Result<Cut> {
    Cut::parse(s).with_context(|| format!("Row {row}: unknown cut grade '{s}'"))
}

fn parse_color(s: &str, row: usize) -> Result<ColorGrade> {
    ColorGrade::parse(s).with_context(|| format!("Row {row}: unknown color grade '{s}'"))
}

fn parse_clarity(s: &str, row: usize) -> Result<Clarity> {
    Clarity::parse(s).with_context(|| format!("Row {row}: unknown clarity grade '{s}'"))
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "carat": 0.5, "cut": "Ideal", "color": "E", "clarity": "VS1",
///     "depth": 61.5, "table": 55.0, "price": 1500,
///     "x": 5.1, "y": 5.2, "z": 3.1 },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    // Column set = union of keys across rows, so a column missing from
    // every row is reported as missing rather than as a row parse error.
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Some(obj) = row.as_object() {
            for key in obj.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    check_required(&columns)?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let num = |col: &str| -> Result<f64> {
            obj.get(col)
                .and_then(|v| v.as_f64())
                .with_context(|| format!("Row {i}: missing or non-numeric '{col}'"))
        };
        let text = |col: &str| -> Result<&str> {
            obj.get(col)
                .and_then(|v| v.as_str())
                .with_context(|| format!("Row {i}: missing or non-string '{col}'"))
        };

        records.push(Record {
            carat: num("carat")?,
            cut: parse_cut(text("cut")?, i)?,
            color: parse_color(text("color")?, i)?,
            clarity: parse_clarity(text("clarity")?, i)?,
            depth: num("depth")?,
            table: num("table")?,
            price: num("price")?,
            x: num("x")?,
            y: num("y")?,
            z: num("z")?,
        });
    }

    Ok(RawTable { columns, records })
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns.  Numeric columns may be
/// Float64/Float32/Int64/Int32 (Pandas writes `price` as int64); the grade
/// columns must be strings.
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        if columns.is_empty() {
            columns = schema.fields().iter().map(|f| f.name().clone()).collect();
            check_required(&columns)?;
        }

        let col = |name: &str| -> Result<&Arc<dyn Array>> {
            let i = schema
                .index_of(name)
                .map_err(|_| DataError::MissingColumns {
                    columns: vec![name.to_string()],
                })?;
            Ok(batch.column(i))
        };

        let carat_c = col("carat")?;
        let cut_c = col("cut")?;
        let color_c = col("color")?;
        let clarity_c = col("clarity")?;
        let depth_c = col("depth")?;
        let table_c = col("table")?;
        let price_c = col("price")?;
        let x_c = col("x")?;
        let y_c = col("y")?;
        let z_c = col("z")?;

        for row in 0..batch.num_rows() {
            records.push(Record {
                carat: numeric_at(carat_c, row, "carat")?,
                cut: parse_cut(string_at(cut_c, row, "cut")?.as_str(), row)?,
                color: parse_color(string_at(color_c, row, "color")?.as_str(), row)?,
                clarity: parse_clarity(string_at(clarity_c, row, "clarity")?.as_str(), row)?,
                depth: numeric_at(depth_c, row, "depth")?,
                table: numeric_at(table_c, row, "table")?,
                price: numeric_at(price_c, row, "price")?,
                x: numeric_at(x_c, row, "x")?,
                y: numeric_at(y_c, row, "y")?,
                z: numeric_at(z_c, row, "z")?,
            });
        }
    }

    Ok(RawTable { columns, records })
}

/// Extract a scalar numeric value from an Arrow column at a given row.
fn numeric_at(col: &Arc<dyn Array>, row: usize, name: &str) -> Result<f64> {
    if col.is_null(row) {
        bail!("Row {row}: null value in '{name}'");
    }
    match col.data_type() {
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            Ok(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            Ok(arr.value(row) as f64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Ok(arr.value(row) as f64)
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Ok(arr.value(row) as f64)
        }
        other => bail!("Column '{name}' has type {other:?}, expected a numeric type"),
    }
}

/// Extract a scalar string value from an Arrow column at a given row.
fn string_at(col: &Arc<dyn Array>, row: usize, name: &str) -> Result<String> {
    if col.is_null(row) {
        bail!("Row {row}: null value in '{name}'");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => {
            use arrow::array::AsArray;
            Ok(col.as_string::<i64>().value(row).to_string())
        }
        other => bail!("Column '{name}' has type {other:?}, expected a string type"),
    }
}
