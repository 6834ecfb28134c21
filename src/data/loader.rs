use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{Field, MeasurementRow, MeasurementTable};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a measurement table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `station`, `year` and the ten numeric columns
/// * `.parquet` – same column names, any integer/float physical types
/// * `.json`    – `[{ "station": "...", "year": 2013, "PM2.5": 4.0, ... }, ...]`
pub fn load_file(path: &Path) -> Result<MeasurementTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => read_csv(File::open(path)?)?,
        "parquet" | "pq" => load_parquet(path)?,
        "json" => read_json(File::open(path)?)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };
    log::debug!(
        "parsed {} rows from {} ({} stations)",
        table.len(),
        path.display(),
        table.stations().len()
    );
    Ok(table)
}

/// Every column the pipeline reads.
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    ["station", "year"]
        .into_iter()
        .chain(Field::ALL.iter().map(|f| f.column()))
}

fn check_columns<'a>(available: impl IntoIterator<Item = &'a str>) -> Result<(), LoadError> {
    let available: HashSet<&str> = available.into_iter().collect();
    let missing: Vec<String> = required_columns()
        .filter(|col| !available.contains(col))
        .map(String::from)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns(missing))
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse CSV measurements. Columns other than the required ones are ignored;
/// empty cells and `NA`-style tokens become missing values.
pub fn read_csv<R: Read>(input: R) -> Result<MeasurementTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    check_columns(headers.iter())?;

    let rows = reader
        .deserialize::<MeasurementRow>()
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MeasurementTable::from_rows(rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
/// Numeric keys may be absent or `null`; `station` and `year` may not.
pub fn read_json<R: Read>(input: R) -> Result<MeasurementTable, LoadError> {
    let rows: Vec<MeasurementRow> = serde_json::from_reader(BufReader::new(input))?;
    Ok(MeasurementTable::from_rows(rows))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of measurements.
///
/// Columns are cast rather than matched by physical type, so files written by
/// both **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`)
/// load regardless of whether `year` is Int32/Int64 or values are Float32/64.
fn load_parquet(path: &Path) -> Result<MeasurementTable, LoadError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    check_columns(builder.schema().fields().iter().map(|f| f.name().as_str()))?;
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let offset = rows.len();
        rows.extend(rows_from_batch(&batch, offset)?);
    }

    Ok(MeasurementTable::from_rows(rows))
}

/// Convert one record batch. `offset` is the global index of its first row,
/// used for error messages.
fn rows_from_batch(batch: &RecordBatch, offset: usize) -> Result<Vec<MeasurementRow>, LoadError> {
    let column = |name: &str| {
        batch
            .column_by_name(name)
            .ok_or_else(|| LoadError::MissingColumns(vec![name.to_string()]))
    };

    let stations = cast(column("station")?, &DataType::Utf8)?;
    let stations = stations.as_string::<i32>();
    let years = cast(column("year")?, &DataType::Int64)?;
    let years = years.as_primitive::<Int64Type>();

    let mut numeric = Vec::with_capacity(Field::ALL.len());
    for field in Field::ALL {
        let values = cast(column(field.column())?, &DataType::Float64)?;
        numeric.push((field, values));
    }

    let invalid = |row: usize, column: &str, message: &str| LoadError::InvalidValue {
        row: offset + row,
        column: column.to_string(),
        message: message.to_string(),
    };

    let mut rows = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        if stations.is_null(i) {
            return Err(invalid(i, "station", "station is null"));
        }
        if years.is_null(i) {
            return Err(invalid(i, "year", "year is null"));
        }
        let year = i32::try_from(years.value(i))
            .map_err(|_| invalid(i, "year", "year out of range"))?;

        let mut row = MeasurementRow::new(stations.value(i), year);
        for (field, values) in &numeric {
            let values = values.as_primitive::<Float64Type>();
            let value = (!values.is_null(i)).then(|| values.value(i));
            row.set(*field, value);
        }
        rows.push(row);
    }
    Ok(rows)
}
