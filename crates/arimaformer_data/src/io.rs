//! CSV I/O for univariate series.

use std::path::Path;

use crate::error::{DataError, Result};

/// Column read when none is specified.
pub const DEFAULT_VALUE_COLUMN: &str = "Value";

/// Read one numeric column from a CSV file with a header row.
///
/// Other columns are ignored, so exports with timestamps or ids can be read
/// directly.
///
/// # Errors
///
/// Returns [`DataError::MissingColumn`] if the header lacks `column`,
/// [`DataError::Parse`] for a cell that is not a number and
/// [`DataError::EmptyDataset`] if the file has no data rows.
pub fn read_value_column<P: AsRef<Path>>(path: P, column: &str) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let idx = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| DataError::MissingColumn {
            column: column.to_string(),
            path: path.display().to_string(),
            available: headers.iter().collect::<Vec<_>>().join(", "),
        })?;

    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let raw = record.get(idx).unwrap_or_default();
        let value: f64 = raw.parse().map_err(|_| {
            // +2: one for the header, one for 1-based line numbers
            DataError::Parse(format!(
                "line {}: cannot parse {:?} in column '{}'",
                row + 2,
                raw,
                column
            ))
        })?;
        values.push(value);
    }

    if values.is_empty() {
        return Err(DataError::EmptyDataset);
    }

    tracing::debug!(path = %path.display(), column, n = values.len(), "read series");
    Ok(values)
}

/// Write a single-column CSV with a header row.
pub fn write_value_column<P: AsRef<Path>>(path: P, column: &str, values: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record([column])?;
    for value in values {
        writer.write_record([value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_named_column() {
        let file = csv_file("Date,Value\n2020-01-01,1.5\n2020-01-02, 2.5\n2020-01-03,-3\n");
        let values = read_value_column(file.path(), "Value").unwrap();
        assert_eq!(values, vec![1.5, 2.5, -3.0]);
    }

    #[test]
    fn test_missing_column() {
        let file = csv_file("Date,Price\n2020-01-01,1.5\n");
        let err = read_value_column(file.path(), "Value").unwrap_err();
        match err {
            DataError::MissingColumn { column, available, .. } => {
                assert_eq!(column, "Value");
                assert_eq!(available, "Date, Price");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unparsable_cell_reports_line() {
        let file = csv_file("Value\n1.0\nabc\n");
        let err = read_value_column(file.path(), "Value").unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn test_header_only_is_empty() {
        let file = csv_file("Value\n");
        assert!(matches!(
            read_value_column(file.path(), "Value"),
            Err(DataError::EmptyDataset)
        ));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        write_value_column(&path, DEFAULT_VALUE_COLUMN, &[0.25, 1.0, 4.5]).unwrap();
        let values = read_value_column(&path, DEFAULT_VALUE_COLUMN).unwrap();
        assert_eq!(values, vec![0.25, 1.0, 4.5]);
    }
}
