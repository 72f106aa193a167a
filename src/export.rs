//! CSV export of dataset rows.

use crate::error::{Result, StoreError};
use crate::store::labels::column_label;
use crate::store::Dataset;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the header and the given rows of a 1-D or 2-D dataset as CSV.
/// Returns the number of data rows written. NaN is written as an empty field.
pub fn write_csv<W: Write>(mut out: W, dataset: &Dataset, rows: &[usize]) -> Result<usize> {
    if dataset.rank() > 2 {
        return Err(StoreError::Rank(dataset.rank()));
    }
    let header: Vec<String> = if dataset.rank() <= 1 {
        vec!["Value".to_string()]
    } else {
        (0..dataset.ncols())
            .map(|i| quote(&column_label(&dataset.columns, i)))
            .collect()
    };
    writeln!(out, "{}", header.join(","))?;

    let mut written = 0;
    for &r in rows {
        let row = dataset.row(r);
        if row.is_empty() {
            continue;
        }
        let fields: Vec<String> = row.iter().map(|&v| format_value(v)).collect();
        writeln!(out, "{}", fields.join(","))?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

pub fn export_csv(path: &Path, dataset: &Dataset, rows: &[usize]) -> Result<usize> {
    let file = File::create(path)?;
    let written = write_csv(BufWriter::new(file), dataset, rows)?;
    log::info!("exported {written} rows to {}", path.display());
    Ok(written)
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

fn quote(field: &str) -> String {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DType;
    use tempfile::TempDir;

    fn matrix() -> Dataset {
        Dataset {
            shape: vec![3, 2],
            dtype: DType::Float64,
            values: vec![0.0, 1.5, 0.5, f64::NAN, 1.0, -2.0],
            columns: vec!["time".into(), "volts, raw".into()],
        }
    }

    #[test]
    fn test_selected_rows() {
        let mut buf = Vec::new();
        let n = write_csv(&mut buf, &matrix(), &[1, 2, 9]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "time,\"volts, raw\"\n0.5,\n1,-2\n"
        );
    }

    #[test]
    fn test_one_dimensional_header() {
        let ds = Dataset {
            shape: vec![2],
            dtype: DType::Float64,
            values: vec![3.0, 4.25],
            columns: vec!["ignored".into()],
        };
        let mut buf = Vec::new();
        write_csv(&mut buf, &ds, &[0, 1]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Value\n3\n4.25\n");
    }

    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        assert_eq!(export_csv(&path, &matrix(), &[0]).unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "time,\"volts, raw\"\n0,1.5\n");
    }

    #[test]
    fn test_rank_three_rejected() {
        let ds = Dataset {
            shape: vec![1, 1, 1],
            ..matrix()
        };
        assert!(matches!(write_csv(Vec::new(), &ds, &[0]), Err(StoreError::Rank(3))));
    }
}
