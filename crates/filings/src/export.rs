//! CSV output of a reconciled record set.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use filings_core::{EntityId, FilingError, RecordSet, Result};

/// Extension of every result file.
pub const OUTPUT_EXTENSION: &str = "csv";

/// File name for an entity and lookback, e.g. `AAPL_4_final_result.csv`.
#[must_use]
pub fn output_file_name(entity: &EntityId, lookback: usize) -> String {
    format!("{entity}_{lookback}_final_result.{OUTPUT_EXTENSION}")
}

/// Full path of the result file inside `dir`.
#[must_use]
pub fn output_path(dir: &Path, entity: &EntityId, lookback: usize) -> PathBuf {
    dir.join(output_file_name(entity, lookback))
}

/// Writes one row per record, in order, with a header row.
///
/// Missing parent directories are created.
pub fn write_csv(records: &RecordSet, path: &Path) -> Result<()> {
    let mut df = records.to_dataframe()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| FilingError::Export(format!("{}: {e}", path.display())))?;

    info!(path = %path.display(), rows = df.height(), "Wrote result file");
    Ok(())
}

/// Returns the first `rows` rows of the flattened records.
pub fn preview(records: &RecordSet, rows: usize) -> Result<DataFrame> {
    Ok(records.to_dataframe()?.head(Some(rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use filings_core::{FilingRecord, RecordKind};

    const HEADER: &str =
        "file,entity_id,record_kind,period_end,net_income,shares_outstanding,revenue,equity";

    fn records() -> RecordSet {
        RecordSet::from_records(vec![
            FilingRecord::new(
                "0000320193-23-000106.txt",
                EntityId::new("AAPL"),
                RecordKind::Annual,
                NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(),
            )
            .with_net_income(Some(96_995))
            .with_revenue(Some(383_285)),
            FilingRecord::new(
                "0000320193-23-000077.txt",
                EntityId::new("AAPL"),
                RecordKind::Quarterly,
                NaiveDate::from_ymd_opt(2023, 7, 1).unwrap(),
            ),
        ])
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("out"), &EntityId::new("aapl"), 4);
        assert_eq!(path, Path::new("out").join("AAPL_4_final_result.csv"));
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(&dir.path().join("nested"), &EntityId::new("AAPL"), 2);

        write_csv(&records(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            "0000320193-23-000106.txt,AAPL,10-K,2023-09-30,96995,,383285,"
        );
        assert_eq!(lines[2], "0000320193-23-000077.txt,AAPL,10-Q,2023-07-01,,,,");
    }

    #[test]
    fn test_write_csv_into_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(dir.path(), &EntityId::new("MSFT"), 1);

        write_csv(&records(), &path).unwrap();
        write_csv(&records(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_write_empty_set_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_csv(&RecordSet::new(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some(HEADER));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_preview_limits_rows() {
        let df = preview(&records(), 1).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 8);
    }
}
