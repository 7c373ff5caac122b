use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::error::ArchiveError;
use crate::models::RunRecord;

pub fn artifact_name(date: NaiveDate) -> String {
    format!("prices_{}.json", date.format("%Y_%m_%d"))
}

/// Writes `record` to `dir/prices_YYYY_MM_DD.json`, replacing any artifact
/// from an earlier run on the same day.
///
/// The document goes to a sibling temp file first and is renamed into place,
/// so a reader never sees a half-written file.
pub fn save_run(record: &RunRecord, dir: &Path) -> Result<PathBuf, ArchiveError> {
    let json = serde_json::to_string_pretty(record)?;

    let path = dir.join(artifact_name(record.run_date()));
    let tmp = path.with_extension("json.tmp");
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ArchiveError::Io { path, source }
    };

    fs::create_dir_all(dir).map_err(io_err(dir))?;
    fs::write(&tmp, json.as_bytes()).map_err(io_err(&tmp))?;
    fs::rename(&tmp, &path).map_err(io_err(&path))?;

    info!(path = %path.display(), items = record.items().len(), "run artifact written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductRecord;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 7).unwrap()
    }

    fn record(name: &str, price: f64) -> ProductRecord {
        ProductRecord {
            name: name.to_owned(),
            matched_title: "Köy Yumurtası".to_owned(),
            price,
            unit: "adet".to_owned(),
            promotion_flag: String::new(),
        }
    }

    #[test]
    fn artifact_is_named_by_date() {
        assert_eq!(artifact_name(date()), "prices_2024_02_07.json");
    }

    #[test]
    fn writes_pretty_utf8_without_escaping() {
        let dir = tempfile::tempdir().unwrap();
        let mut run = RunRecord::new(date(), "Migros");
        run.push(record("yumurta", 99.5));

        let path = save_run(&run, dir.path()).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert!(text.contains("\n  \"date\": \"2024-02-07\""), "{text}");
        assert!(text.contains("Köy Yumurtası"), "non-ASCII must be kept: {text}");
        assert!(!dir.path().join("prices_2024_02_07.json.tmp").exists());
    }

    #[test]
    fn same_day_rerun_overwrites_instead_of_merging() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = RunRecord::new(date(), "Migros");
        first.push(record("yumurta", 99.5));
        first.push(record("süt", 42.5));
        save_run(&first, dir.path()).unwrap();

        let mut second = RunRecord::new(date(), "Migros");
        second.push(record("ekmek", 12.5));
        let path = save_run(&second, dir.path()).unwrap();

        let stored: RunRecord =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(stored, second);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("prices");
        let run = RunRecord::new(date(), "Migros");

        let path = save_run(&run, &nested).unwrap();

        assert_eq!(path, nested.join("prices_2024_02_07.json"));
        assert!(path.exists());
    }
}
