//! Fitness activity store.
//!
//! Activities come from watch-export CSV files dropped into a directory;
//! each file's rows become header-keyed records. There is no live upstream,
//! the directory is the source of truth.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::error::Result;

pub struct FitnessStore {
    export_dir: PathBuf,
}

impl FitnessStore {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    /// All activity records across every export file. A missing directory
    /// means no exports yet, not an error; unreadable files are skipped
    /// with a warning.
    pub fn activities(&self) -> Result<Vec<HashMap<String, String>>> {
        let entries = match fs::read_dir(&self.export_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut activities = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            match read_activity_file(&path) {
                Ok(mut records) => activities.append(&mut records),
                Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable export"),
            }
        }
        Ok(activities)
    }
}

fn read_activity_file(path: &PathBuf) -> Result<Vec<HashMap<String, String>>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn activities_collect_rows_across_files() {
        let dir = TempDir::new().unwrap();
        let mut f = fs::File::create(dir.path().join("running.csv")).unwrap();
        writeln!(f, "Activity Type,Distance,Calories").unwrap();
        writeln!(f, "Running,5.2,410").unwrap();
        let mut f = fs::File::create(dir.path().join("cycling.csv")).unwrap();
        writeln!(f, "Activity Type,Distance,Calories").unwrap();
        writeln!(f, "Cycling,20.0,550").unwrap();
        // Non-CSV files in the export directory are ignored.
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let store = FitnessStore::new(dir.path());
        let mut activities = store.activities().unwrap();
        activities.sort_by(|a, b| a["Activity Type"].cmp(&b["Activity Type"]));
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0]["Activity Type"], "Cycling");
        assert_eq!(activities[1]["Distance"], "5.2");
    }

    #[test]
    fn missing_export_dir_is_empty() {
        let store = FitnessStore::new("/nonexistent/exports");
        assert!(store.activities().unwrap().is_empty());
    }
}
