//! Input discovery for the ingest command
//!
//! Expands command-line inputs (files, directories and glob patterns) into the
//! list of CSV files to ingest and checks each file before it is opened.

use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::constants::CSV_EXTENSION;

/// Expand inputs into a sorted, de-duplicated list of file paths
///
/// Directories contribute every `.csv` file below them. Glob patterns are
/// expanded as given. Plain paths are kept even without a `.csv` extension so
/// that [`check_input_file`] can reject them with a useful message.
pub fn discover_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for input in inputs {
        if is_glob_pattern(input) {
            let matches = glob::glob(input)
                .with_context(|| format!("Invalid glob pattern '{}'", input))?;
            let before = files.len();
            for entry in matches {
                let path = entry.with_context(|| format!("Failed to expand '{}'", input))?;
                if path.is_dir() {
                    files.extend(csv_files_in(&path));
                } else {
                    files.insert(path);
                }
            }
            if files.len() == before {
                bail!("Pattern '{}' did not match any files", input);
            }
            continue;
        }

        let path = Path::new(input);
        if path.is_dir() {
            let found = csv_files_in(path);
            debug!("Found {} CSV files in {}", found.len(), path.display());
            files.extend(found);
        } else if path.exists() {
            files.insert(path.to_path_buf());
        } else {
            bail!("Input path does not exist: {}", path.display());
        }
    }

    if files.is_empty() {
        bail!("No CSV files found in the given inputs");
    }

    Ok(files.into_iter().collect())
}

/// Check that `path` is a non-empty CSV file and return its stored file name
pub fn check_input_file(path: &Path) -> Result<String> {
    if !has_csv_extension(path) {
        bail!("File must have a .{} extension: {}", CSV_EXTENSION, path.display());
    }

    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
    if metadata.len() == 0 {
        bail!("File is empty: {}", path.display());
    }

    file_name_of(path)
}

/// Base name of `path`, used as the aggregate key
pub fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("Path has no usable file name: {}", path.display()))
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn csv_files_in(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file() && has_csv_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn as_input(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_directory_is_walked_for_csv_files() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "a.csv", "x");
        write(temp_dir.path(), "nested/b.CSV", "x");
        write(temp_dir.path(), "notes.txt", "x");

        let files = discover_inputs(&[as_input(temp_dir.path())]).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name_of(p).unwrap()).collect();

        assert_eq!(files.len(), 2);
        assert!(names.contains(&"a.csv".to_string()));
        assert!(names.contains(&"b.CSV".to_string()));
    }

    #[test]
    fn test_glob_pattern_is_expanded() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "one.csv", "x");
        write(temp_dir.path(), "two.csv", "x");
        write(temp_dir.path(), "three.txt", "x");

        let pattern = as_input(&temp_dir.path().join("*.csv"));
        let files = discover_inputs(&[pattern]).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_unmatched_glob_fails() {
        let temp_dir = TempDir::new().unwrap();
        let pattern = as_input(&temp_dir.path().join("*.csv"));
        assert!(discover_inputs(&[pattern]).is_err());
    }

    #[test]
    fn test_duplicates_are_removed() {
        let temp_dir = TempDir::new().unwrap();
        let file = write(temp_dir.path(), "a.csv", "x");

        let files = discover_inputs(&[as_input(&file), as_input(temp_dir.path())]).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = as_input(&temp_dir.path().join("missing.csv"));
        let err = discover_inputs(&[missing]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_check_input_file() {
        let temp_dir = TempDir::new().unwrap();
        let good = write(temp_dir.path(), "metrics.csv", "Date;ExecutionTime;Value\n");
        let upper = write(temp_dir.path(), "METRICS.CSV", "x");
        let empty = write(temp_dir.path(), "empty.csv", "");
        let wrong = write(temp_dir.path(), "metrics.txt", "x");

        assert_eq!(check_input_file(&good).unwrap(), "metrics.csv");
        assert_eq!(check_input_file(&upper).unwrap(), "METRICS.CSV");
        assert!(check_input_file(&empty).unwrap_err().to_string().contains("empty"));
        assert!(check_input_file(&wrong).unwrap_err().to_string().contains(".csv extension"));
    }
}
