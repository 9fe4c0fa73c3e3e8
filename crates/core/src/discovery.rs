// Copyright 2025 FIO Exporter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Locates the result files belonging to one series.
//!
//! A series is a substring such as `4k_randread` (block size and operation)
//! shared by the file names of every run of the same benchmark
//! configuration. Files are returned sorted by name so that repeated runs
//! replay the same time series.

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension carried by fio JSON result files.
pub const RESULT_EXTENSION: &str = ".json";

/// Names of the result files in `directory` that contain `series`, sorted
/// ascending.
///
/// Hidden (dot-prefixed) files are ignored. An empty list is returned when
/// nothing matches. The process working directory is left untouched.
pub fn discover_series_files(series: &str, directory: &Path) -> Result<Vec<String>> {
    let discovery_error = |source| Error::Discovery {
        directory: directory.to_path_buf(),
        source,
    };

    let mut names = BTreeSet::new();
    for entry in std::fs::read_dir(directory).map_err(discovery_error)? {
        let entry = entry.map_err(discovery_error)?;

        let Ok(name) = entry.file_name().into_string() else {
            debug!(entry = ?entry.file_name(), "Skipping non UTF-8 file name");
            continue;
        };
        if !name.contains(series) || !name.ends_with(RESULT_EXTENSION) {
            continue;
        }
        // Editor swap files and AppleDouble `._` companions.
        if name.starts_with('.') {
            debug!(entry = %name, "Skipping hidden file");
            continue;
        }
        // Follows symlinks.
        if !entry.path().is_file() {
            debug!(entry = %name, "Skipping matching entry that is not a file");
            continue;
        }
        names.insert(name);
    }

    Ok(names.into_iter().collect())
}

/// Like [`discover_series_files`], with each name joined onto `directory`.
pub fn series_paths(series: &str, directory: &Path) -> Result<Vec<PathBuf>> {
    Ok(discover_series_files(series, directory)?
        .into_iter()
        .map(|name| directory.join(name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "{}").unwrap();
    }

    #[test]
    fn test_discovers_sorted_matches_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "4k_randread_3.json",
            "4k_randread_1.json",
            "4k_randread_2.json",
            "4k_randwrite_1.json",
            "4k_randread_1.log",
            "64k_read_1.json",
        ] {
            touch(dir.path(), name);
        }

        let files = discover_series_files("4k_randread", dir.path()).unwrap();
        assert_eq!(
            files,
            vec![
                "4k_randread_1.json",
                "4k_randread_2.json",
                "4k_randread_3.json"
            ]
        );
    }

    #[test]
    fn test_order_is_lexicographic_not_numeric() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["s_10.json", "s_9.json", "s_1.json"] {
            touch(dir.path(), name);
        }
        let files = discover_series_files("s_", dir.path()).unwrap();
        assert_eq!(files, vec!["s_1.json", "s_10.json", "s_9.json"]);
    }

    #[test]
    fn test_series_may_appear_anywhere_in_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "host1-4M_randrw-2.json");
        let files = discover_series_files("4M_randrw", dir.path()).unwrap();
        assert_eq!(files, vec!["host1-4M_randrw-2.json"]);
    }

    #[test]
    fn test_no_matches_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "other.json");
        assert!(discover_series_files("4k_read", dir.path())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_matching_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("4k_read_archive.json")).unwrap();
        touch(dir.path(), "4k_read_1.json");
        let files = discover_series_files("4k_read", dir.path()).unwrap();
        assert_eq!(files, vec!["4k_read_1.json"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = discover_series_files("4k", &missing).unwrap_err();
        assert!(matches!(err, Error::Discovery { .. }));
    }

    #[test]
    fn test_working_directory_is_untouched() {
        let before = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "4k_read_1.json");
        discover_series_files("4k_read", dir.path()).unwrap();
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_hidden_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "4k_randread_1.json");
        touch(dir.path(), "._4k_randread_1.json");
        touch(dir.path(), ".4k_randread_2.json");

        let files = discover_series_files("4k_randread", dir.path()).unwrap();
        assert_eq!(files, vec!["4k_randread_1.json".to_string()]);
    }

    #[test]
    fn test_series_paths_join_directory() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "4k_read_1.json");
        let paths = series_paths("4k_read", dir.path()).unwrap();
        assert_eq!(paths, vec![dir.path().join("4k_read_1.json")]);
    }
}
