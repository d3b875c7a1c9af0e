//! Directory scanner for checking many JSON record files at once

use crate::error::Result;
use crate::parser::{parse_json_with, ParseOptions};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Result of parsing one discovered file
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Full path to the file
    pub path: PathBuf,
    /// `(rows, columns)` on success, the error message on failure
    pub outcome: std::result::Result<(usize, usize), String>,
}

impl ScannedFile {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Result of scanning directories
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Root directories that were scanned
    pub roots: Vec<PathBuf>,
    /// Discovered files, sorted by path
    pub files: Vec<ScannedFile>,
}

impl ScanResult {
    /// Files that parsed successfully
    pub fn parsed(&self) -> impl Iterator<Item = &ScannedFile> {
        self.files.iter().filter(|f| f.is_ok())
    }

    /// Files that were rejected
    pub fn rejected(&self) -> impl Iterator<Item = &ScannedFile> {
        self.files.iter().filter(|f| !f.is_ok())
    }
}

/// Walk the roots for `.json` files and try to parse each one
///
/// Per-file parse failures are recorded in the result; only traversal
/// errors abort the scan.
pub fn scan_directory<P: AsRef<Path>>(roots: &[P], options: &ParseOptions) -> Result<ScanResult> {
    let mut files = Vec::new();

    for root in roots {
        for entry in WalkDir::new(root.as_ref()).follow_links(true) {
            let entry = entry?;
            let path = entry.path();

            if !entry.file_type().is_file() || !is_json_file(path) {
                continue;
            }

            let outcome = parse_json_with(path, options)
                .map(|table| (table.row_count(), table.column_count()))
                .map_err(|e| e.to_string());
            debug!(path = %path.display(), ok = outcome.is_ok(), "scanned file");

            files.push(ScannedFile {
                path: path.to_path_buf(),
                outcome,
            });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(ScanResult {
        roots: roots.iter().map(|r| r.as_ref().to_path_buf()).collect(),
        files,
    })
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_json_file() {
        assert!(is_json_file(Path::new("people.json")));
        assert!(is_json_file(Path::new("dir/PEOPLE.JSON")));
        assert!(!is_json_file(Path::new("people.csv")));
        assert!(!is_json_file(Path::new("json")));
    }

    #[test]
    fn test_scan_directory_reports_each_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.json"), r#"[{"x": 1}, {"x": 2}]"#).unwrap();
        fs::write(dir.path().join("nested/b.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = scan_directory(&[dir.path()], &ParseOptions::default()).unwrap();

        assert_eq!(result.files.len(), 2);
        assert_eq!(result.files[0].outcome, Ok((2, 1)));
        assert_eq!(result.parsed().count(), 1);

        let rejected: Vec<&ScannedFile> = result.rejected().collect();
        assert!(rejected[0].path.ends_with("nested/b.json"));
        assert_eq!(rejected[0].outcome, Err("array contains no data".to_string()));
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let result = scan_directory(&["/definitely/not/here"], &ParseOptions::default());
        assert!(result.is_err());
    }
}
