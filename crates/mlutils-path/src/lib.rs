//! Path normalization for one-or-many path inputs
//!
//! Callers often hand a single path where a list is accepted, or vice
//! versa. [`resolve_one`] and [`resolve_many`] normalize either shape into
//! the one the callee wants, optionally checking existence up front so
//! failures happen before any expensive work starts.

#![warn(missing_docs)]

use std::path::{Path, PathBuf};

/// Result type for path normalization
pub type Result<T> = std::result::Result<T, Error>;

/// Path normalization errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Existence was requested and a path is absent
    #[error("path {path} does not exist")]
    PathNotFound {
        /// The missing path
        path: PathBuf,
    },

    /// A single path was requested but the input held several
    #[error("expected a single path, got a list of {len}")]
    MultiplePaths {
        /// Number of paths in the input
        len: usize,
    },
}

/// One path or many, accepted from the common path-like shapes
#[derive(Debug, Clone)]
pub enum PathInput {
    /// A single path
    One(PathBuf),
    /// An ordered list of paths
    Many(Vec<PathBuf>),
}

impl From<&str> for PathInput {
    fn from(path: &str) -> Self {
        Self::One(PathBuf::from(path))
    }
}

impl From<String> for PathInput {
    fn from(path: String) -> Self {
        Self::One(PathBuf::from(path))
    }
}

impl From<&Path> for PathInput {
    fn from(path: &Path) -> Self {
        Self::One(path.to_path_buf())
    }
}

impl From<PathBuf> for PathInput {
    fn from(path: PathBuf) -> Self {
        Self::One(path)
    }
}

impl From<Vec<PathBuf>> for PathInput {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self::Many(paths)
    }
}

impl From<Vec<&str>> for PathInput {
    fn from(paths: Vec<&str>) -> Self {
        Self::Many(paths.into_iter().map(PathBuf::from).collect())
    }
}

impl From<Vec<String>> for PathInput {
    fn from(paths: Vec<String>) -> Self {
        Self::Many(paths.into_iter().map(PathBuf::from).collect())
    }
}

/// Normalize to exactly one path
///
/// # Errors
/// - [`Error::MultiplePaths`] if the input is a list with more than one
///   element (a one-element list is accepted)
/// - [`Error::PathNotFound`] if `check_exists` and the path is absent
pub fn resolve_one(paths: impl Into<PathInput>, check_exists: bool) -> Result<PathBuf> {
    let mut resolved = resolve(paths.into(), check_exists)?;
    match resolved.len() {
        1 => Ok(resolved.remove(0)),
        len => Err(Error::MultiplePaths { len }),
    }
}

/// Normalize to a list of paths, preserving input order
///
/// A single path becomes a one-element list.
///
/// # Errors
/// [`Error::PathNotFound`] if `check_exists` and any path is absent.
pub fn resolve_many(paths: impl Into<PathInput>, check_exists: bool) -> Result<Vec<PathBuf>> {
    resolve(paths.into(), check_exists)
}

fn resolve(input: PathInput, check_exists: bool) -> Result<Vec<PathBuf>> {
    let paths = match input {
        PathInput::One(path) => vec![path],
        PathInput::Many(paths) => paths,
    };
    if check_exists {
        for path in &paths {
            if !path.exists() {
                return Err(Error::PathNotFound { path: path.clone() });
            }
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn single_str_resolves_to_one() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        File::create(&file).unwrap();

        let got = resolve_one(file.as_path(), true).unwrap();
        assert_eq!(got, file);
    }

    #[test]
    fn single_input_resolves_to_one_element_list() {
        let got = resolve_many("data/train.csv", false).unwrap();
        assert_eq!(got, vec![PathBuf::from("data/train.csv")]);
    }

    #[test]
    fn list_preserves_order() {
        let got = resolve_many(vec!["b", "a", "c"], false).unwrap();
        let want: Vec<PathBuf> = ["b", "a", "c"].iter().map(PathBuf::from).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn missing_path_fails_when_checked() {
        let err = resolve_one("definitely/not/here.bin", true).unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }

    #[test]
    fn missing_path_passes_when_unchecked() {
        assert!(resolve_one("definitely/not/here.bin", false).is_ok());
    }

    #[test]
    fn multi_element_list_cannot_resolve_to_one() {
        let err = resolve_one(vec!["a", "b"], false).unwrap_err();
        assert!(matches!(err, Error::MultiplePaths { len: 2 }));
    }

    #[test]
    fn one_element_list_resolves_to_one() {
        let got = resolve_one(vec!["only"], false).unwrap();
        assert_eq!(got, PathBuf::from("only"));
    }

    #[test]
    fn existence_check_covers_every_list_element() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present");
        File::create(&present).unwrap();
        let absent = dir.path().join("absent");

        let err = resolve_many(vec![present, absent.clone()], true).unwrap_err();
        assert!(matches!(err, Error::PathNotFound { path } if path == absent));
    }
}
