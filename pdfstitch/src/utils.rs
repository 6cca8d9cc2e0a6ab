//! Utilities for collecting input paths.

use crate::{Result, error::PdfStitchError};
use std::path::{Path, PathBuf};

/// Expand glob patterns into input paths, keeping pattern order.
///
/// Accepts anything iterable with items that convert to `&str`, e.g.
/// `&[&str]` or `Vec<String>`. A pattern without glob metacharacters, or
/// one that matches nothing, is passed through unchanged so a missing file
/// is reported by the merge instead of vanishing. Matches of one pattern
/// are sorted.
///
/// Errors:
/// - Invalid glob syntax.
/// - Unreadable directories while expanding a pattern.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns {
        resolved_paths.extend(collect_paths_for_pattern(pattern.as_ref())?);
    }

    Ok(resolved_paths)
}

fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    if !is_glob(pattern) {
        return Ok(vec![PathBuf::from(pattern)]);
    }

    let paths = glob::glob(pattern)
        .map_err(|err| PdfStitchError::invalid_config(format!("Invalid pattern {pattern}: {err}")))?;

    let mut resolved_paths = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| PdfStitchError::other(err.to_string()))?;
        resolved_paths.push(path);
    }

    if resolved_paths.is_empty() {
        return Ok(vec![PathBuf::from(pattern)]);
    }
    resolved_paths.sort();
    Ok(resolved_paths)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Read an input list: one path per line, blank lines and `#` comments
/// ignored.
pub fn read_input_list(path: &Path) -> Result<Vec<PathBuf>> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            PdfStitchError::file_not_found(path.to_path_buf())
        } else {
            PdfStitchError::FileNotAccessible {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    Ok(parse_input_list(&content))
}

/// Parse the contents of an input list.
pub fn parse_input_list(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect()
}
