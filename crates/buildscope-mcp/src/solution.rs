// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Solution path resolution
//!
//! Tool callers pass either a `.sln` file or a directory containing one.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors resolving a solution path
#[derive(Debug, Error)]
pub enum SolutionError {
    /// No path was given
    #[error("solution_path is required")]
    Empty,

    /// The path does not exist or is not a solution file
    #[error("Path not found or not a solution: {0}")]
    NotFound(String),

    /// The directory contains no `.sln` file
    #[error("No .sln found in directory: {}", .0.display())]
    NoSolutionInDirectory(PathBuf),

    /// The directory could not be listed
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDirectory {
        /// Directory being searched
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

/// Resolve a user-supplied path to a `.sln` file
///
/// Relative paths are resolved against `base` when given, otherwise against
/// the current directory. A directory resolves to the first `.sln` file in
/// it by file name.
///
/// # Errors
///
/// Returns a [`SolutionError`] when the path is blank, missing, not a
/// solution, or a directory without a solution.
pub fn resolve_solution_path(path: &str, base: Option<&Path>) -> Result<PathBuf, SolutionError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(SolutionError::Empty);
    }

    let candidate = Path::new(trimmed);
    let full = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        match base {
            Some(base) => base.join(candidate),
            None => std::env::current_dir()
                .map(|cwd| cwd.join(candidate))
                .unwrap_or_else(|_| candidate.to_path_buf()),
        }
    };

    if full.is_file() && is_solution_file(&full) {
        return Ok(full);
    }

    if full.is_dir() {
        return find_solution_in(&full)?.ok_or(SolutionError::NoSolutionInDirectory(full));
    }

    Err(SolutionError::NotFound(trimmed.to_string()))
}

/// Find the first `.sln` file directly inside `dir`, ordered by file name
fn find_solution_in(dir: &Path) -> Result<Option<PathBuf>, SolutionError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SolutionError::ReadDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut solutions: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_solution_file(p))
        .collect();
    solutions.sort();

    if solutions.len() > 1 {
        tracing::debug!(
            dir = %dir.display(),
            count = solutions.len(),
            "Multiple solutions found, using the first"
        );
    }

    Ok(solutions.into_iter().next())
}

fn is_solution_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sln"))
}
