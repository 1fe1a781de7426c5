// SPDX-License-Identifier: Apache-2.0

//! Scan target discovery.
//!
//! Walks a directory tree, keeps the files matched by the include globs and
//! not matched by the exclude globs, and reads each one exactly once. Skills
//! share the resulting [`FileSet`] read-only.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::WardenError;

/// One file to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the scan root, `/`-separated.
    pub path: String,
    /// File contents.
    pub content: String,
    /// Indices of the include globs this file matched.
    matched: Vec<usize>,
}

impl SourceFile {
    /// Extension with a leading dot (e.g. `.tsx`), lowercased.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
    }

    /// File name without directories.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// The files a workflow run scans, sorted by path.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    patterns: Vec<String>,
    files: Vec<SourceFile>,
}

impl FileSet {
    /// Collects files under `root`.
    ///
    /// Unreadable, non-UTF-8 and oversized files are skipped.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::Config` for an invalid glob and `WardenError::Io`
    /// when `root` does not exist.
    pub fn collect(
        root: &Path,
        include: &[String],
        exclude: &[String],
        max_file_bytes: u64,
    ) -> Result<Self, WardenError> {
        if !root.exists() {
            return Err(WardenError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("scan root {} does not exist", root.display()),
            )));
        }

        let include_set = build_globset(include)?;
        let exclude_set = build_globset(exclude)?;

        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            // A file root strips to an empty path; use its name instead.
            let relative = match entry.path().strip_prefix(root) {
                Ok(relative) if !relative.as_os_str().is_empty() => relative,
                _ => Path::new(entry.file_name()),
            };
            let rel = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if exclude_set.is_match(&rel) {
                continue;
            }
            let matched = include_set.matches(&rel);
            if matched.is_empty() {
                continue;
            }

            let too_big = entry
                .metadata()
                .map(|m| m.len() > max_file_bytes)
                .unwrap_or(true);
            if too_big {
                debug!(file = %rel, "Skipping oversized or unreadable file");
                continue;
            }

            match std::fs::read_to_string(entry.path()) {
                Ok(content) => files.push(SourceFile {
                    path: rel,
                    content,
                    matched,
                }),
                Err(e) => debug!(file = %rel, error = %e, "Skipping unreadable file"),
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(root = %root.display(), files = files.len(), "Collected scan targets");

        Ok(Self {
            patterns: include.to_vec(),
            files,
        })
    }

    /// Builds a file set from in-memory sources. Every file counts as matched
    /// by the single pattern `*`.
    #[must_use]
    pub fn from_sources<I, P, C>(sources: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let mut files: Vec<SourceFile> = sources
            .into_iter()
            .map(|(path, content)| SourceFile {
                path: path.into(),
                content: content.into(),
                matched: vec![0],
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            patterns: vec!["*".to_string()],
            files,
        }
    }

    /// All files, sorted by path.
    #[must_use]
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true when no file matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Groups file paths by the include pattern that selected them.
    ///
    /// A file matched by several patterns appears under each of them.
    #[must_use]
    pub fn files_by_pattern(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for file in &self.files {
            for &idx in &file.matched {
                if let Some(pattern) = self.patterns.get(idx) {
                    grouped
                        .entry(pattern.as_str())
                        .or_default()
                        .push(file.path.as_str());
                }
            }
        }
        grouped
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, WardenError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| WardenError::Config {
            message: format!("Invalid glob {pattern}: {e}"),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| WardenError::Config {
        message: format!("Failed to build glob set: {e}"),
    })
}

/// Writes `bytes` to `path` through a temporary file in the same directory,
/// then renames it into place. Readers see the old file or the new one,
/// never a partial write.
///
/// # Errors
///
/// Returns `WardenError::Io` if the temporary file cannot be written or
/// persisted.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), WardenError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| WardenError::Io(e.error))?;
    Ok(())
}
