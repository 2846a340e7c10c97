// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Writes generated sources under the output root and sweeps stale files

use super::builder::GeneratedSourceSet;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output file '{path}' is claimed by '{first}' and by '{second}'")]
    PathConflict { path: String, first: String, second: String },

    #[error("Invalid output path '{0}': must be relative and stay inside the output folder")]
    InvalidPath(String),

    #[error("Output folder '{0}' has no parent folder to stage generated sources in")]
    NoStagingLocation(PathBuf),
}

impl WriterError {
    pub fn code(&self) -> &'static str {
        match self {
            WriterError::Io { .. } => "RH801",
            WriterError::PathConflict { .. } => "RH802",
            WriterError::InvalidPath(_) => "RH803",
            WriterError::NoStagingLocation(_) => "RH804",
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> WriterError + '_ {
    move |source| WriterError::Io { path: path.to_path_buf(), source }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub written: usize,
    pub unchanged: usize,
}

/// Scratch folder beside an output root holding a complete build until it is promoted
///
/// Removed with everything in it when dropped.
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    pub fn next_to(root: &Path) -> Result<Self, WriterError> {
        let name = root.file_name().ok_or_else(|| WriterError::NoStagingLocation(root.to_path_buf()))?;
        let path = root.with_file_name(format!(".{}.staging-{}", name.to_string_lossy(), std::process::id()));
        if path.exists() {
            fs::remove_dir_all(&path).map_err(io_error(&path))?;
        }
        fs::create_dir_all(&path).map_err(io_error(&path))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_dir_all(&self.path) {
            warn!("Failed to remove staging folder {}: {}", self.path.display(), error);
        }
    }
}

/// Owns the generated-source folder for one build
///
/// Every file must be claimed before it is written; the claim table is shared
/// between the rayon workers, and a second claim of a path is a fatal conflict.
pub struct SourceWriter {
    root: PathBuf,
    skip_unchanged: bool,
    claims: DashMap<String, String>,
}

impl SourceWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skip_unchanged: true,
            claims: DashMap::new(),
        }
    }

    pub fn with_skip_unchanged(mut self, skip_unchanged: bool) -> Self {
        self.skip_unchanged = skip_unchanged;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve a relative path for `owner`
    pub fn claim(&self, path: &str, owner: &str) -> Result<PathBuf, WriterError> {
        let relative = relative_path(path)?;
        match self.claims.entry(relative.clone()) {
            Entry::Occupied(entry) => Err(WriterError::PathConflict {
                path: relative,
                first: entry.get().clone(),
                second: owner.to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(owner.to_string());
                Ok(self.root.join(relative))
            }
        }
    }

    /// Claim and write one file; returns false when identical content was already on disk
    pub fn write_file(&self, path: &str, owner: &str, content: &str) -> Result<bool, WriterError> {
        let target = self.claim(path, owner)?;
        if self.is_unchanged(&target, content) {
            return Ok(false);
        }
        create_parent(&target)?;
        fs::write(&target, content).map_err(io_error(&target))?;
        Ok(true)
    }

    fn is_unchanged(&self, target: &Path, content: &str) -> bool {
        let unchanged = self.skip_unchanged && fs::read(target).is_ok_and(|existing| existing == content.as_bytes());
        if unchanged {
            debug!("Skipping unchanged file {}", target.display());
        }
        unchanged
    }

    /// Write every file of the source set in parallel
    pub fn write_all(&self, sources: &GeneratedSourceSet) -> Result<WriteReport, WriterError> {
        let results: Vec<bool> = sources
            .files
            .par_iter()
            .map(|file| self.write_file(&file.path, &file.group, &file.content))
            .collect::<Result<_, _>>()?;
        let written = results.iter().filter(|&&written| written).count();
        let report = WriteReport {
            written,
            unchanged: results.len() - written,
        };
        info!("Wrote {} files to {} ({} unchanged)", report.written, self.root.display(), report.unchanged);
        Ok(report)
    }

    /// Move files written under `staging` into the root
    ///
    /// Every path is claimed before the first file moves, so a conflict leaves
    /// the root untouched. Files already identical in the root stay as they are.
    pub fn promote(&self, sources: &GeneratedSourceSet, staging: &Path) -> Result<WriteReport, WriterError> {
        let targets = sources
            .files
            .iter()
            .map(|file| Ok((file, self.claim(&file.path, &file.group)?, staging.join(relative_path(&file.path)?))))
            .collect::<Result<Vec<_>, WriterError>>()?;

        let results: Vec<bool> = targets
            .par_iter()
            .map(|(file, target, staged)| {
                if self.is_unchanged(target, &file.content) {
                    return Ok(false);
                }
                create_parent(target)?;
                fs::rename(staged, target).map_err(io_error(target))?;
                Ok(true)
            })
            .collect::<Result<_, WriterError>>()?;
        let written = results.iter().filter(|&&written| written).count();
        let report = WriteReport {
            written,
            unchanged: results.len() - written,
        };
        info!("Promoted {} files to {} ({} unchanged)", report.written, self.root.display(), report.unchanged);
        Ok(report)
    }

    /// Claimed paths, sorted
    pub fn claimed(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.claims.iter().map(|entry| entry.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Delete every unclaimed file under the root, then the directories left empty
    pub fn sweep(&self) -> Result<usize, WriterError> {
        if !self.root.is_dir() {
            return Ok(0);
        }
        let mut files = Vec::new();
        let mut directories = Vec::new();
        collect_entries(&self.root, &mut files, &mut directories)?;

        let mut removed = 0;
        for file in files {
            let relative = match file.strip_prefix(&self.root) {
                Ok(relative) => slash_path(relative),
                Err(_) => continue,
            };
            if !self.claims.contains_key(&relative) {
                fs::remove_file(&file).map_err(io_error(&file))?;
                debug!("Removed stale file {}", relative);
                removed += 1;
            }
        }

        // Deepest first, so parents are empty by the time they are checked
        directories.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
        for dir in directories {
            let empty = fs::read_dir(&dir).map_err(io_error(&dir))?.next().is_none();
            if empty {
                fs::remove_dir(&dir).map_err(io_error(&dir))?;
            }
        }

        if removed > 0 {
            info!("Removed {} stale files from {}", removed, self.root.display());
        }
        Ok(removed)
    }
}

fn create_parent(target: &Path) -> Result<(), WriterError> {
    match target.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(io_error(parent)),
        None => Ok(()),
    }
}

/// Symlinks are neither followed nor removed; whatever they point to is outside the sweep
fn collect_entries(dir: &Path, files: &mut Vec<PathBuf>, directories: &mut Vec<PathBuf>) -> Result<(), WriterError> {
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_error(&path))?;
        if file_type.is_symlink() {
            debug!("Leaving symlink {} in place", path.display());
        } else if file_type.is_dir() {
            collect_entries(&path, files, directories)?;
            directories.push(path);
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn slash_path(path: &Path) -> String {
    path.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
}

fn relative_path(path: &str) -> Result<String, WriterError> {
    let normalized = path.replace('\\', "/");
    let candidate = Path::new(&normalized);
    let mut parts = Vec::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(WriterError::InvalidPath(path.to_string())),
        }
    }
    if parts.is_empty() {
        return Err(WriterError::InvalidPath(path.to_string()));
    }
    Ok(parts.join("/"))
}
