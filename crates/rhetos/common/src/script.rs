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

//! DSL script units
//!
//! A `DslScript` is an immutable piece of source text with a stable logical name.
//! Scripts are read fully into memory before any processing starts and are never
//! mutated afterwards; every token and diagnostic points back into one of them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extension of DSL scripts picked up by [`load_scripts`]
pub const DSL_SCRIPT_EXTENSION: &str = "rhe";

/// Immutable unit of DSL source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DslScript {
    /// Logical name, stable across machines (relative path with `/` separators)
    pub name: String,
    /// Location the script was read from
    pub path: PathBuf,
    /// Full script text
    pub script: String,
}

impl DslScript {
    /// Create a script read from `path`
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            script: script.into(),
        }
    }

    /// Create an in-memory script; its path equals its name
    pub fn from_text(name: impl Into<String>, script: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
            script: script.into(),
        }
    }

    /// 1-based line and column (in characters) of a byte offset.
    ///
    /// Offsets past the end are clamped to the end of the script.
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let offset = self.clamp(offset);
        let before = &self.script[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = self.script[line_start..offset].chars().count() + 1;
        (line, column)
    }

    /// Text of the line containing `offset`, without the line break
    pub fn line_text(&self, offset: usize) -> &str {
        let offset = self.clamp(offset);
        let start = self.script[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let end = self.script[offset..].find('\n').map(|i| offset + i).unwrap_or(self.script.len());
        self.script[start..end].trim_end_matches('\r')
    }

    fn clamp(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.script.len());
        while !self.script.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

/// Errors raised while reading scripts from disk
#[derive(Error, Debug)]
pub enum ScriptLoadError {
    #[error("Script folder '{0}' does not exist or is not a directory")]
    NotADirectory(PathBuf),

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load every `*.rhe` file under `root`, recursively.
///
/// Scripts are returned sorted by their logical name so that repeated builds see the
/// same order regardless of directory iteration order.
pub fn load_scripts(root: &Path) -> Result<Vec<DslScript>, ScriptLoadError> {
    if !root.is_dir() {
        return Err(ScriptLoadError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    collect_script_files(root, &mut files)?;

    let mut scripts = files
        .into_iter()
        .map(|path| {
            let script = fs::read_to_string(&path).map_err(|source| ScriptLoadError::Io { path: path.clone(), source })?;
            let name = logical_name(root, &path);
            Ok(DslScript::new(name, path, script))
        })
        .collect::<Result<Vec<_>, ScriptLoadError>>()?;

    scripts.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!("Loaded {} DSL scripts from {}", scripts.len(), root.display());
    Ok(scripts)
}

fn collect_script_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), ScriptLoadError> {
    let entries = fs::read_dir(dir).map_err(|source| ScriptLoadError::Io { path: dir.to_path_buf(), source })?;
    for entry in entries {
        let entry = entry.map_err(|source| ScriptLoadError::Io { path: dir.to_path_buf(), source })?;
        let path = entry.path();
        if path.is_dir() {
            collect_script_files(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(DSL_SCRIPT_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

fn logical_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
}
