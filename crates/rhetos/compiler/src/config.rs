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

//! Build configuration

use crate::parser::common::ParserConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a TOML configuration file
pub const CONFIG_ENV: &str = "RHETOS_CONFIG";

/// Environment variable overriding the generated sources root
pub const OUTPUT_DIR_ENV: &str = "RHETOS_OUTPUT_DIR";

/// Errors reading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration of one DSL build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Ceiling on macro expansion passes before the build is declared non-terminating
    pub max_macro_iterations: usize,

    /// Evaluate the macros of one pass on the rayon pool; merging stays sequential
    pub parallel_macro_evaluation: bool,

    /// Root folder of generated sources
    pub output_dir: PathBuf,

    /// Delete files under `output_dir` that the build did not produce
    pub sweep_stale_files: bool,

    /// Leave files with identical content untouched
    pub skip_unchanged_files: bool,

    /// Text prefixed to every generated file
    pub file_header: Option<String>,

    pub parser: ParserConfig,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_macro_iterations: 100,
            parallel_macro_evaluation: true,
            output_dir: PathBuf::from("Generated"),
            sweep_stale_files: true,
            skip_unchanged_files: true,
            file_header: None,
            parser: ParserConfig::default(),
        }
    }
}

impl CompilerConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Sequential, always-rewrite configuration for debugging generator output
    pub fn development() -> Self {
        Self {
            parallel_macro_evaluation: false,
            skip_unchanged_files: false,
            ..Default::default()
        }
    }

    /// Configuration for release builds
    pub fn release() -> Self {
        Self {
            file_header: Some("// <auto-generated>This file is generated by Rhetos. Changes will be lost.</auto-generated>".to_string()),
            ..Default::default()
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_max_macro_iterations(mut self, iterations: usize) -> Self {
        self.max_macro_iterations = iterations;
        self
    }

    pub fn with_parallel_macros(mut self, parallel: bool) -> Self {
        self.parallel_macro_evaluation = parallel;
        self
    }

    pub fn with_sweep(mut self, sweep: bool) -> Self {
        self.sweep_stale_files = sweep;
        self
    }

    pub fn with_file_header(mut self, header: impl Into<String>) -> Self {
        self.file_header = Some(header.into());
        self
    }

    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Ok(())
    }

    /// Explicit file, else `RHETOS_CONFIG`, else defaults; `RHETOS_OUTPUT_DIR` overrides the output folder
    pub fn resolve(config_file: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_file {
            Self::load_from_file(path)?
        } else if let Ok(env_config) = std::env::var(CONFIG_ENV) {
            Self::load_from_file(env_config)?
        } else {
            Self::default()
        };

        if let Ok(output_dir) = std::env::var(OUTPUT_DIR_ENV) {
            config.output_dir = PathBuf::from(output_dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_macro_iterations == 0 {
            return Err(ConfigError::Invalid("max_macro_iterations must be greater than 0".to_string()));
        }

        if self.parser.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid("parser.max_nesting_depth must be greater than 0".to_string()));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output_dir must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CompilerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_macro_iterations, 100);
        assert!(config.sweep_stale_files);
    }

    #[test]
    fn test_presets() {
        assert!(!CompilerConfig::development().parallel_macro_evaluation);
        assert!(CompilerConfig::release().file_header.is_some());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config = CompilerConfig::default().with_max_macro_iterations(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rhetos.toml");
        let config = CompilerConfig::new("out").with_file_header("// generated").with_parallel_macros(false);
        config.save_to_file(&path).unwrap();
        assert_eq!(CompilerConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rhetos.toml");
        std::fs::write(&path, "max_macro_iterations = 7\n\n[parser]\nmax_nesting_depth = 4\n").unwrap();
        let config = CompilerConfig::load_from_file(&path).unwrap();
        assert_eq!(config.max_macro_iterations, 7);
        assert_eq!(config.parser.max_nesting_depth, 4);
        assert!(config.skip_unchanged_files);
    }

    #[test]
    fn test_missing_file() {
        let error = CompilerConfig::load_from_file("/nonexistent/rhetos.toml").unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
    }
}
