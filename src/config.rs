//! Sort policy and file filtering configuration.
//!
//! A configuration file is only read when passed explicitly with `--config`.
//! Without one, the default policy applies (raw files share the day folder)
//! and every file is visited.
//!
//! # Configuration File Format
//!
//! ```toml
//! [policy]
//! raw = "separate"                 # or "shared" (default)
//! raw_folder = "ARW"
//! raw_extensions = ["arw", "dng"]
//! collapse_folders = ["Video", "Videos"]
//!
//! [filters]
//! skip_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["**/*.xmp"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! Patterns and regexes are matched against the path relative to the walked root.

use crate::date_folder::SortPolicy;
use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration: where files go, and which files are considered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SortConfig {
    #[serde(default)]
    pub policy: SortPolicy,

    #[serde(default)]
    pub filters: FilterRules,
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterRules {
    /// Leave out files whose name starts with ".". Off by default.
    #[serde(default)]
    pub skip_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, checked before every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for leaving files out of a run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames (e.g. "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns (e.g. "**/*.xmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot, case-insensitive.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl SortConfig {
    /// Loads the configuration file if one was given, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist,
    /// `ConfigError::IoError` if it cannot be read and
    /// `ConfigError::ConfigInvalid` if it is not valid TOML for this schema.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.policy.raw_extensions = config
            .policy
            .raw_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        if config.policy.raw_folder.is_empty() || config.policy.raw_folder.contains(['/', '\\']) {
            return Err(ConfigError::ConfigInvalid(format!(
                "raw_folder must be a single folder name, got '{}'",
                config.policy.raw_folder
            )));
        }
        Ok(config)
    }
}

impl FilterRules {
    /// Compiles the rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug)]
pub struct CompiledFilters {
    skip_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden_files: rules.skip_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Check if a file should be visited.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and skipped, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return true;
        }

        if self.skip_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
