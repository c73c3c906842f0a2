// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Settings loading
//!
//! Reads `jobflow.toml` from an explicit path, the working directory, or
//! the user configuration directory, in that order.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{JobflowError, JobflowResult};

/// Settings file name
pub const SETTINGS_FILE: &str = "jobflow.toml";

/// CLI settings from jobflow.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Job document used when no path is given
    pub job_file: PathBuf,

    /// Seconds between deadline checks in watch mode
    pub tick_seconds: u64,

    /// File change debounce in watch mode
    pub debounce_ms: u64,

    /// Default output format for reports
    pub format: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            job_file: PathBuf::from("job.yaml"),
            tick_seconds: 60,
            debounce_ms: 500,
            format: OutputFormat::Text,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when no file exists.
    ///
    /// An explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> JobflowResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = PathBuf::from(SETTINGS_FILE);
        if local.exists() {
            return Self::from_file(&local);
        }

        if let Some(user) = Self::user_settings_path() {
            if user.exists() {
                return Self::from_file(&user);
            }
        }

        debug!("no settings file found, using defaults");
        Ok(Self::default())
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> JobflowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| JobflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let settings = Self::from_toml(&content)?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Parse settings from a TOML string
    pub fn from_toml(content: &str) -> JobflowResult<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// `jobflow.toml` inside the platform configuration directory
    pub fn user_settings_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "jobflow", "jobflow").map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    fn validate(&self) -> JobflowResult<()> {
        if self.tick_seconds == 0 {
            return Err(JobflowError::InvalidConfig {
                reason: "tick_seconds must be at least 1".into(),
            });
        }
        if self.job_file.as_os_str().is_empty() {
            return Err(JobflowError::InvalidConfig {
                reason: "job_file must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
