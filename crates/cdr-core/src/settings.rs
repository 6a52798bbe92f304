//! Pipeline configuration.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Folder holding the call-record sources.
pub const DEFAULT_DATA_FOLDER: &str = "/speechanalytics-connect/meta/";

/// Folder holding the audio recordings.
pub const DEFAULT_AUDIO_FOLDER: &str = "/speechanalytics-connect/";

/// Default size of the resolution worker pool.
pub const DEFAULT_WORKERS: usize = 4;

/// What a run does when one source file fails to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The whole run fails; no partial output.
    #[default]
    Abort,
    /// The file is left out and reported; its cache entry is untouched.
    Skip,
}

impl FailurePolicy {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Settings for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub data_folder: String,
    pub audio_folder: String,
    /// Upper bound on concurrent file resolutions.
    pub workers: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            data_folder: DEFAULT_DATA_FOLDER.to_string(),
            audio_folder: DEFAULT_AUDIO_FOLDER.to_string(),
            workers: DEFAULT_WORKERS,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl PipelineSettings {
    /// Reads settings from a JSON file; absent keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(CoreError::Config("workers must be at least 1".to_string()));
        }
        if self.data_folder.trim().is_empty() {
            return Err(CoreError::Config("data_folder must not be empty".to_string()));
        }
        if self.audio_folder.trim().is_empty() {
            return Err(CoreError::Config("audio_folder must not be empty".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_data_folder(mut self, folder: impl Into<String>) -> Self {
        self.data_folder = folder.into();
        self
    }

    #[must_use]
    pub fn with_audio_folder(mut self, folder: impl Into<String>) -> Self {
        self.audio_folder = folder.into();
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
