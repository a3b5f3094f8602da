use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Pipeline error taxonomy
// ---------------------------------------------------------------------------

/// Every way a pipeline run can fail.
///
/// Only a missing striping configuration file is recovered from locally; all
/// of these variants abort the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad cube path, missing label, or data that is not a 3-D numeric array.
    #[error("failed to load cube '{label}' from {}", path.display())]
    CubeLoad {
        path: PathBuf,
        label: String,
        #[source]
        source: anyhow::Error,
    },

    /// Invalid augmentation parameters.
    #[error("invalid augmentation settings: {0}")]
    Augmentation(String),

    /// Striping configuration exists but could not be read or parsed.
    #[error("failed to read striping configuration {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The striping step broke its shape contract or failed outright.
    #[error("striping overlay failed: {0:#}")]
    Overlay(anyhow::Error),

    /// Render options that cannot be applied to the loaded cube, such as an
    /// rgb band past the band count. Reported before the output is touched.
    #[error("invalid render options: {0:#}")]
    Render(anyhow::Error),

    /// Sample index past the end of a collection.
    #[error("sample index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Filesystem failure while resetting the output directory or exporting.
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        PipelineError::Io {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
