//! Error kinds reported by script synthesis and injection.

use thiserror::Error;

/// Failure modes surfaced to the host page instead of being swallowed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The frame is missing or its document has not finished loading.
    #[error("frame `{target}` is not ready")]
    TargetNotReady { target: String },
    /// The widget's generated script does not contain a required anchor.
    #[error("host script is incompatible with {anchors}: anchor `{anchor}` not found")]
    IncompatibleHostScript {
        anchor: &'static str,
        anchors: &'static str,
    },
    /// A script with this id exists under a placement that forbids replacement.
    #[error("script `{id}` is already present with different content")]
    InjectionConflict { id: String },
    /// Shape or merge parameters failed validation.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    /// The dataset catalog could not be read.
    #[error("dataset catalog: {0}")]
    Catalog(String),
}

impl ScriptError {
    pub fn not_ready(target: &str) -> Self {
        ScriptError::TargetNotReady {
            target: target.to_string(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        ScriptError::InvalidParameters(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;
