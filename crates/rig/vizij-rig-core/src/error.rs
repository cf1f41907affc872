//! Error and diagnostic types.
//!
//! `Configuration` and `Parse` abort a rig build. The remaining variants are
//! recoverable: they are caught per relation or per frame and surface as
//! [`Diagnostic`]s in the returned reports.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum RigError {
    /// A role or name in a static table is not known to the builder.
    #[error("unrecognized role '{role}'")]
    Configuration { role: String },

    /// A configured role has no live marker object.
    #[error("no marker object named '{name}'")]
    MissingMarker { name: String },

    /// A configured bone is absent from the armature.
    #[error("armature has no pose bone '{bone}'")]
    MissingBone { bone: String },

    /// The landmark array for a frame is missing an index.
    #[error("frame data has no landmark {index} ({available} landmarks available)")]
    FrameData { index: usize, available: usize },

    /// The state machine was driven out of order.
    #[error("cannot {action} while {state}")]
    InvalidState { action: &'static str, state: String },

    #[error("config json: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RigError {
    /// Recoverable kinds are skipped and logged instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RigError::MissingMarker { .. } | RigError::MissingBone { .. } | RigError::FrameData { .. }
        )
    }
}

/// Record of something that was skipped while wiring a rig.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    MissingMarker { region: String, name: String },
    MissingBone { region: String, bone: String },
}

impl Diagnostic {
    pub fn missing_marker(region: &str, name: &str) -> Self {
        Diagnostic::MissingMarker {
            region: region.to_string(),
            name: name.to_string(),
        }
    }

    pub fn missing_bone(region: &str, bone: &str) -> Self {
        Diagnostic::MissingBone {
            region: region.to_string(),
            bone: bone.to_string(),
        }
    }

    /// Name of the marker or bone that was missing.
    pub fn subject(&self) -> &str {
        match self {
            Diagnostic::MissingMarker { name, .. } => name,
            Diagnostic::MissingBone { bone, .. } => bone,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingMarker { region, name } => {
                write!(f, "{region}: mapping skipped, no marker '{name}'")
            }
            Diagnostic::MissingBone { region, bone } => {
                write!(f, "{region}: mapping skipped, no pose bone '{bone}'")
            }
        }
    }
}
