use std::{fmt, path::PathBuf, time::Duration};

use thiserror::Error;

/// The remote steps of a probe run, in the order they are issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeStep {
    Deploy,
    ReadOwnerBefore,
    WriteSlot,
    ReadOwnerAfter,
}

impl fmt::Display for ProbeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbeStep::Deploy => "deploy",
            ProbeStep::ReadOwnerBefore => "owner_address (before write)",
            ProbeStep::WriteSlot => "write",
            ProbeStep::ReadOwnerAfter => "owner_address (after write)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no artifact for contract `{name}` under {}", .dir.display())]
    ArtifactNotFound { name: String, dir: PathBuf },

    #[error("contract name `{name}` is ambiguous, use one of: {}", .candidates.join(", "))]
    AmbiguousArtifact {
        name: String,
        candidates: Vec<String>,
    },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact {}", .path.display())]
    MalformedArtifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("contract `{0}` has no deployable bytecode")]
    NotDeployable(String),

    #[error("invalid 32-byte hex word `{0}`")]
    InvalidWord(String),

    #[error("{step} failed: {message}")]
    Remote { step: ProbeStep, message: String },

    #[error("{step} timed out after {after:?}")]
    TimedOut { step: ProbeStep, after: Duration },

    #[error("{step} was cancelled")]
    Cancelled { step: ProbeStep },
}

impl ProbeError {
    /// The remote step this error was raised in, if any.
    pub fn step(&self) -> Option<ProbeStep> {
        match self {
            ProbeError::Remote { step, .. }
            | ProbeError::TimedOut { step, .. }
            | ProbeError::Cancelled { step } => Some(*step),
            _ => None,
        }
    }
}
