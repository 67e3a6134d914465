// Launcher error type: one variant per way a run can fail before the viewer is up.

use std::path::PathBuf;

/// Result alias used across the pipeline.
pub type Result<T> = std::result::Result<T, LaunchError>;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// A server response did not contain a required field exactly once.
    #[error("{context} - {detail}")]
    Protocol {
        context: &'static str,
        detail: String,
    },

    /// The BMC answered the login with a non-success status.
    #[error("Could not get session cookie - Unexpected HAPI_STATUS code: {status}")]
    AuthRejected { status: u32 },

    /// Connection error, timeout or unreadable body.
    #[error("{what} failed ({url})")]
    Transport {
        what: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with an unexpected HTTP status.
    #[error("{what} failed ({url}): HTTP {status}")]
    HttpStatus {
        what: &'static str,
        url: String,
        status: u16,
    },

    /// The launch descriptor cannot be used to start the viewer.
    #[error("Could not {context} from JNLP - {detail}")]
    MalformedDescriptor {
        context: &'static str,
        detail: String,
    },

    /// Local filesystem failure on the cached artifact.
    #[error("{action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The runtime executable could not be started.
    #[error("Could not start {}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A shutdown signal arrived while a stage was in flight.
    #[error("interrupted by shutdown signal")]
    Interrupted,
}

impl LaunchError {
    pub(crate) fn protocol(context: &'static str, detail: impl Into<String>) -> Self {
        Self::Protocol {
            context,
            detail: detail.into(),
        }
    }

    pub(crate) fn descriptor(context: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            context,
            detail: detail.into(),
        }
    }

    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
