use std::io;
use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum ClampError {
    #[error("waveform file {path:?} could not be opened: {source}")]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("waveform file {path:?}, line {line}: {token:?} is not a number")]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },
    #[error("parameter {field:?} rejected value {value:?}: {reason}")]
    Configuration {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("real-time period must be greater than zero")]
    InvalidPeriod,
    #[error("failed to start the real-time thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("real-time engine is no longer running")]
    EngineStopped,
}
impl ClampError {
    /// Load failures degrade to "no file loaded"; configuration errors never reach the core.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            ClampError::FileNotFound { .. } | ClampError::Parse { .. }
        )
    }
}
