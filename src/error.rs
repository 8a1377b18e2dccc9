//! Compiler errors that abort a run, as opposed to diagnostics about the
//! program being compiled.

use thiserror::Error;

use crate::diagnostic::Stage;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to write diagnostics: {0}")]
    Report(#[from] std::io::Error),

    #[error("internal error in {stage}: {message}")]
    Internal { stage: Stage, message: String },
}

impl Error {
    pub fn internal(stage: Stage, message: impl Into<String>) -> Self {
        Error::Internal {
            stage,
            message: message.into(),
        }
    }
}
