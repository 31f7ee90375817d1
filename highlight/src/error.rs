use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Ways an external highlighter invocation can fail.
///
/// None of these reach the caller of the pipeline: they are logged and the request is
/// rendered as plain text instead.
#[derive(Debug, Error)]
pub enum HighlighterError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while talking to the highlighter: {0}")]
    Io(#[from] std::io::Error),

    #[error("highlighter did not finish within {0:?}")]
    Timeout(Duration),

    #[error("highlighter exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("highlighter produced non UTF-8 output")]
    InvalidOutput(#[from] std::string::FromUtf8Error),
}
