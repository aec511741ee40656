use std::io;

use thiserror::Error;

/// Errors produced by the tools in this crate.
///
/// All of them are fatal to the run. The tools are exploratory one-shot
/// transformations, so there is no partial-result recovery: a malformed
/// input line rejects the whole input rather than being skipped.
#[derive(Debug, Error)]
pub enum Error {
    /// An input line did not match the expected format.
    #[error("malformed input at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    /// A data item is larger than the largest chunk size boundary.
    #[error("item of size {size} exceeds the largest chunk size {max_chunk_size}")]
    RangeExceeded { size: u64, max_chunk_size: u64 },

    /// Slack accumulation exceeded the representable range.
    #[error("total slack exceeds the representable range")]
    SlackOverflow,

    /// A configuration that can never make progress was rejected up front.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        Error::Parse {
            line,
            msg: msg.into(),
        }
    }
}
