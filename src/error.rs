//! Failures of the streaming delivery pipeline.

use std::io;

use http::StatusCode;
use thiserror::Error;

use crate::responder::Reason;

/// Failure of a streaming delivery after the file was found and the codec accepted.
///
/// The variant records which side of the pipeline broke. Each maps to its own 500 reason
/// phrase, which is also written as the body.
#[derive(Debug, Error)]
pub enum StreamFailure {
    /// Opening or reading the source file failed.
    #[error("Server error in fileStream: {0}")]
    FileStream(#[source] io::Error),

    /// The encoder rejected its input or could not finish the stream.
    #[error("Server error in compressStream: {0}")]
    CompressStream(#[source] io::Error),
}

impl StreamFailure {
    /// Reason phrase and body text reported to the client.
    pub fn message(&self) -> &'static str {
        match self {
            StreamFailure::FileStream(_) => "Server error in fileStream",
            StreamFailure::CompressStream(_) => "Server error in compressStream",
        }
    }

    pub fn reason(&self) -> Reason {
        Reason(StatusCode::INTERNAL_SERVER_ERROR, self.message())
    }
}
