//! Compressed single-file delivery.
//!
//! Two strategies share the same precondition checks and error responses:
//!
//! - [`Delivery::send_compressed_file`] reads and compresses the whole file on the calling
//!   thread and returns a response with a full body. I/O or compression failures are not
//!   turned into responses; they are returned as errors for the caller to handle.
//! - [`Delivery::send_compressed_file_by_stream`] pipes the file through an incremental
//!   encoder into a streaming body. Failures become 500 responses and the pipeline releases
//!   its file handle and encoder on completion, failure, or when the body is dropped.
//!
//! Both check for the file before looking at the codec name, so a missing file is always
//! reported as 404 even when the codec is bogus too.
//!
//! | condition             | status | reason / body                  |
//! |-----------------------|--------|--------------------------------|
//! | file missing          | 404    | `File not found`               |
//! | codec unrecognized    | 400    | `Unsupported compression type` |
//! | file read failed      | 500    | `Server error in fileStream`   |
//! | encoder failed        | 500    | `Server error in compressStream` |
//!
//! The 500 rows only apply to the streaming strategy.
//!
//! # Examples
//!
//! ```rust,no_run
//! use zipsend::{body::SendBody, delivery, types::Response};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let buffered = delivery::send_compressed_file(
//!     Response::new(SendBody::empty()),
//!     "./fixtures/hello.txt",
//!     Some("gzip"),
//! )?;
//!
//! let streamed = delivery::send_compressed_file_by_stream(
//!     Response::new(SendBody::empty()),
//!     "./fixtures/hello.txt",
//!     Some("br"),
//! )
//! .await;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use anyhow::Result;
use http::{
    StatusCode,
    header::{CONTENT_DISPOSITION, CONTENT_ENCODING},
};

use crate::{config::DeliveryConfig, responder::Reason, types::Response};

pub mod buffered;
pub mod stream;

pub use stream::{DeliveryStream, ReleaseReason, send_stream};

pub const NOT_FOUND: Reason = Reason(StatusCode::NOT_FOUND, "File not found");
pub const UNSUPPORTED_CODEC: Reason =
    Reason(StatusCode::BAD_REQUEST, "Unsupported compression type");

/// Delivers files with a fixed compression configuration.
#[derive(Clone, Debug, Default)]
pub struct Delivery {
    cfg: DeliveryConfig,
}

impl Delivery {
    pub fn new(cfg: DeliveryConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.cfg
    }
}

/// Buffered delivery with the default configuration.
pub fn send_compressed_file<P: AsRef<Path>>(
    response: Response,
    file_path: P,
    codec: Option<&str>,
) -> Result<Response> {
    Delivery::default().send_compressed_file(response, file_path, codec)
}

/// Streaming delivery with the default configuration.
pub async fn send_compressed_file_by_stream<P: AsRef<Path>>(
    response: Response,
    file_path: P,
    codec: Option<&str>,
) -> Response {
    Delivery::default()
        .send_compressed_file_by_stream(response, file_path, codec)
        .await
}

fn reject_missing(response: &mut Response, path: &Path) {
    tracing::debug!(path = %path.display(), "file not found");
    NOT_FOUND.apply(response);
}

/// Answers 400 and drops encoding hints the caller may have set for the success case.
fn reject_codec(response: &mut Response, path: &Path, codec: Option<&str>) {
    match codec {
        None | Some("") => {
            tracing::debug!(path = %path.display(), "compression type missing")
        }
        Some(name) => {
            tracing::debug!(path = %path.display(), codec = name, "unsupported compression type")
        }
    }

    let headers = response.headers_mut();
    headers.remove(CONTENT_DISPOSITION);
    headers.remove(CONTENT_ENCODING);
    UNSUPPORTED_CODEC.apply(response);
}
