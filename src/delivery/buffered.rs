use std::{fs, path::Path};

use anyhow::{Context, Result};
use http::StatusCode;

use crate::{
    body::SendBody,
    codec,
    delivery::{Delivery, reject_codec, reject_missing},
    types::Response,
};

impl Delivery {
    /// Reads the whole file, compresses it and writes it as the full response body.
    ///
    /// Blocks the calling thread for both the read and the compression; async callers
    /// should run it on a blocking pool. A missing file or an unknown codec is answered
    /// with 404 or 400. A read or compression error after those checks is returned as
    /// `Err` and no response is produced for it.
    pub fn send_compressed_file<P: AsRef<Path>>(
        &self,
        mut response: Response,
        file_path: P,
        codec: Option<&str>,
    ) -> Result<Response> {
        let path = file_path.as_ref();

        if !is_file(path) {
            reject_missing(&mut response, path);
            return Ok(response);
        }

        let Some(descriptor) = codec.and_then(codec::buffered_codec) else {
            reject_codec(&mut response, path, codec);
            return Ok(response);
        };

        *response.status_mut() = StatusCode::OK;

        let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let compressed = (descriptor.compress)(&data, &self.cfg).with_context(|| {
            format!("failed to {} compress {}", descriptor.name, path.display())
        })?;

        tracing::debug!(
            path = %path.display(),
            codec = descriptor.name,
            original = data.len(),
            compressed = compressed.len(),
            "delivered buffered"
        );

        *response.body_mut() = SendBody::from(compressed);
        Ok(response)
    }
}

fn is_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
