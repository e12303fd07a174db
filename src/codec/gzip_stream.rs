//! Gzip compression for file delivery.
//!
//! Gzip is the most widely supported encoding on the web. This module provides both the
//! whole-buffer compressor registered under `gzip` and the incremental encoder used when
//! the file is streamed. Both emit RFC 1952 gzip with the configured level.

use std::io::{self, Write};

use flate2::{Compression, write::GzEncoder};

use crate::{codec::StreamEncoder, config::DeliveryConfig};

/// Compresses a whole buffer using Gzip.
pub fn compress_gzip(data: &[u8], cfg: &DeliveryConfig) -> io::Result<Vec<u8>> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::new(cfg.gzip_level));
    enc.write_all(data)?;
    enc.finish()
}

/// Creates an incremental Gzip encoder.
pub fn gzip_encoder(cfg: &DeliveryConfig) -> Box<dyn StreamEncoder> {
    Box::new(GzipEncoder(GzEncoder::new(
        Vec::new(),
        Compression::new(cfg.gzip_level),
    )))
}

/// Gzip encoder writing into an in-memory buffer that is drained after every chunk.
struct GzipEncoder(GzEncoder<Vec<u8>>);

impl StreamEncoder for GzipEncoder {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.0.write_all(chunk)
    }

    fn finish(&mut self) -> io::Result<()> {
        // Writes the remaining deflate blocks and the CRC/length trailer.
        self.0.try_finish()
    }

    fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(self.0.get_mut())
    }
}
