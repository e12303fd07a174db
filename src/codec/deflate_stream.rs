//! Deflate compression for file delivery.
//!
//! HTTP's `deflate` encoding is the zlib container (RFC 1950) around a raw deflate stream,
//! so both the buffered compressor and the incremental encoder use flate2's zlib encoder.

use std::io::{self, Write};

use flate2::{Compression, write::ZlibEncoder};

use crate::{codec::StreamEncoder, config::DeliveryConfig};

/// Compresses a whole buffer using zlib-wrapped deflate.
pub fn compress_deflate(data: &[u8], cfg: &DeliveryConfig) -> io::Result<Vec<u8>> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::new(cfg.deflate_level));
    enc.write_all(data)?;
    enc.finish()
}

/// Creates an incremental deflate encoder.
pub fn deflate_encoder(cfg: &DeliveryConfig) -> Box<dyn StreamEncoder> {
    Box::new(DeflateEncoder(ZlibEncoder::new(
        Vec::new(),
        Compression::new(cfg.deflate_level),
    )))
}

struct DeflateEncoder(ZlibEncoder<Vec<u8>>);

impl StreamEncoder for DeflateEncoder {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.0.write_all(chunk)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.0.try_finish()
    }

    fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(self.0.get_mut())
    }
}
