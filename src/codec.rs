//! Codec registry: the fixed set of compression algorithms a file can be delivered with.
//!
//! Two registries share the same names. `BUFFERED_CODECS` holds whole-buffer compressors
//! used by buffered delivery, `STREAM_CODECS` holds encoder constructors used to build a
//! [`CompressStream`] for streaming delivery. Both are plain statics, looked up by name and
//! never mutated.
//!
//! | name      | extension | format                  |
//! |-----------|-----------|-------------------------|
//! | `gzip`    | `gz`      | RFC 1952 gzip           |
//! | `deflate` | `dfl`     | RFC 1950 zlib (deflate) |
//! | `br`      | `br`      | RFC 7932 brotli         |
//!
//! # Examples
//!
//! ```rust
//! use zipsend::{codec, config::DeliveryConfig};
//!
//! let gzip = codec::buffered_codec("gzip").unwrap();
//! assert_eq!(gzip.extension, "gz");
//! let compressed = (gzip.compress)(b"hello world", &DeliveryConfig::default()).unwrap();
//!
//! assert!(codec::stream_codec("lz4").is_none());
//! ```

use std::io;

use crate::config::DeliveryConfig;

pub mod brotli_stream;
pub mod compress_stream;
pub mod deflate_stream;
pub mod gzip_stream;

pub use compress_stream::{CompressStream, StreamEncoder};

/// Whole-buffer compressor.
pub type CompressFn = fn(&[u8], &DeliveryConfig) -> io::Result<Vec<u8>>;

/// Constructor of a fresh incremental encoder.
pub type EncoderFn = fn(&DeliveryConfig) -> Box<dyn StreamEncoder>;

/// Registry entry for buffered delivery.
pub struct BufferedCodec {
    /// Codec name as passed by callers.
    pub name: &'static str,
    /// File-extension label for the compressed artifact.
    pub extension: &'static str,
    pub compress: CompressFn,
}

/// Registry entry for streaming delivery.
pub struct StreamCodec {
    /// Codec name as passed by callers.
    pub name: &'static str,
    /// File-extension label for the compressed artifact.
    pub extension: &'static str,
    pub encoder: EncoderFn,
}

pub static BUFFERED_CODECS: [BufferedCodec; 3] = [
    BufferedCodec {
        name: "gzip",
        extension: "gz",
        compress: gzip_stream::compress_gzip,
    },
    BufferedCodec {
        name: "deflate",
        extension: "dfl",
        compress: deflate_stream::compress_deflate,
    },
    BufferedCodec {
        name: "br",
        extension: "br",
        compress: brotli_stream::compress_brotli,
    },
];

pub static STREAM_CODECS: [StreamCodec; 3] = [
    StreamCodec {
        name: "gzip",
        extension: "gz",
        encoder: gzip_stream::gzip_encoder,
    },
    StreamCodec {
        name: "deflate",
        extension: "dfl",
        encoder: deflate_stream::deflate_encoder,
    },
    StreamCodec {
        name: "br",
        extension: "br",
        encoder: brotli_stream::brotli_encoder,
    },
];

/// Looks up a whole-buffer compressor by codec name. Names are matched exactly.
pub fn buffered_codec(name: &str) -> Option<&'static BufferedCodec> {
    BUFFERED_CODECS.iter().find(|codec| codec.name == name)
}

/// Looks up a streaming encoder constructor by codec name. Names are matched exactly.
pub fn stream_codec(name: &str) -> Option<&'static StreamCodec> {
    STREAM_CODECS.iter().find(|codec| codec.name == name)
}
