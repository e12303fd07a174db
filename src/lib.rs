//! Compressed single-file delivery over HTTP.
//!
//! [`delivery`] serves one file in a compressed form chosen by codec name (`gzip`,
//! `deflate` or `br`), either fully buffered or streamed through an incremental encoder.
//! [`server`] hosts both strategies behind a small hyper server.

pub mod body;
pub mod codec;
pub mod config;
pub mod delivery;
pub mod error;
pub mod remove;
pub mod responder;
pub mod server;
pub mod tracing;
pub mod types;

pub use delivery::{Delivery, send_compressed_file, send_compressed_file_by_stream};
pub use error::StreamFailure;
pub use remove::remove_file;
pub use server::serve;
