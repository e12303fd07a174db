//! Body, error and response aliases shared across the crate.

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;

use crate::body::SendBody;

pub type BoxBody = UnsyncBoxBody<Bytes, BoxError>;
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Response = http::Response<SendBody>;
