//! This module provides the `SendBody` struct, a wrapper around a boxed HTTP body.
//! Every response produced by the delivery functions carries a `SendBody`, whether it
//! holds a fully compressed buffer or a compression pipeline that is pulled chunk by chunk.

use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use http_body::{Body, Frame, SizeHint};
use http_body_util::{BodyExt, Empty, Full, StreamBody};

use crate::types::{BoxBody, BoxError};

/// The `SendBody` struct is a wrapper around a boxed HTTP body (`BoxBody`).
/// It provides utility methods for creating empty bodies and converting buffers and
/// streams into HTTP bodies.
///
/// # Example
///
/// ```rust
/// use zipsend::body::SendBody;
///
/// let empty_body = SendBody::empty();
/// let string_body = SendBody::from("File not found");
/// ```
pub struct SendBody(BoxBody);

impl SendBody {
    /// Creates a new `SendBody` from a given body.
    pub fn new<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self(body.map_err(|e| e.into()).boxed_unsync())
    }

    /// Creates an empty `SendBody`.
    pub fn empty() -> Self {
        Self::new(Empty::new())
    }

    /// Creates a streaming body from an infallible stream of byte chunks.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Bytes> + Send + 'static,
    {
        Self::new(StreamBody::new(
            stream.map(|chunk| Ok::<_, Infallible>(Frame::data(chunk))),
        ))
    }
}

impl std::fmt::Debug for SendBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendBody").finish_non_exhaustive()
    }
}

macro_rules! body_from_impl {
    ($ty:ty) => {
        impl From<$ty> for SendBody {
            fn from(buf: $ty) -> Self {
                Self::new(Full::from(buf))
            }
        }
    };
}

body_from_impl!(String);
body_from_impl!(&'static str);
body_from_impl!(Vec<u8>);
body_from_impl!(Bytes);

/// Implements the `Body` trait for `SendBody`, delegating to the inner `BoxBody`.
impl Body for SendBody {
    type Data = Bytes;
    type Error = BoxError;

    #[inline]
    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.0).poll_frame(cx)
    }

    #[inline]
    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }

    #[inline]
    fn is_end_stream(&self) -> bool {
        self.0.is_end_stream()
    }
}
