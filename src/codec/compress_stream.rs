//! Incremental compression of a byte stream.
//!
//! [`CompressStream`] sits between a file-reading stream and the response body. It pulls a
//! chunk from the source only when its own consumer polls it, so the amount of data held in
//! memory is bounded by one source chunk plus the encoder's internal window, no matter how
//! large the file is.
//!
//! Encoder work never runs on the async executor. Each chunk, and the final flush, is
//! handed to tokio's blocking pool together with the encoder, and the stream yields while
//! the job runs. An expensive codec therefore delays only its own response.
//!
//! Failures are reported on two separate channels: an error yielded by the source becomes
//! [`StreamFailure::FileStream`], an error raised by the encoder becomes
//! [`StreamFailure::CompressStream`]. Either one ends the stream.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};

use bytes::Bytes;
use futures_util::Stream;
use pin_project_lite::pin_project;
use tokio::task::JoinHandle;

use crate::error::StreamFailure;

/// An encoder that accepts input in pieces and hands back whatever compressed output it
/// has produced so far.
///
/// Dropping an encoder that was never finished must be cheap: it happens when the client
/// goes away mid-stream.
pub trait StreamEncoder: Send {
    /// Feeds one chunk of uncompressed input.
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Ends the compressed stream, emitting any trailer.
    fn finish(&mut self) -> io::Result<()>;

    /// Takes the compressed bytes produced since the previous call.
    fn take_output(&mut self) -> Vec<u8>;
}

/// The encoder coming back from the blocking pool, with what it produced.
struct Encoded {
    encoder: Box<dyn StreamEncoder>,
    output: io::Result<Vec<u8>>,
}

enum State {
    Reading,
    Encoding {
        job: JoinHandle<Encoded>,
        last: bool,
    },
    Ended,
}

pin_project! {
    /// Streaming compressor wrapping a source of uncompressed chunks.
    ///
    /// Must be polled from within a tokio runtime.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use zipsend::{codec::{self, CompressStream}, config::DeliveryConfig};
    /// use futures_util::{stream, StreamExt};
    /// use bytes::Bytes;
    ///
    /// # async fn example() {
    /// let source = stream::iter(vec![
    ///     Ok(Bytes::from("first chunk")),
    ///     Ok(Bytes::from("second chunk")),
    /// ]);
    /// let gzip = codec::stream_codec("gzip").unwrap();
    /// let mut compressed = CompressStream::new(source, (gzip.encoder)(&DeliveryConfig::default()));
    ///
    /// while let Some(chunk) = compressed.next().await {
    ///     println!("{} compressed bytes", chunk.unwrap().len());
    /// }
    /// # }
    /// ```
    pub struct CompressStream<S> {
        #[pin] inner: S,
        // `None` while a job owns the encoder.
        encoder: Option<Box<dyn StreamEncoder>>,
        state: State,
    }
}

impl<S> CompressStream<S> {
    pub fn new(inner: S, encoder: Box<dyn StreamEncoder>) -> Self {
        Self {
            inner,
            encoder: Some(encoder),
            state: State::Reading,
        }
    }
}

/// Runs one encoder step on the blocking pool: `Some` writes a chunk, `None` finishes.
fn spawn_encode(mut encoder: Box<dyn StreamEncoder>, chunk: Option<Bytes>) -> JoinHandle<Encoded> {
    tokio::task::spawn_blocking(move || {
        let written = match chunk {
            Some(chunk) => encoder.write_chunk(&chunk),
            None => encoder.finish(),
        };
        let output = written.map(|()| encoder.take_output());
        Encoded { encoder, output }
    })
}

impl<S> Stream for CompressStream<S>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    type Item = Result<Bytes, StreamFailure>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            match this.state {
                State::Ended => return Poll::Ready(None),
                State::Encoding { job, last } => {
                    let last = *last;
                    let joined = ready!(Pin::new(job).poll(cx));
                    *this.state = if last { State::Ended } else { State::Reading };

                    let output = match joined {
                        Ok(Encoded { encoder, output }) => {
                            *this.encoder = Some(encoder);
                            output
                        }
                        Err(err) => Err(io::Error::other(err)),
                    };
                    match output {
                        Ok(out) if out.is_empty() => continue,
                        Ok(out) => return Poll::Ready(Some(Ok(Bytes::from(out)))),
                        Err(e) => {
                            *this.state = State::Ended;
                            return Poll::Ready(Some(Err(StreamFailure::CompressStream(e))));
                        }
                    }
                }
                State::Reading => {
                    let chunk = match ready!(this.inner.as_mut().poll_next(cx)) {
                        Some(Ok(chunk)) => Some(chunk),
                        Some(Err(e)) => {
                            *this.state = State::Ended;
                            return Poll::Ready(Some(Err(StreamFailure::FileStream(e))));
                        }
                        None => None,
                    };
                    let Some(encoder) = this.encoder.take() else {
                        *this.state = State::Ended;
                        return Poll::Ready(None);
                    };
                    *this.state = State::Encoding {
                        last: chunk.is_none(),
                        job: spawn_encode(encoder, chunk),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use futures_util::{StreamExt, stream};

    use super::*;
    use crate::{codec::gzip_stream::gzip_encoder, config::DeliveryConfig};

    struct BrokenEncoder;

    impl StreamEncoder for BrokenEncoder {
        fn write_chunk(&mut self, _chunk: &[u8]) -> io::Result<()> {
            Err(io::Error::other("encoder exploded"))
        }

        fn finish(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn take_output(&mut self) -> Vec<u8> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn compresses_every_chunk_of_the_source() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ]);
        let chunks: Vec<_> = CompressStream::new(source, gzip_encoder(&DeliveryConfig::default()))
            .collect()
            .await;

        let body: Vec<u8> = chunks
            .into_iter()
            .flat_map(|chunk| chunk.unwrap().to_vec())
            .collect();
        let mut out = String::new();
        flate2::read::GzDecoder::new(&body[..])
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn source_error_surfaces_on_the_file_channel_and_ends_the_stream() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::other("disk gone")),
            Ok(Bytes::from_static(b"never read")),
        ]);
        let mut compressed =
            CompressStream::new(source, gzip_encoder(&DeliveryConfig::default()));

        let mut failure = None;
        while let Some(item) = compressed.next().await {
            if let Err(e) = item {
                failure = Some(e);
                break;
            }
        }
        assert!(matches!(failure, Some(StreamFailure::FileStream(_))));
        assert!(compressed.next().await.is_none());
    }

    #[tokio::test]
    async fn encoder_error_surfaces_on_the_compress_channel() {
        let source = stream::iter(vec![Ok(Bytes::from_static(b"data"))]);
        let mut compressed = CompressStream::new(source, Box::new(BrokenEncoder));

        let first = compressed.next().await;
        assert!(matches!(first, Some(Err(StreamFailure::CompressStream(_)))));
        assert!(compressed.next().await.is_none());
    }
}
