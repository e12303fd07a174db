//! Streaming delivery: file → encoder → response body, one chunk at a time.
//!
//! The pipeline is owned by a [`DeliveryStream`]. It holds the open file and the encoder
//! until exactly one of three things happens: the file is fully compressed and sent, one
//! side of the pipeline fails, or the stream is dropped before either (the server drops
//! the body when the client goes away). All three end in the same `release` call, so the
//! file handle and encoder state are freed exactly once.

use std::{
    io,
    path::Path,
    pin::Pin,
    task::{Context, Poll, ready},
};

use bytes::Bytes;
use futures_util::{
    Stream, StreamExt,
    stream::{self, BoxStream},
};
use http::StatusCode;
use tokio::{fs::File, sync::oneshot};
use tokio_util::io::ReaderStream;

use crate::{
    body::SendBody,
    codec::{self, CompressStream, StreamCodec, StreamEncoder},
    config::DeliveryConfig,
    delivery::{Delivery, reject_codec, reject_missing},
    error::StreamFailure,
    types::Response,
};

/// Why a pipeline let go of its file and encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseReason {
    /// Every byte was compressed and handed to the body.
    Completed,
    /// Reading the file failed.
    FileError,
    /// The encoder failed.
    CompressError,
    /// The stream was dropped before it finished.
    ClientClosed,
}

type Pipeline = CompressStream<BoxStream<'static, io::Result<Bytes>>>;

/// An open compression pipeline over a byte source.
pub struct DeliveryStream {
    codec: &'static str,
    pipeline: Option<Pipeline>,
    on_release: Option<oneshot::Sender<ReleaseReason>>,
}

impl DeliveryStream {
    /// Opens `path` and wires it into a fresh encoder for `codec`.
    pub async fn open(
        path: &Path,
        codec: &'static StreamCodec,
        cfg: &DeliveryConfig,
    ) -> Result<Self, StreamFailure> {
        let file = File::open(path).await.map_err(StreamFailure::FileStream)?;
        let source = ReaderStream::with_capacity(file, cfg.chunk_size);
        Ok(Self::from_source(codec.name, source, (codec.encoder)(cfg)))
    }

    /// Builds a pipeline over an arbitrary source of uncompressed chunks.
    pub fn from_source<S>(codec: &'static str, source: S, encoder: Box<dyn StreamEncoder>) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            codec,
            pipeline: Some(CompressStream::new(source.boxed(), encoder)),
            on_release: None,
        }
    }

    /// Returns a receiver that resolves with the release reason once the pipeline is
    /// released. Only the most recent receiver is notified.
    pub fn notify_release(&mut self) -> oneshot::Receiver<ReleaseReason> {
        let (tx, rx) = oneshot::channel();
        self.on_release = Some(tx);
        rx
    }

    pub fn is_released(&self) -> bool {
        self.pipeline.is_none()
    }

    fn release(&mut self, reason: ReleaseReason) {
        let Some(pipeline) = self.pipeline.take() else {
            return;
        };
        drop(pipeline);

        tracing::debug!(codec = self.codec, ?reason, "pipeline released");
        if let Some(tx) = self.on_release.take() {
            let _ = tx.send(reason);
        }
    }
}

impl Stream for DeliveryStream {
    type Item = Result<Bytes, StreamFailure>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(pipeline) = this.pipeline.as_mut() else {
            return Poll::Ready(None);
        };

        match ready!(pipeline.poll_next_unpin(cx)) {
            Some(Ok(chunk)) => Poll::Ready(Some(Ok(chunk))),
            Some(Err(failure)) => {
                tracing::error!(codec = this.codec, error = %failure, "delivery stream failed");
                this.release(match failure {
                    StreamFailure::FileStream(_) => ReleaseReason::FileError,
                    StreamFailure::CompressStream(_) => ReleaseReason::CompressError,
                });
                Poll::Ready(Some(Err(failure)))
            }
            None => {
                this.release(ReleaseReason::Completed);
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for DeliveryStream {
    fn drop(&mut self) {
        self.release(ReleaseReason::ClientClosed);
    }
}

impl Delivery {
    /// Pipes the file through the codec's encoder into a streaming response body.
    ///
    /// Never fails: a missing file, an unknown codec and pipeline failures are all
    /// answered with a response. A failure after the first compressed chunk was produced
    /// can no longer change the status, so it ends the body with the failure message.
    pub async fn send_compressed_file_by_stream<P: AsRef<Path>>(
        &self,
        mut response: Response,
        file_path: P,
        codec: Option<&str>,
    ) -> Response {
        let path = file_path.as_ref();

        if !is_file(path).await {
            reject_missing(&mut response, path);
            return response;
        }

        let Some(descriptor) = codec.and_then(codec::stream_codec) else {
            reject_codec(&mut response, path, codec);
            return response;
        };

        *response.status_mut() = StatusCode::OK;

        match DeliveryStream::open(path, descriptor, &self.cfg).await {
            Ok(pipeline) => {
                tracing::debug!(path = %path.display(), codec = descriptor.name, "streaming");
                send_stream(response, pipeline).await
            }
            Err(failure) => {
                tracing::error!(path = %path.display(), error = %failure, "failed to open file");
                failure.reason().apply(&mut response);
                response
            }
        }
    }
}

/// Turns an open pipeline into the body of `response`.
///
/// The first chunk is produced before the response is returned, so a failure at that
/// point is still reported with a 500 status.
pub async fn send_stream(mut response: Response, mut pipeline: DeliveryStream) -> Response {
    match pipeline.next().await {
        Some(Ok(first)) => {
            let body = stream::iter([Ok(first)])
                .chain(pipeline)
                .map(|item| match item {
                    Ok(chunk) => chunk,
                    Err(failure) => Bytes::from_static(failure.message().as_bytes()),
                });
            *response.body_mut() = SendBody::from_stream(body);
        }
        Some(Err(failure)) => failure.reason().apply(&mut response),
        None => *response.body_mut() = SendBody::empty(),
    }
    response
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
