//! HTTP server hosting the delivery functions.
//!
//! The server owns everything the delivery component leaves to its caller: picking the
//! codec from the query string, mapping request file names onto the served directory
//! without escaping it, choosing buffered or streaming delivery, and turning a failed
//! buffered delivery into a generic 500.
//!
//! | route                                                         | action                  |
//! |---------------------------------------------------------------|-------------------------|
//! | `GET /`                                                       | usage line              |
//! | `GET /compress?file=..&compression=..&mode=buffer\|stream`    | compressed download     |
//! | `DELETE /compress?file=..&marker=..`                          | remove the file         |
//!
//! # Examples
//!
//! ```rust,no_run
//! use zipsend::{serve, server::AppState, delivery::Delivery};
//! use tokio::net::TcpListener;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let listener = TcpListener::bind("127.0.0.1:5700").await?;
//! serve(listener, AppState::new("./public", Delivery::default())).await?;
//! # Ok(())
//! # }
//! ```

use std::{
    convert::Infallible,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use http::{
    HeaderValue, Method, StatusCode,
    header::{CONTENT_DISPOSITION, CONTENT_TYPE},
};
use hyper::{Request, body::Incoming, server::conn::http1, service::service_fn};
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::{
    codec,
    delivery::Delivery,
    remove::remove_file,
    responder::Responder,
    types::{BoxError, Response},
};

const USAGE: &str =
    "GET /compress?file=<name>&compression=<gzip|deflate|br>&mode=<buffer|stream>\n";

/// Shared, read-only state of the server.
#[derive(Clone, Debug)]
pub struct AppState {
    root: PathBuf,
    delivery: Delivery,
}

impl AppState {
    pub fn new<P: Into<PathBuf>>(root: P, delivery: Delivery) -> Self {
        Self {
            root: root.into(),
            delivery,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Buffer,
    Stream,
}

#[derive(Debug, Default, Deserialize)]
struct FileQuery {
    file: Option<String>,
    compression: Option<String>,
    #[serde(default)]
    mode: Mode,
    marker: Option<String>,
}

/// Starts the server with the given listener and state.
///
/// Each connection is handled in a separate tokio task. Returns only when accepting a
/// connection fails.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), BoxError> {
    let state = Arc::new(state);
    let addr = listener.local_addr()?;
    tracing::info!(
        root = %state.root.display(),
        "server started, available at http://{addr}"
    );

    loop {
        let (stream, peer) = listener.accept().await?;
        let io = hyper_util::rt::TokioIo::new(stream);
        let state = state.clone();

        // Spawn a new task to handle each incoming connection.
        tokio::spawn(async move {
            let svc = service_fn(move |req: Request<Incoming>| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(dispatch(req, &state).await) }
            });

            let mut http = http1::Builder::new();
            http.keep_alive(true);

            if let Err(err) = http.serve_connection(io, svc).await {
                tracing::debug!(%peer, error = %err, "error serving connection");
            }
        });
    }
}

/// Routes one request. Only the method, path and query are looked at.
pub async fn dispatch<B>(req: Request<B>, state: &AppState) -> Response {
    let (parts, _) = req.into_parts();

    match (&parts.method, parts.uri.path()) {
        (&Method::GET, "/") => {
            let mut res = USAGE.into_response();
            res.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            res
        }
        (&Method::GET, "/compress") => match parse_query(parts.uri.query()) {
            Ok(query) => download(query, state).await,
            Err(res) => res,
        },
        (&Method::DELETE, "/compress") => match parse_query(parts.uri.query()) {
            Ok(query) => delete(query, state).await,
            Err(res) => res,
        },
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

fn parse_query(query: Option<&str>) -> Result<FileQuery, Response> {
    serde_urlencoded::from_str(query.unwrap_or_default()).map_err(|err| {
        tracing::debug!(error = %err, "invalid query");
        (StatusCode::BAD_REQUEST, "Invalid query").into_response()
    })
}

async fn download(query: FileQuery, state: &AppState) -> Response {
    let Some(path) = query.file.as_deref().and_then(|f| resolve(&state.root, f)) else {
        return (StatusCode::BAD_REQUEST, "Invalid file path").into_response();
    };

    let mut response = ().into_response();
    if let Some(value) = query
        .compression
        .as_deref()
        .and_then(codec::buffered_codec)
        .and_then(|codec| attachment(&path, codec.extension))
    {
        response.headers_mut().insert(CONTENT_DISPOSITION, value);
    }

    let compression = query.compression;
    match query.mode {
        Mode::Stream => {
            state
                .delivery
                .send_compressed_file_by_stream(response, &path, compression.as_deref())
                .await
        }
        Mode::Buffer => {
            let delivery = state.delivery.clone();
            let joined = tokio::task::spawn_blocking(move || {
                delivery.send_compressed_file(response, &path, compression.as_deref())
            })
            .await;

            match joined {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => {
                    tracing::error!(error = ?err, "buffered delivery failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
                }
                Err(err) => {
                    tracing::error!(error = %err, "buffered delivery task panicked");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
                }
            }
        }
    }
}

async fn delete(query: FileQuery, state: &AppState) -> Response {
    let Some(path) = query.file.as_deref().and_then(|f| resolve(&state.root, f)) else {
        return (StatusCode::BAD_REQUEST, "Invalid file path").into_response();
    };

    let marker = query.marker;
    let removed = tokio::task::spawn_blocking(move || remove_file(&path, marker.as_deref()))
        .await
        .unwrap_or(false);

    if removed {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Joins a request file name onto `root`, refusing anything that could leave it.
fn resolve(root: &Path, name: &str) -> Option<PathBuf> {
    let rel = Path::new(name);
    let contained = rel
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    if name.is_empty() || !contained {
        return None;
    }
    Some(root.join(rel))
}

fn attachment(path: &Path, extension: &str) -> Option<HeaderValue> {
    let name = path.file_name()?.to_str()?;
    HeaderValue::from_str(&format!("attachment; filename=\"{name}.{extension}\"")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_escapes() {
        let root = Path::new("/srv");
        assert_eq!(
            resolve(root, "docs/a.txt"),
            Some(PathBuf::from("/srv/docs/a.txt"))
        );
        assert_eq!(resolve(root, "./a.txt"), Some(PathBuf::from("/srv/./a.txt")));
        assert_eq!(resolve(root, ""), None);
        assert_eq!(resolve(root, "../etc/passwd"), None);
        assert_eq!(resolve(root, "docs/../../x"), None);
        assert_eq!(resolve(root, "/etc/passwd"), None);
    }

    #[test]
    fn attachment_appends_extension() {
        let value = attachment(Path::new("/srv/report.csv"), "gz").unwrap();
        assert_eq!(value, "attachment; filename=\"report.csv.gz\"");
    }

    #[test]
    fn query_defaults_to_buffer_mode() {
        let query = parse_query(Some("file=a.txt&compression=br")).unwrap();
        assert_eq!(query.file.as_deref(), Some("a.txt"));
        assert_eq!(query.compression.as_deref(), Some("br"));
        assert_eq!(query.mode, Mode::Buffer);

        let query = parse_query(Some("file=a.txt&mode=stream")).unwrap();
        assert_eq!(query.mode, Mode::Stream);
        assert!(query.compression.is_none());

        assert!(parse_query(Some("mode=sideways")).is_err());
    }
}
