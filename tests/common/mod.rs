#![allow(dead_code)]

use std::{fs, io::Read, path::PathBuf};

use bytes::Bytes;
use http::{
    HeaderValue,
    header::{CONTENT_DISPOSITION, CONTENT_ENCODING},
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use zipsend::{body::SendBody, types::Response};

pub const CODECS: [&str; 3] = ["gzip", "deflate", "br"];

pub struct Fixtures {
    pub dir: TempDir,
}

impl Fixtures {
    /// A directory holding `hello.txt` (`hello world`) and `lorem.txt`.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), "hello world").unwrap();
        fs::write(dir.path().join("lorem.txt"), lorem()).unwrap();
        Self { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, data).unwrap();
        path
    }
}

pub fn lorem() -> Vec<u8> {
    b"Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor. "
        .repeat(500)
}

/// Deterministic, poorly compressible bytes.
pub fn noise(len: usize) -> Vec<u8> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

pub fn empty_response() -> Response {
    Response::new(SendBody::empty())
}

/// A response carrying the encoding hints a caller sets before delegating.
pub fn preset_response() -> Response {
    let mut res = empty_response();
    res.headers_mut().insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"hello.txt.gz\""),
    );
    res.headers_mut()
        .insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    res
}

pub async fn body_bytes(res: Response) -> Bytes {
    res.into_body().collect().await.unwrap().to_bytes()
}

pub fn decode(codec: &str, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    match codec {
        "gzip" => flate2::read::GzDecoder::new(data)
            .read_to_end(&mut out)
            .unwrap(),
        "deflate" => flate2::read::ZlibDecoder::new(data)
            .read_to_end(&mut out)
            .unwrap(),
        "br" => brotli::Decompressor::new(data, 4096)
            .read_to_end(&mut out)
            .unwrap(),
        other => panic!("no decoder for {other}"),
    };
    out
}
