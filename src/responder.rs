//! Response generation utilities for the host routes and the delivery outcomes.
//!
//! The `Responder` trait converts handler return values into `Response`s. Besides the
//! usual string and status-code impls, `Reason` attaches a custom reason phrase to the
//! status line, which is how the delivery functions report `File not found` and friends.
//!
//! # Examples
//!
//! ```rust
//! use zipsend::responder::{Reason, Responder};
//! use http::StatusCode;
//!
//! let response = (StatusCode::OK, "ok").into_response();
//! let response = Reason(StatusCode::NOT_FOUND, "File not found").into_response();
//! ```

use std::fmt::Display;

use hyper::{StatusCode, ext::ReasonPhrase};

use crate::{body::SendBody, types::Response};

/// Trait for converting types into HTTP responses.
pub trait Responder {
    /// Converts the implementing type into an HTTP response.
    fn into_response(self) -> Response;
}

impl Responder for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl Responder for &'static str {
    fn into_response(self) -> Response {
        Response::new(SendBody::from(self))
    }
}

impl Responder for () {
    fn into_response(self) -> Response {
        Response::new(SendBody::empty())
    }
}

impl Responder for StatusCode {
    fn into_response(self) -> Response {
        let mut res = Response::new(SendBody::empty());
        *res.status_mut() = self;
        res
    }
}

impl<R> Responder for (StatusCode, R)
where
    R: Display,
{
    fn into_response(self) -> Response {
        let (status, body) = self;
        let mut res = Response::new(SendBody::from(body.to_string()));
        *res.status_mut() = status;
        res
    }
}

/// A status with a custom reason phrase; the phrase doubles as the plain-text body.
#[derive(Clone, Copy, Debug)]
pub struct Reason(pub StatusCode, pub &'static str);

impl Reason {
    /// Writes status, reason phrase and body into an existing response, keeping its
    /// remaining headers.
    pub fn apply(self, res: &mut Response) {
        let Reason(status, phrase) = self;
        *res.status_mut() = status;
        res.extensions_mut()
            .insert(ReasonPhrase::from_static(phrase.as_bytes()));
        *res.body_mut() = SendBody::from(phrase);
    }
}

impl Responder for Reason {
    fn into_response(self) -> Response {
        let mut res = Response::new(SendBody::empty());
        self.apply(&mut res);
        res
    }
}

/// Reads back the custom reason phrase set on a response, if any.
pub fn reason_phrase(res: &Response) -> Option<&str> {
    res.extensions()
        .get::<ReasonPhrase>()
        .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
}
