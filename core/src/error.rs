//! Error types for the failover dispatcher.
//!
//! # Design
//! Errors are split by the phase that produces them. Builder failures
//! (`RequestError`) surface from `set_json` / `set_xml`; everything that
//! stops a dispatch lands in `DispatchError`; decoding a finished response
//! returns `DecodeError` from the specific decode call and is never stored,
//! so one response can be decoded several ways.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a `Config`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A retry status outside the 100..=599 range can never match a response.
    #[error("retry status {0} is not a valid HTTP status code")]
    InvalidRetryStatus(u16),
}

/// A structured body could not be encoded by `set_json` / `set_xml`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("json serialization failed: {0}")]
    Json(String),

    #[error("xml serialization failed: {0}")]
    Xml(String),
}

/// An endpoint could not be turned into a transport request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid endpoint URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("unsupported URL scheme {scheme:?} in endpoint {url:?}")]
    UnsupportedScheme { url: String, scheme: String },
}

/// Coarse classification of a failed round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, reset, DNS failure.
    Connect,
    /// The per-attempt timeout elapsed.
    Timeout,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Connect => write!(f, "connect"),
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::Other => write!(f, "transport"),
        }
    }
}

/// A single HTTP exchange failed before a response status was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Reasons a dispatch produced no `Response`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unsupported HTTP method {0:?}")]
    UnsupportedMethod(String),

    #[error("no endpoint defined")]
    NoEndpoint,

    /// The request carries a pending `set_json` / `set_xml` failure.
    #[error("request body could not be encoded: {0}")]
    Encode(#[from] RequestError),

    /// The last endpoint tried could not be built into a request.
    #[error("endpoint {endpoint:?} rejected after {attempts} attempt(s): {source}")]
    InvalidEndpoint {
        endpoint: String,
        attempts: u64,
        #[source]
        source: BuildError,
    },

    /// Every endpoint was exhausted and the last attempt failed in transport.
    #[error("request to {endpoint:?} failed after {attempts} attempt(s): {source}")]
    Transport {
        endpoint: String,
        attempts: u64,
        #[source]
        source: TransportError,
    },

    #[error("failed to read response body from {endpoint:?}: {source}")]
    BodyRead {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned by the decoding accessors on `Response`.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The response body is empty. Distinct from a malformed body.
    #[error("no data")]
    NoData,

    #[error("response body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("json decode failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xml decode failed: {0}")]
    Xml(String),

    #[error("query decode failed: {0}")]
    Query(String),
}
