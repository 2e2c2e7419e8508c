//! Resilient HTTP dispatch with per-endpoint retry and ordered failover.
//!
//! # Overview
//! A `Client` binds a shared `Config` (timeout, retryable statuses, retry
//! budget, retry interval) to a `Transport`. Each `Request` built from it
//! collects endpoints, headers and a payload, then a verb method runs the
//! retry/failover traversal and returns a `Response` with the drained body.
//!
//! # Design
//! - The dispatcher owns every control-flow decision; a transport performs
//!   exactly one exchange per call, so traversal is testable with an
//!   in-memory transport.
//! - Dispatch returns `Result<Response, DispatchError>`; a `Response` always
//!   describes a real exchange, and decode failures are returned per call.
//! - `Config` is read-only once wrapped by a `Client`.

pub mod client;
pub mod config;
mod dispatch;
pub mod error;
pub mod http;
pub mod request;
pub mod response;
pub mod transport;

pub use client::Client;
pub use config::Config;
pub use error::{BuildError, ConfigError, DecodeError, DispatchError, RequestError, TransportError, TransportErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody};
pub use request::Request;
pub use response::{Response, ResponseHead};
pub use transport::{Transport, UreqTransport};
