//! The network seam: one HTTP exchange per call.
//!
//! # Design
//! The dispatcher owns every retry and failover decision; a `Transport`
//! only performs a single round trip and reports what happened. Non-2xx
//! statuses come back as data, never as errors, because retryability is
//! decided by the configured status set. `UreqTransport` is the default
//! blocking implementation.

use std::time::Duration;

use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, RequestBuilder};

use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody};

/// Performs one HTTP exchange.
///
/// `timeout` bounds the whole exchange up to the response head; `None`
/// waits indefinitely. The body is returned unread; dropping it releases
/// the connection.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a shared ureq agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let result = match request.method {
            HttpMethod::Get => call(self.agent.get(url), request, timeout),
            HttpMethod::Head => call(self.agent.head(url), request, timeout),
            HttpMethod::Delete => call(self.agent.delete(url), request, timeout),
            HttpMethod::Options => call(self.agent.options(url), request, timeout),
            HttpMethod::Trace => call(self.agent.trace(url), request, timeout),
            HttpMethod::Post => send(self.agent.post(url), request, timeout),
            HttpMethod::Put => send(self.agent.put(url), request, timeout),
            HttpMethod::Patch => send(self.agent.patch(url), request, timeout),
        };
        let response = result.map_err(classify)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = ResponseBody::new(response.into_body().into_reader());

        Ok(HttpResponse { status, headers, body })
    }
}

type UreqResult = Result<ureq::http::Response<ureq::Body>, ureq::Error>;

fn with_headers<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

fn call(builder: RequestBuilder<WithoutBody>, request: &HttpRequest, timeout: Option<Duration>) -> UreqResult {
    with_headers(builder, request)
        .config()
        .timeout_global(timeout)
        .build()
        .call()
}

fn send(builder: RequestBuilder<WithBody>, request: &HttpRequest, timeout: Option<Duration>) -> UreqResult {
    let builder = with_headers(builder, request)
        .config()
        .timeout_global(timeout)
        .build();
    match &request.body {
        Some(body) => builder.send(body.as_slice()),
        None => builder.send_empty(),
    }
}

fn classify(err: ureq::Error) -> TransportError {
    let kind = match &err {
        ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
        ureq::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => TransportErrorKind::Timeout,
        ureq::Error::Io(_) | ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
            TransportErrorKind::Connect
        }
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, err.to_string())
}
