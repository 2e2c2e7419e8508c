//! HTTP exchange types shared by the dispatcher and its transports.
//!
//! # Design
//! `HttpRequest` is plain data built by the dispatcher for one attempt; the
//! transport executes it. `HttpResponse` carries the status and headers as
//! data but leaves the body as an unread stream, so the dispatcher only
//! drains the body of the final attempt. Dropping an `HttpResponse` releases
//! whatever connection the transport held for it.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use crate::error::DispatchError;

/// The HTTP methods the dispatcher accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Head,
    Delete,
    Options,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Whether the method conventionally carries a request body.
    ///
    /// Parameters on methods without one are sent in the URL query instead.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DispatchError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            other => Err(DispatchError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// One attempt's request, described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// Unread response body stream handed back by a transport.
pub struct ResponseBody(Box<dyn Read>);

impl ResponseBody {
    pub fn new(reader: impl Read + 'static) -> Self {
        Self(Box::new(reader))
    }

    pub fn empty() -> Self {
        Self::new(std::io::empty())
    }

    /// Read the stream to its end.
    pub fn drain(mut self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.0.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseBody(..)")
    }
}

/// Outcome of one successful exchange, before the body is read.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}
