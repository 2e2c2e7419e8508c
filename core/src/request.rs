//! Fluent builder for one logical HTTP operation.
//!
//! # Design
//! Builder methods take `&mut self` and return `&mut Self` so calls chain,
//! including on the temporary returned by `Client::request`. Parameters and
//! the raw body are mutually exclusive: setting one clears the other.
//!
//! `set_json` / `set_xml` return a `Result`, and a failure is also kept as
//! the request's pending error so a dispatch refuses to send a request whose
//! body could not be encoded. Any later successful body or parameter change
//! replaces the failed body and clears the pending error.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::dispatch;
use crate::error::{DispatchError, RequestError};
use crate::http::HttpMethod;
use crate::response::Response;
use crate::transport::Transport;

const JSON_CONTENT_TYPE: &str = "application/json";
const XML_CONTENT_TYPE: &str = "application/xml";

pub struct Request {
    pub(crate) config: Arc<Config>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) endpoints: Vec<String>,
    /// Keyed by lowercased header name.
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) values: BTreeMap<String, String>,
    pub(crate) body: Vec<u8>,
    pub(crate) body_type: Option<&'static str>,
    error: Option<RequestError>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("endpoints", &self.endpoints)
            .field("headers", &self.headers)
            .field("values", &self.values)
            .field("body_len", &self.body.len())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl Request {
    pub(crate) fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            endpoints: Vec::new(),
            headers: BTreeMap::new(),
            values: BTreeMap::new(),
            body: Vec::new(),
            body_type: None,
            error: None,
        }
    }

    /// Append a failover target. URLs are validated at dispatch time.
    pub fn add_endpoint(&mut self, url: impl Into<String>) -> &mut Self {
        self.endpoints.push(url.into());
        self
    }

    pub fn set_endpoints<I, S>(&mut self, urls: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn add_header(&mut self, key: impl AsRef<str>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(key.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn set_headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();
        self
    }

    pub fn add_value(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.clear_body();
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn set_values<I, K, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.clear_body();
        self.values = values.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.replace_body(body.into(), None);
        self
    }

    pub fn set_json<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<&mut Self, RequestError> {
        match serde_json::to_vec(data) {
            Ok(buf) => {
                self.replace_body(buf, Some(JSON_CONTENT_TYPE));
                Ok(self)
            }
            Err(e) => Err(self.fail(RequestError::Json(e.to_string()))),
        }
    }

    pub fn set_xml<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<&mut Self, RequestError> {
        match quick_xml::se::to_string(data) {
            Ok(buf) => {
                self.replace_body(buf.into_bytes(), Some(XML_CONTENT_TYPE));
                Ok(self)
            }
            Err(e) => Err(self.fail(RequestError::Xml(e.to_string()))),
        }
    }

    /// The pending `set_json` / `set_xml` failure, if any.
    pub fn error(&self) -> Option<&RequestError> {
        self.error.as_ref()
    }

    pub fn get(&self) -> Result<Response, DispatchError> {
        self.send(HttpMethod::Get)
    }

    pub fn post(&self) -> Result<Response, DispatchError> {
        self.send(HttpMethod::Post)
    }

    pub fn put(&self) -> Result<Response, DispatchError> {
        self.send(HttpMethod::Put)
    }

    pub fn patch(&self) -> Result<Response, DispatchError> {
        self.send(HttpMethod::Patch)
    }

    pub fn head(&self) -> Result<Response, DispatchError> {
        self.send(HttpMethod::Head)
    }

    pub fn delete(&self) -> Result<Response, DispatchError> {
        self.send(HttpMethod::Delete)
    }

    pub fn options(&self) -> Result<Response, DispatchError> {
        self.send(HttpMethod::Options)
    }

    pub fn trace(&self) -> Result<Response, DispatchError> {
        self.send(HttpMethod::Trace)
    }

    /// Dispatch with a textual method token such as `"PATCH"`.
    pub fn dispatch(&self, method: &str) -> Result<Response, DispatchError> {
        self.send(method.parse()?)
    }

    pub fn send(&self, method: HttpMethod) -> Result<Response, DispatchError> {
        dispatch::dispatch(self, method)
    }

    fn replace_body(&mut self, body: Vec<u8>, body_type: Option<&'static str>) {
        self.values.clear();
        self.body = body;
        self.body_type = body_type;
        self.error = None;
    }

    fn clear_body(&mut self) {
        self.body.clear();
        self.body_type = None;
        self.error = None;
    }

    fn fail(&mut self, err: RequestError) -> RequestError {
        self.error = Some(err.clone());
        err
    }
}
