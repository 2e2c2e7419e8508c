//! The outcome of a completed dispatch.
//!
//! A `Response` only exists when a dispatch produced an HTTP exchange, so
//! its accessors never have to guard against a failed request. The body is
//! fully drained before the `Response` is built; decoding it is left to the
//! caller and may be done several ways.

use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::error::DecodeError;

/// Status line and headers of the final exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct Response {
    head: ResponseHead,
    body: Vec<u8>,
    endpoint: String,
    attempts: u64,
}

impl Response {
    pub(crate) fn new(
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        endpoint: String,
        attempts: u64,
    ) -> Self {
        Self {
            head: ResponseHead { status, headers },
            body,
            endpoint,
            attempts,
        }
    }

    pub fn raw(&self) -> &ResponseHead {
        &self.head
    }

    pub fn status_code(&self) -> u16 {
        self.head.status
    }

    /// First value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head
            .headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The endpoint that produced this response.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Attempts made by the dispatch, across all endpoints.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    /// Borrow the body as text without copying.
    pub fn text(&self) -> Result<&str, DecodeError> {
        Ok(std::str::from_utf8(&self.body)?)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        Ok(serde_json::from_slice(self.non_empty_body()?)?)
    }

    pub fn xml<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        quick_xml::de::from_reader(self.non_empty_body()?).map_err(|e| DecodeError::Xml(e.to_string()))
    }

    /// Decode a form-encoded body into key/value pairs in body order.
    ///
    /// The body must be UTF-8 with well-formed `%XX` escapes and `&`
    /// separators only.
    pub fn parse_query(&self) -> Result<Vec<(String, String)>, DecodeError> {
        let text = std::str::from_utf8(self.non_empty_body()?)?;
        check_query(text)?;
        Ok(form_urlencoded::parse(text.as_bytes()).into_owned().collect())
    }

    fn non_empty_body(&self) -> Result<&[u8], DecodeError> {
        if self.body.is_empty() {
            return Err(DecodeError::NoData);
        }
        Ok(&self.body)
    }
}

fn check_query(text: &str) -> Result<(), DecodeError> {
    if let Some(pos) = text.find(';') {
        return Err(DecodeError::Query(format!("semicolon separator at byte {pos}")));
    }
    let bytes = text.as_bytes();
    for (pos, _) in bytes.iter().enumerate().filter(|(_, b)| **b == b'%') {
        match bytes.get(pos + 1..pos + 3) {
            Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {}
            _ => return Err(DecodeError::Query(format!("invalid escape at byte {pos}"))),
        }
    }
    Ok(())
}
