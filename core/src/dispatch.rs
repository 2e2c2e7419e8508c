//! Retry and failover traversal over a request's endpoints.
//!
//! # Design
//! Attempts run strictly one at a time. A failed attempt (build error,
//! transport error, or a status in the configured retry set) is retried
//! against the same endpoint up to `retry_count` times with
//! `retry_interval` between tries; once that budget is spent the next
//! endpoint is tried immediately with a fresh budget. The first attempt
//! that is not a failure ends the traversal, whatever its status. When the
//! last endpoint's budget runs out, the last attempt's outcome is reported.
//!
//! The outgoing payload is materialized once per dispatch because builder
//! state cannot change while a dispatch holds `&Request`.

use std::collections::BTreeMap;

use tracing::{debug, warn};
use url::form_urlencoded;
use url::Url;

use crate::error::{BuildError, DispatchError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::Request;
use crate::response::Response;

const CONTENT_TYPE: &str = "content-type";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// What every attempt of one dispatch sends besides the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Payload {
    Empty,
    /// Form-encoded parameters appended to each endpoint's query string.
    Query(String),
    Body {
        bytes: Vec<u8>,
        content_type: Option<&'static str>,
    },
}

impl Payload {
    pub(crate) fn materialize(request: &Request, method: HttpMethod) -> Self {
        if !request.values.is_empty() {
            let encoded = encode_form(&request.values);
            return if method.has_body() {
                Payload::Body {
                    bytes: encoded.into_bytes(),
                    content_type: Some(FORM_CONTENT_TYPE),
                }
            } else {
                Payload::Query(encoded)
            };
        }
        if method.has_body() && !request.body.is_empty() {
            return Payload::Body {
                bytes: request.body.clone(),
                content_type: request.body_type,
            };
        }
        Payload::Empty
    }

    fn content_type(&self) -> Option<&'static str> {
        match self {
            Payload::Body { content_type, .. } => *content_type,
            _ => None,
        }
    }
}

/// Encode parameters as `application/x-www-form-urlencoded`, keys sorted.
pub(crate) fn encode_form(values: &BTreeMap<String, String>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(values.iter())
        .finish()
}

enum Failure {
    Build(BuildError),
    Transport(TransportError),
}

type AttemptResult = Result<HttpResponse, Failure>;

pub(crate) fn dispatch(request: &Request, method: HttpMethod) -> Result<Response, DispatchError> {
    let span = tracing::debug_span!("dispatch", %method);
    let _guard = span.enter();

    if let Some(err) = request.error() {
        return Err(DispatchError::Encode(err.clone()));
    }
    if request.endpoints.is_empty() {
        return Err(DispatchError::NoEndpoint);
    }

    let config = &request.config;
    let payload = Payload::materialize(request, method);
    let headers = outgoing_headers(&request.headers, payload.content_type());
    let last_index = request.endpoints.len() - 1;

    let mut endpoint_index = 0;
    let mut retry = 0u32;
    let mut attempts = 0u64;

    let result = loop {
        let endpoint = request.endpoints[endpoint_index].as_str();
        attempts += 1;
        debug!(endpoint, attempt = attempts, "sending request");

        let result: AttemptResult = match build_request(method, endpoint, &payload, &headers) {
            Ok(http_request) => request
                .transport
                .execute(&http_request, config.timeout())
                .map_err(Failure::Transport),
            Err(err) => Err(Failure::Build(err)),
        };

        let reason = match &result {
            Ok(response) if !config.is_retry_status(response.status) => None,
            Ok(response) => Some(format!("retryable status {}", response.status)),
            Err(Failure::Build(err)) => Some(err.to_string()),
            Err(Failure::Transport(err)) => Some(err.to_string()),
        };
        let Some(reason) = reason else {
            debug!(endpoint, attempts, "request completed");
            break result;
        };

        if retry < config.retry_count {
            retry += 1;
            warn!(endpoint, attempt = attempts, retry, %reason, "retrying endpoint");
            drop(result);
            std::thread::sleep(config.retry_interval());
            continue;
        }
        if endpoint_index < last_index {
            endpoint_index += 1;
            retry = 0;
            warn!(
                endpoint,
                next = request.endpoints[endpoint_index].as_str(),
                %reason,
                "failing over to next endpoint"
            );
            continue;
        }
        warn!(endpoint, attempts, %reason, "all endpoints exhausted");
        break result;
    };

    let endpoint = request.endpoints[endpoint_index].clone();
    match result {
        Ok(response) => {
            let HttpResponse { status, headers, body } = response;
            let body = body.drain().map_err(|source| DispatchError::BodyRead {
                endpoint: endpoint.clone(),
                source,
            })?;
            Ok(Response::new(status, headers, body, endpoint, attempts))
        }
        Err(Failure::Build(source)) => Err(DispatchError::InvalidEndpoint {
            endpoint,
            attempts,
            source,
        }),
        Err(Failure::Transport(source)) => Err(DispatchError::Transport {
            endpoint,
            attempts,
            source,
        }),
    }
}

/// Caller headers plus a content type for the payload if the caller set none.
fn outgoing_headers(
    headers: &BTreeMap<String, String>,
    content_type: Option<&'static str>,
) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = headers
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if let Some(content_type) = content_type {
        if !headers.contains_key(CONTENT_TYPE) {
            out.push((CONTENT_TYPE.to_string(), content_type.to_string()));
        }
    }
    out
}

fn build_request(
    method: HttpMethod,
    endpoint: &str,
    payload: &Payload,
    headers: &[(String, String)],
) -> Result<HttpRequest, BuildError> {
    let mut url = Url::parse(endpoint).map_err(|e| BuildError::InvalidUrl {
        url: endpoint.to_string(),
        message: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BuildError::UnsupportedScheme {
            url: endpoint.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    let body = match payload {
        Payload::Empty => None,
        Payload::Query(query) => {
            let combined = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
                _ => query.clone(),
            };
            url.set_query(Some(&combined));
            None
        }
        Payload::Body { bytes, .. } => Some(bytes.clone()),
    };

    Ok(HttpRequest {
        method,
        url: url.into(),
        headers: headers.to_vec(),
        body,
    })
}
