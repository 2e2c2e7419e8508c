//! Verify retry and failover traversal against JSON vectors in `test-vectors/`.
//!
//! Each vector scripts the transport's answers call by call and lists the
//! URLs the dispatcher must try, in order, plus the final outcome.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use failover_core::{
    Client, Config, DispatchError, HttpRequest, HttpResponse, ResponseBody, Transport, TransportError,
    TransportErrorKind,
};

/// Replays scripted steps and records the URL of every call.
struct Scripted {
    steps: Mutex<VecDeque<serde_json::Value>>,
    urls: Mutex<Vec<String>>,
}

impl Transport for Scripted {
    fn execute(&self, request: &HttpRequest, _timeout: Option<Duration>) -> Result<HttpResponse, TransportError> {
        self.urls.lock().unwrap().push(request.url.clone());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("script exhausted at {}", request.url));

        if let Some(kind) = step.get("error") {
            let kind = match kind.as_str().unwrap() {
                "connect" => TransportErrorKind::Connect,
                "timeout" => TransportErrorKind::Timeout,
                other => panic!("unknown scripted error: {other}"),
            };
            return Err(TransportError::new(kind, "scripted"));
        }

        let body = step["body"].as_str().unwrap_or("").as_bytes().to_vec();
        Ok(HttpResponse {
            status: step["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: ResponseBody::new(std::io::Cursor::new(body)),
        })
    }
}

fn strings(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn traversal_test_vectors() {
    let raw = include_str!("../../test-vectors/traversal.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let config = Config::from_json_str(&case["config"].to_string()).unwrap();
        let transport = Arc::new(Scripted {
            steps: Mutex::new(case["script"].as_array().unwrap().iter().cloned().collect()),
            urls: Mutex::new(Vec::new()),
        });
        let client = Client::new(config.clone(), transport.clone());

        let endpoints = strings(&case["endpoints"]);
        let result = client
            .request()
            .set_endpoints(endpoints.iter().cloned())
            .dispatch(case["method"].as_str().unwrap());

        let expected_attempts = strings(&case["expected_attempts"]);
        assert_eq!(*transport.urls.lock().unwrap(), expected_attempts, "{name}: attempts");
        assert!(
            expected_attempts.len() as u64 <= config.max_attempts(endpoints.len()),
            "{name}: attempt bound"
        );
        assert!(transport.steps.lock().unwrap().is_empty(), "{name}: unused script steps");

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Transport" => assert!(matches!(err, DispatchError::Transport { .. }), "{name}: {err:?}"),
                "InvalidEndpoint" => {
                    assert!(matches!(err, DispatchError::InvalidEndpoint { .. }), "{name}: {err:?}")
                }
                "NoEndpoint" => assert!(matches!(err, DispatchError::NoEndpoint), "{name}: {err:?}"),
                "UnsupportedMethod" => {
                    assert!(matches!(err, DispatchError::UnsupportedMethod(_)), "{name}: {err:?}")
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            let response = result.unwrap();
            let expected = &case["expected_result"];
            assert_eq!(response.status_code() as u64, expected["status"].as_u64().unwrap(), "{name}: status");
            assert_eq!(response.text().unwrap(), expected["body"].as_str().unwrap(), "{name}: body");
            assert_eq!(response.endpoint(), expected["endpoint"].as_str().unwrap(), "{name}: endpoint");
        }
    }
}
