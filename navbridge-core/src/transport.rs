//! HTTP transport seam.
//!
//! The dispatcher and request descriptors only see the [`Transport`] trait,
//! so tests can script responses without a network. [`HttpTransport`] is the
//! production implementation over a blocking `reqwest` client. It does not
//! retry: a failed call is reported once and the caller decides.

use crate::config::ClientConfig;
use crate::error::NavError;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Raw response of a completed round trip with a 2xx status. `url` is the
/// endpoint without its query string, which carries signing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
    pub elapsed: Duration,
}

impl HttpResponse {
    pub fn json(&self) -> Result<Value, NavError> {
        serde_json::from_str(&self.body).map_err(|e| {
            NavError::ResponseFormat(format!("invalid JSON from {}: {e}", self.url))
        })
    }
}

pub trait Transport: Send + Sync {
    fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, NavError>;

    fn post_json(
        &self,
        url: &str,
        query: &[(String, String)],
        body: &Value,
    ) -> Result<HttpResponse, NavError>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, NavError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NavError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn finish(
        url: &str,
        started: Instant,
        sent: Result<reqwest::blocking::Response, reqwest::Error>,
    ) -> Result<HttpResponse, NavError> {
        let resp = sent.map_err(|e| {
            if e.is_timeout() {
                NavError::Transport(format!("timed out calling {url}"))
            } else {
                NavError::Transport(format!("{url}: {e}"))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NavError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| NavError::Transport(format!("reading body from {url}: {e}")))?;

        Ok(HttpResponse {
            url: url.to_string(),
            status: status.as_u16(),
            body,
            elapsed: started.elapsed(),
        })
    }
}

impl Transport for HttpTransport {
    fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, NavError> {
        let mut req = self.client.get(url).query(query);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let started = Instant::now();
        Self::finish(url, started, req.send())
    }

    fn post_json(
        &self,
        url: &str,
        query: &[(String, String)],
        body: &Value,
    ) -> Result<HttpResponse, NavError> {
        let started = Instant::now();
        let sent = self.client.post(url).query(query).json(body).send();
        Self::finish(url, started, sent)
    }
}

/// Unwrap the vendor envelope `{"error_code", "msg", "data"}`.
///
/// A non-zero `error_code` is a vendor rejection. Responses without an
/// `error_code` are passed through whole.
pub fn unwrap_envelope(body: Value) -> Result<Value, NavError> {
    let code = body.get("error_code").and_then(|c| {
        c.as_i64()
            .or_else(|| c.as_str().and_then(|s| s.trim().parse().ok()))
    });
    match code {
        None => Ok(body),
        Some(0) => Ok(body.get("data").cloned().unwrap_or(Value::Null)),
        Some(code) => Err(NavError::Vendor {
            code,
            message: body
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("no message")
                .to_string(),
        }),
    }
}

/// Extract the row list from an unwrapped `data` value: either the value
/// itself when it is an array, or its `list` field.
pub fn data_rows(data: Value) -> Result<Vec<Value>, NavError> {
    match data {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        Value::Object(mut obj) => match obj.remove("list") {
            Some(Value::Array(rows)) => Ok(rows),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(NavError::ResponseFormat(format!(
                "data.list is not an array: {other}"
            ))),
        },
        other => Err(NavError::ResponseFormat(format!(
            "data is neither a list nor an object: {other}"
        ))),
    }
}
