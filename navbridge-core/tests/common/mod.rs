//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use navbridge_core::{Clock, HttpResponse, NavError, Transport};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One request as the transport saw it.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Call {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Replays queued responses in order and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, NavError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<HttpResponse, NavError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, call: Call) -> Result<HttpResponse, NavError> {
        let url = call.url.clone();
        self.calls.lock().unwrap().push(call);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(NavError::Transport(format!("no scripted response for {url}"))))
    }
}

impl Transport for ScriptedTransport {
    fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, NavError> {
        self.next(Call {
            method: "GET",
            url: url.to_string(),
            query: query.to_vec(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: None,
        })
    }

    fn post_json(
        &self,
        url: &str,
        query: &[(String, String)],
        body: &Value,
    ) -> Result<HttpResponse, NavError> {
        self.next(Call {
            method: "POST",
            url: url.to_string(),
            query: query.to_vec(),
            headers: Vec::new(),
            body: Some(body.clone()),
        })
    }
}

/// Clock that advances one second per reading.
pub struct StepClock(AtomicI64);

impl StepClock {
    pub fn starting_at(t: i64) -> Self {
        Self(AtomicI64::new(t))
    }
}

impl Clock for StepClock {
    fn now_unix(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

pub fn response(body: Value) -> Result<HttpResponse, NavError> {
    Ok(HttpResponse {
        url: "scripted".into(),
        status: 200,
        body: body.to_string(),
        elapsed: Duration::from_millis(5),
    })
}

/// Successful vendor envelope around `rows`.
pub fn rows_response(rows: Vec<Value>) -> Result<HttpResponse, NavError> {
    response(json!({"error_code": 0, "msg": "success", "data": rows}))
}

pub fn price_rows(codes: &[&str]) -> Vec<Value> {
    codes
        .iter()
        .map(|c| json!({"reg_code": c, "price_date": "2024-01-05", "nav": 1.0}))
        .collect()
}

pub fn transport_failure() -> Result<HttpResponse, NavError> {
    Err(NavError::Transport("connection reset by peer".into()))
}
