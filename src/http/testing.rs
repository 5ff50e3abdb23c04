//! Scripted in-memory [`Transport`] for unit tests.

use crate::http::error::TransportFailure;
use crate::http::transport::{RawResponse, Transport};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub url: String,
    pub headers: HeaderMap,
    pub at: Instant,
}

/// Replays queued responses in order and records every call it receives.
/// Once the queue is drained every further call fails as a transport error.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<RawResponse, TransportFailure>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(status).expect("valid status code");
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse::new(status, body)));
        self
    }

    pub fn fail(self, failure: TransportFailure) -> Self {
        self.replies.lock().unwrap().push_back(Err(failure));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        _timeout: Duration,
    ) -> Result<RawResponse, TransportFailure> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            headers: headers.clone(),
            at: Instant::now(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportFailure::new("no scripted reply left")))
    }
}
