//! Scripted [`Exchange`] for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use reqwest::StatusCode;

use crate::upstream::client::{Exchange, RawResponse, UpstreamRequest};
use crate::upstream::types::TransportError;

/// Replays queued outcomes in order and remembers every request it saw.
#[derive(Clone, Default)]
pub struct ScriptedExchange {
    script: Arc<Mutex<VecDeque<Result<RawResponse, TransportError>>>>,
    seen: Arc<Mutex<Vec<UpstreamRequest>>>,
}

impl ScriptedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: Result<RawResponse, TransportError>) -> &Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn respond(&self, status: StatusCode, body: impl Into<String>) -> &Self {
        self.push(Ok(RawResponse::new(status, body)))
    }

    pub fn respond_json(&self, status: StatusCode, body: serde_json::Value) -> &Self {
        self.respond(status, body.to_string())
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Exchange for ScriptedExchange {
    async fn exchange(&self, request: &UpstreamRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".into())))
    }
}
