//! In-memory API transport for unit tests

use crate::error::{Error, Result};
use crate::transport::ApiTransport;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Responder = Box<dyn Fn() -> Result<Value> + Send + Sync>;

/// One request seen by [`ScriptedTransport`]
#[derive(Clone, Debug)]
pub(crate) struct RecordedCall {
    pub endpoint: String,
    pub form: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Transport answering from per-endpoint queues of canned responses
///
/// Queued responses are consumed in order; once a queue is empty the endpoint's
/// fallback (if any) answers every further call.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    queues: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    fallbacks: HashMap<String, Responder>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for `endpoint`
    pub fn respond(self, endpoint: &str, response: Result<Value>) -> Self {
        if let Ok(mut queues) = self.queues.lock() {
            queues
                .entry(endpoint.to_string())
                .or_default()
                .push_back(response);
        }
        self
    }

    /// Answer `endpoint` with `responder` once its queue is exhausted
    pub fn fallback(
        mut self,
        endpoint: &str,
        responder: impl Fn() -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.fallbacks
            .insert(endpoint.to_string(), Box::new(responder));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }
}

/// The vendor's invalid-identifier rejection
pub(crate) fn invalid_uid() -> Error {
    Error::Api {
        code: crate::error::INVALID_IDENTIFIER_CODE.to_string(),
        message: "could not authenticate uid".to_string(),
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn post_form(&self, endpoint: &str, form: &[(&str, &str)]) -> Result<Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                endpoint: endpoint.to_string(),
                form: form
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });
        }

        let queued = self
            .queues
            .lock()
            .ok()
            .and_then(|mut q| q.get_mut(endpoint).and_then(VecDeque::pop_front));

        match queued {
            Some(response) => response,
            None => match self.fallbacks.get(endpoint) {
                Some(responder) => responder(),
                None => Err(Error::Protocol {
                    endpoint: endpoint.to_string(),
                    reason: "no scripted response".to_string(),
                }),
            },
        }
    }
}
