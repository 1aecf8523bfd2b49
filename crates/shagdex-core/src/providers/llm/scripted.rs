//! Scripted oracle double for tests: replays a queued sequence of replies
//! and errors, with an optional perpetual fallback for loop-termination
//! scenarios. No network, fully deterministic.

use super::{Oracle, OracleReply, OracleRequest};
use crate::errors::OracleError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Result<OracleReply, OracleError>>>,
    fallback: Mutex<Option<OracleReply>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, reply: OracleReply) -> &Self {
        self.script.lock().unwrap().push_back(Ok(reply));
        self
    }

    pub fn enqueue_error(&self, error: OracleError) -> &Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Reply returned forever once the queue runs dry. Used to prove the
    /// orchestrator terminates on its own round limit.
    pub fn set_fallback(&self, reply: OracleReply) -> &Self {
        *self.fallback.lock().unwrap() = Some(reply);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn chat(&self, _request: &OracleRequest) -> Result<OracleReply, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(step) = self.script.lock().unwrap().pop_front() {
            return step;
        }
        if let Some(fallback) = self.fallback.lock().unwrap().clone() {
            return Ok(fallback);
        }
        Err(OracleError::Malformed(
            "scripted oracle exhausted".to_string(),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
