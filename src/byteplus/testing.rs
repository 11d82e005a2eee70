//! Test doubles for the transport and sleep seams.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::byteplus::transport::{HttpTransport, Sleeper};
use crate::error::TransportError;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub api_key: String,
    pub body: Value,
}

/// Replays scripted results in order; fails with `Other` once exhausted.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    call_count: AtomicUsize,
}

impl MockTransport {
    pub fn new(responses: Vec<Result<Value, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn replying(body: Value) -> Self {
        Self::new(vec![Ok(body)])
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &Value,
    ) -> Result<Value, TransportError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            api_key: api_key.to_string(),
            body: body.clone(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".into())))
    }
}

/// Records requested sleeps without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    durations: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn durations(&self) -> Vec<Duration> {
        self.durations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.durations.lock().unwrap().push(duration);
    }
}
