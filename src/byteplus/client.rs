use std::sync::Arc;

use serde_json::Value;

use crate::{
    byteplus::transport::{HttpTransport, ReqwestTransport, Sleeper, TokioSleeper},
    config::{RetryPolicy, SeedreamConfig},
    error::{Result, TransportError},
};

/// Authenticated POST client for the ARK API with linear-backoff retries.
#[derive(Clone)]
pub struct ArkClient {
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    api_key: String,
    config: SeedreamConfig,
}

impl ArkClient {
    pub fn new(config: &SeedreamConfig) -> Result<Self> {
        config.require_api_key()?;
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::with_transport(config, Arc::new(transport), Arc::new(TokioSleeper))
    }

    pub fn with_transport(
        config: &SeedreamConfig,
        transport: Arc<dyn HttpTransport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        Ok(Self {
            transport,
            sleeper,
            api_key,
            config: config.clone(),
        })
    }

    pub async fn post(
        &self,
        endpoint: &str,
        payload: &Value,
    ) -> std::result::Result<Value, TransportError> {
        self.post_with_policy(endpoint, payload, self.config.retry)
            .await
    }

    /// Every failure is retried the same way; the last one is returned as is.
    pub async fn post_with_policy(
        &self,
        endpoint: &str,
        payload: &Value,
        policy: RetryPolicy,
    ) -> std::result::Result<Value, TransportError> {
        let url = self.config.endpoint_url(endpoint);
        let max_attempts = policy.max_attempts();
        let mut attempt = 1;

        loop {
            match self.transport.post_json(&url, &self.api_key, payload).await {
                Ok(body) => {
                    log::debug!("ARK response from {}: {}", endpoint, body);
                    return Ok(body);
                }
                Err(err) if attempt < max_attempts => {
                    let delay = policy.delay_for(attempt);
                    log::warn!(
                        "ARK request to {} failed (attempt {}/{}, transient: {}): {}; retrying in {:.1}s",
                        endpoint,
                        attempt,
                        max_attempts,
                        err.is_transient(),
                        err,
                        delay.as_secs_f64()
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    log::error!(
                        "ARK request to {} failed after {} attempt(s): {}",
                        endpoint,
                        attempt,
                        err
                    );
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byteplus::testing::{MockTransport, RecordingSleeper};
    use serde_json::json;
    use std::time::Duration;

    fn config() -> SeedreamConfig {
        SeedreamConfig::new()
            .with_api_key("test-key")
            .with_base_url("http://ark.test/api/v3")
            .with_stream(false)
    }

    #[tokio::test]
    async fn test_sends_to_base_url_with_bearer_key() {
        let transport = Arc::new(MockTransport::new(vec![Ok(json!({"ok": true}))]));
        let client =
            ArkClient::with_transport(&config(), transport.clone(), Arc::new(RecordingSleeper::default()))
                .unwrap();

        let body = client
            .post("/images/generations", &json!({"prompt": "p"}))
            .await
            .unwrap();

        assert_eq!(body, json!({"ok": true}));
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "http://ark.test/api/v3/images/generations");
        assert_eq!(calls[0].api_key, "test-key");
        assert_eq!(calls[0].body, json!({"prompt": "p"}));
    }

    #[tokio::test]
    async fn test_last_failure_is_returned_unchanged() {
        let transport = Arc::new(MockTransport::new(vec![
            Err(TransportError::Timeout("first".into())),
            Err(TransportError::Connect("second".into())),
            Err(TransportError::Status {
                status: 400,
                body: "bad request".into(),
            }),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = ArkClient::with_transport(&config(), transport.clone(), sleeper.clone()).unwrap();

        let err = client.post("/images/generations", &json!({})).await.unwrap_err();

        assert!(matches!(err, TransportError::Status { status: 400, .. }));
        assert_eq!(transport.call_count(), 3);
        assert_eq!(
            sleeper.durations(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn test_single_attempt_policy_never_sleeps() {
        let transport = Arc::new(MockTransport::new(vec![Err(TransportError::Other(
            "boom".into(),
        ))]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = ArkClient::with_transport(&config(), transport.clone(), sleeper.clone()).unwrap();

        let result = client
            .post_with_policy("/x", &json!({}), RetryPolicy::new(0, Duration::from_secs(1)))
            .await;

        assert!(result.is_err());
        assert_eq!(transport.call_count(), 1);
        assert!(sleeper.durations().is_empty());
    }

    #[test]
    fn test_missing_api_key_fails_construction() {
        let transport = Arc::new(MockTransport::new(vec![]));
        let result = ArkClient::with_transport(
            &SeedreamConfig::new(),
            transport.clone(),
            Arc::new(RecordingSleeper::default()),
        );
        assert!(result.is_err());
        assert_eq!(transport.call_count(), 0);
    }
}
