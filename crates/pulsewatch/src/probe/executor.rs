use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{info, warn};

use super::checker::Transport;
use super::classify::TransportError;
use crate::error::StoreError;
use crate::model::{Heartbeat, MonitorTarget, NewHeartbeat};
use crate::store::HeartbeatStore;

/// What happened to one check
#[derive(Debug)]
pub enum CheckReport {
    /// The heartbeat was appended to the store
    Recorded(Heartbeat),
    /// The endpoint was checked but the heartbeat could not be written
    Missed {
        observation: NewHeartbeat,
        error: StoreError,
    },
}

impl CheckReport {
    pub fn is_recorded(&self) -> bool {
        matches!(self, CheckReport::Recorded(_))
    }
}

/// Probe executor - performs one check of one monitor and persists it
pub struct ProbeExecutor {
    transport: Arc<dyn Transport>,
    store: Arc<dyn HeartbeatStore>,
    timeout: Duration,
}

impl ProbeExecutor {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn HeartbeatStore>, timeout: Duration) -> Self {
        Self { transport, store, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check the monitor's URL without persisting anything
    pub async fn observe(&self, monitor: &MonitorTarget) -> NewHeartbeat {
        let start = Instant::now();

        let outcome = match timeout(self.timeout, self.transport.get(&monitor.url)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) if response.is_success() => NewHeartbeat::up(monitor.id, elapsed_ms, response.status),
            Ok(response) => NewHeartbeat::down(
                monitor.id,
                response.status,
                response.status_text.unwrap_or_else(|| "HTTP error".to_string()),
            ),
            Err(error) => NewHeartbeat::down(monitor.id, error.response_code(), error.message()),
        }
    }

    /// Check the monitor and append exactly one heartbeat
    ///
    /// Never fails: a store error is logged and reported as
    /// [`CheckReport::Missed`], and the check is not retried.
    pub async fn check_monitor(&self, monitor: &MonitorTarget) -> CheckReport {
        let observation = self.observe(monitor).await;

        match observation.response_time {
            Some(ms) => info!("{} ({}) is {} - {}ms", monitor.name, monitor.url, observation.status, ms),
            None => warn!(
                "{} ({}) is {} - {} {}",
                monitor.name,
                monitor.url,
                observation.status,
                observation.response_code,
                observation.error_message.as_deref().unwrap_or_default()
            ),
        }

        match self.store.append(observation.clone()).await {
            Ok(heartbeat) => CheckReport::Recorded(heartbeat),
            Err(error) => {
                warn!(monitor_id = %monitor.id, "Failed to record heartbeat, check is lost for this sweep: {}", error);
                CheckReport::Missed { observation, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HeartbeatStatus;
    use crate::probe::checker::{HttpResponse, ReqwestTransport};
    use crate::store::{MemoryStore, Order};
    use chrono::{Duration as ChronoDuration, Utc};
    use uuid::Uuid;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedTransport(Result<HttpResponse, TransportError>);

    #[async_trait::async_trait]
    impl Transport for FixedTransport {
        async fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
            self.0.clone()
        }
    }

    struct HangingTransport;

    #[async_trait::async_trait]
    impl Transport for HangingTransport {
        async fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
            std::future::pending().await
        }
    }

    fn target(url: &str) -> MonitorTarget {
        MonitorTarget { id: Uuid::new_v4(), name: "test".to_string(), url: url.to_string() }
    }

    async fn recorded(store: &MemoryStore, monitor: &MonitorTarget) -> Vec<Heartbeat> {
        store
            .query(monitor.id, Utc::now() - ChronoDuration::hours(1), Order::Ascending)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_check_up_against_http_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ReqwestTransport::new(Duration::from_millis(5000)).unwrap());
        let executor = ProbeExecutor::new(transport, store.clone(), Duration::from_millis(5000));
        let monitor = target(&server.uri());

        let report = executor.check_monitor(&monitor).await;
        assert!(report.is_recorded());

        let heartbeats = recorded(&store, &monitor).await;
        assert_eq!(heartbeats.len(), 1);
        assert_eq!(heartbeats[0].status, HeartbeatStatus::Up);
        assert_eq!(heartbeats[0].response_code, 200);
        assert!(heartbeats[0].response_time.is_some());
        assert!(heartbeats[0].error_message.is_none());
    }

    #[tokio::test]
    async fn test_check_down_against_http_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ReqwestTransport::new(Duration::from_millis(5000)).unwrap());
        let executor = ProbeExecutor::new(transport, store.clone(), Duration::from_millis(5000));
        let monitor = target(&server.uri());

        executor.check_monitor(&monitor).await;

        let heartbeats = recorded(&store, &monitor).await;
        assert_eq!(heartbeats.len(), 1);
        assert_eq!(heartbeats[0].status, HeartbeatStatus::Down);
        assert_eq!(heartbeats[0].response_code, 500);
        assert!(heartbeats[0].response_time.is_none());
        assert_eq!(heartbeats[0].error_message.as_deref(), Some("Internal Server Error"));
    }

    #[tokio::test]
    async fn test_check_redirect_status_is_down() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FixedTransport(Ok(HttpResponse::new(304))));
        let executor = ProbeExecutor::new(transport, store.clone(), Duration::from_millis(5000));
        let monitor = target("http://example.invalid");

        let observation = executor.observe(&monitor).await;
        assert_eq!(observation.status, HeartbeatStatus::Down);
        assert_eq!(observation.response_code, 304);
        assert_eq!(observation.error_message.as_deref(), Some("Not Modified"));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ReqwestTransport::new(Duration::from_millis(200)).unwrap());
        let executor = ProbeExecutor::new(transport, store.clone(), Duration::from_millis(200));
        let monitor = target(&server.uri());

        executor.check_monitor(&monitor).await;

        let heartbeats = recorded(&store, &monitor).await;
        assert_eq!(heartbeats.len(), 1);
        assert_eq!(heartbeats[0].status, HeartbeatStatus::Down);
        assert_eq!(heartbeats[0].response_code, 504);
        assert!(heartbeats[0].response_time.is_none());
        assert_eq!(heartbeats[0].error_message.as_deref(), Some("Request timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_transport_is_abandoned_at_timeout() {
        let store = Arc::new(MemoryStore::new());
        let executor = ProbeExecutor::new(Arc::new(HangingTransport), store.clone(), Duration::from_millis(5000));
        let monitor = target("http://example.invalid");

        let observation = executor.observe(&monitor).await;
        assert_eq!(observation.status, HeartbeatStatus::Down);
        assert_eq!(observation.response_code, 504);
    }

    #[tokio::test]
    async fn test_transport_error_mapping_is_stored() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FixedTransport(Err(TransportError::SelfSignedCertificate)));
        let executor = ProbeExecutor::new(transport, store.clone(), Duration::from_millis(5000));
        let monitor = target("https://self-signed.example");

        executor.check_monitor(&monitor).await;

        let heartbeats = recorded(&store, &monitor).await;
        assert_eq!(heartbeats[0].response_code, 525);
        assert_eq!(heartbeats[0].error_message.as_deref(), Some("Self-signed certificate"));
    }
}
