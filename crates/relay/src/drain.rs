use futures::future::join_all;
use logrelay_buffer::BufferStore;
use logrelay_core::Result;
use logrelay_core::broker::StreamBroker;
use logrelay_core::format::routing_key;
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
pub struct DrainConfig {
    pub buffer_key: String,
    pub topic: String,
    pub batch_size: usize,
}

/// Outcome of one drain cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries read from the buffer and handed to the broker.
    pub attempted: usize,
    /// Whether the read window was removed from the buffer.
    pub trimmed: bool,
    /// Publishes the broker rejected; those entries are gone from the buffer.
    pub publish_failures: usize,
}

impl DrainReport {
    fn noop() -> Self {
        Self {
            attempted: 0,
            trimmed: false,
            publish_failures: 0,
        }
    }
}

/// Moves bounded batches from the buffer tail into the stream. One drainer
/// per buffer key; `drain_once` takes `&mut self`, so a cycle can never
/// overlap itself while concurrent writers keep pushing to the head.
pub struct Drainer<S, B> {
    store: S,
    broker: B,
    cfg: DrainConfig,
}

impl<S: BufferStore, B: StreamBroker> Drainer<S, B> {
    pub fn new(store: S, broker: B, cfg: DrainConfig) -> Self {
        Self { store, broker, cfg }
    }

    /// One drain cycle. Reads up to `batch_size` of the oldest entries,
    /// publishes them concurrently in oldest-first order, then trims exactly
    /// the read window whatever the individual publish outcomes were. A
    /// rejected publish is logged with the entry content and the entry is
    /// lost: delivery is best-effort per entry, bounded buffer growth and
    /// forward progress win over replay.
    ///
    /// A failed read aborts the cycle before anything is trimmed, so the next
    /// tick retries from the same state. A failed trim is escalated as the
    /// cycle's error since the window may be re-read, and re-published, next
    /// tick.
    pub async fn drain_once(&mut self) -> Result<DrainReport> {
        let entries = self
            .store
            .range_tail(&self.cfg.buffer_key, self.cfg.batch_size)
            .await?;
        if entries.is_empty() {
            debug!(key = %self.cfg.buffer_key, "buffer empty, nothing to drain");
            return Ok(DrainReport::noop());
        }

        let attempted = entries.len();
        let results = join_all(entries.iter().map(|entry| {
            self.broker
                .publish(&self.cfg.topic, routing_key(entry), entry)
        }))
        .await;

        let mut publish_failures = 0;
        for (entry, result) in entries.iter().zip(&results) {
            if let Err(e) = result {
                publish_failures += 1;
                warn!(error = ?e, entry = %entry, "publish failed; entry leaves the buffer anyway");
            }
        }

        if let Err(e) = self.store.trim_tail(&self.cfg.buffer_key, attempted).await {
            error!(
                error = ?e,
                attempted,
                "trim failed after publish; this window may be delivered again next cycle"
            );
            return Err(e);
        }

        Ok(DrainReport {
            attempted,
            trimmed: true,
            publish_failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use logrelay_buffer::MemoryBuffer;
    use logrelay_core::RelayError;
    use testkit::RecordingBroker;

    use super::*;

    const KEY: &str = "logs:list";

    fn config(batch_size: usize) -> DrainConfig {
        DrainConfig {
            buffer_key: KEY.to_string(),
            topic: "logs-topic".to_string(),
            batch_size,
        }
    }

    async fn fill(buffer: &MemoryBuffer, count: usize) {
        for n in 0..count {
            buffer.push_head(KEY, &format!("e{n}")).await.unwrap();
        }
    }

    /// Store wrapper that fails a chosen operation, for cycle-abort tests.
    #[derive(Clone)]
    struct FailingStore {
        inner: MemoryBuffer,
        fail_range: Arc<AtomicBool>,
        fail_trim: Arc<AtomicBool>,
    }

    impl FailingStore {
        fn new(inner: MemoryBuffer) -> Self {
            Self {
                inner,
                fail_range: Arc::new(AtomicBool::new(false)),
                fail_trim: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl BufferStore for FailingStore {
        async fn push_head(&self, key: &str, value: &str) -> Result<()> {
            self.inner.push_head(key, value).await
        }

        async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
            self.inner.expire(key, ttl).await
        }

        async fn range_tail(&self, key: &str, max: usize) -> Result<Vec<String>> {
            if self.fail_range.load(Ordering::SeqCst) {
                return Err(RelayError::DrainRead("store unreachable".to_string()));
            }
            self.inner.range_tail(key, max).await
        }

        async fn trim_tail(&self, key: &str, drained: usize) -> Result<()> {
            if self.fail_trim.load(Ordering::SeqCst) {
                return Err(RelayError::DrainTrim("store unreachable".to_string()));
            }
            self.inner.trim_tail(key, drained).await
        }

        async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
            self.inner.set_with_ttl(key, value, ttl).await
        }
    }

    #[tokio::test]
    async fn publishes_in_append_order() {
        let buffer = MemoryBuffer::new();
        fill(&buffer, 3).await;
        let broker = RecordingBroker::new();
        let mut drainer = Drainer::new(buffer.clone(), broker.clone(), config(10));

        let report = drainer.drain_once().await.unwrap();

        assert_eq!(report.attempted, 3);
        assert!(report.trimmed);
        assert_eq!(broker.payloads(), vec!["e0", "e1", "e2"]);
        assert!(buffer.is_empty(KEY));
    }

    #[tokio::test]
    async fn drains_at_most_batch_size_oldest_first() {
        let buffer = MemoryBuffer::new();
        fill(&buffer, 5).await;
        let broker = RecordingBroker::new();
        let mut drainer = Drainer::new(buffer.clone(), broker.clone(), config(3));

        let report = drainer.drain_once().await.unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(broker.payloads(), vec!["e0", "e1", "e2"]);
        assert_eq!(buffer.entries(KEY), vec!["e3", "e4"]);
    }

    #[tokio::test]
    async fn empty_buffer_is_a_noop() {
        let buffer = MemoryBuffer::new();
        let broker = RecordingBroker::new();
        let mut drainer = Drainer::new(buffer.clone(), broker.clone(), config(10));

        let report = drainer.drain_once().await.unwrap();

        assert_eq!(report, DrainReport::noop());
        assert!(broker.published().is_empty());
    }

    #[tokio::test]
    async fn failed_publish_is_still_trimmed() {
        let buffer = MemoryBuffer::new();
        fill(&buffer, 3).await;
        let broker = RecordingBroker::new();
        broker.fail_when_payload_contains("e1");
        let mut drainer = Drainer::new(buffer.clone(), broker.clone(), config(10));

        let report = drainer.drain_once().await.unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.publish_failures, 1);
        assert!(report.trimmed);
        assert_eq!(broker.payloads(), vec!["e0", "e2"]);
        // The failed entry is gone from the buffer too: documented loss case.
        assert!(buffer.is_empty(KEY));
    }

    #[tokio::test]
    async fn read_failure_aborts_without_trim() {
        let buffer = MemoryBuffer::new();
        fill(&buffer, 2).await;
        let store = FailingStore::new(buffer.clone());
        store.fail_range.store(true, Ordering::SeqCst);
        let broker = RecordingBroker::new();
        let mut drainer = Drainer::new(store.clone(), broker.clone(), config(10));

        let err = drainer.drain_once().await.unwrap_err();

        assert!(matches!(err, RelayError::DrainRead(_)));
        assert!(broker.published().is_empty());
        assert_eq!(buffer.len(KEY), 2);

        // Next tick recovers from the same state.
        store.fail_range.store(false, Ordering::SeqCst);
        let report = drainer.drain_once().await.unwrap();
        assert_eq!(report.attempted, 2);
        assert!(buffer.is_empty(KEY));
    }

    #[tokio::test]
    async fn trim_failure_is_escalated_after_publish() {
        let buffer = MemoryBuffer::new();
        fill(&buffer, 2).await;
        let store = FailingStore::new(buffer.clone());
        store.fail_trim.store(true, Ordering::SeqCst);
        let broker = RecordingBroker::new();
        let mut drainer = Drainer::new(store, broker.clone(), config(10));

        let err = drainer.drain_once().await.unwrap_err();

        assert!(matches!(err, RelayError::DrainTrim(_)));
        // Publishes were attempted before the trim failed; the window stays
        // in the buffer and may be delivered again next cycle.
        assert_eq!(broker.payloads(), vec!["e0", "e1"]);
        assert_eq!(buffer.len(KEY), 2);
    }

    #[tokio::test]
    async fn overfull_buffer_drains_across_cycles() {
        let buffer = MemoryBuffer::new();
        fill(&buffer, 1500).await;
        let broker = RecordingBroker::new();
        let mut drainer = Drainer::new(buffer.clone(), broker.clone(), config(1000));

        let first = drainer.drain_once().await.unwrap();
        assert_eq!(first.attempted, 1000);
        assert_eq!(buffer.len(KEY), 500);

        let second = drainer.drain_once().await.unwrap();
        assert_eq!(second.attempted, 500);
        assert!(buffer.is_empty(KEY));

        let payloads = broker.payloads();
        assert_eq!(payloads.len(), 1500);
        assert_eq!(payloads[0], "e0");
        assert_eq!(payloads[1499], "e1499");
    }
}
