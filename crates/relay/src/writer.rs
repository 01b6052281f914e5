use std::time::Duration;

use logrelay_buffer::BufferStore;
use logrelay_core::Result;
use logrelay_core::format::FormattedCall;
use logrelay_core::model::record::CallRecord;

/// Appends formatted entries to the head of the holding buffer. Every push
/// resets the key's expiration to the full window, so an actively written
/// buffer never expires; only an idle one does.
pub struct BufferWriter<S> {
    store: S,
    key: String,
    ttl: Duration,
}

impl<S: BufferStore> BufferWriter<S> {
    pub fn new(store: S, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            ttl,
        }
    }

    pub async fn append(&self, call: &FormattedCall) -> Result<()> {
        self.store.push_head(&self.key, &call.entry).await?;
        self.store.expire(&self.key, self.ttl).await?;
        self.record_trace_links(&call.record).await
    }

    /// Auxiliary linkage for trace reconstruction: `trace:<spanId>` maps back
    /// to the trace id, and `trace_structure:<traceId>` accumulates the span
    /// ids of the chain. Same expiration policy as the buffer itself.
    async fn record_trace_links(&self, record: &CallRecord) -> Result<()> {
        let (Some(trace_id), Some(span_id)) = (&record.trace_id, &record.span_id) else {
            return Ok(());
        };

        self.store
            .set_with_ttl(
                &format!("trace:{}", span_id.as_str()),
                trace_id.as_str(),
                self.ttl,
            )
            .await?;

        let structure_key = format!("trace_structure:{}", trace_id.as_str());
        self.store.push_head(&structure_key, span_id.as_str()).await?;
        self.store.expire(&structure_key, self.ttl).await
    }
}

#[cfg(test)]
mod tests {
    use logrelay_buffer::MemoryBuffer;
    use logrelay_core::format::Formatter;
    use testkit::{FixedIds, sample_call};

    use super::*;

    const KEY: &str = "logs:list";
    const TTL: Duration = Duration::from_secs(86_400);

    #[tokio::test]
    async fn append_pushes_entry_and_sets_ttl() {
        let buffer = MemoryBuffer::new();
        let writer = BufferWriter::new(buffer.clone(), KEY, TTL);
        let call = Formatter::new(FixedIds).format(sample_call(1));

        writer.append(&call).await.unwrap();

        assert_eq!(buffer.entries(KEY), vec![call.entry.clone()]);
        let remaining = buffer.ttl(KEY).expect("ttl should be set");
        assert!(remaining > Duration::from_secs(86_000));
    }

    #[tokio::test]
    async fn append_resets_expiry_to_the_full_window() {
        let buffer = MemoryBuffer::new();
        let writer = BufferWriter::new(buffer.clone(), KEY, TTL);
        let formatter = Formatter::new(FixedIds);

        writer.append(&formatter.format(sample_call(0))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let ticking = buffer.ttl(KEY).expect("ttl should be set");
        assert!(ticking < TTL);

        writer.append(&formatter.format(sample_call(1))).await.unwrap();
        let refreshed = buffer.ttl(KEY).expect("ttl should be set");
        assert!(refreshed > ticking);
        assert!(refreshed > TTL - Duration::from_millis(20));
    }

    #[tokio::test]
    async fn append_preserves_arrival_order() {
        let buffer = MemoryBuffer::new();
        let writer = BufferWriter::new(buffer.clone(), KEY, TTL);
        let formatter = Formatter::new(FixedIds);

        for n in 0..3 {
            writer.append(&formatter.format(sample_call(n))).await.unwrap();
        }

        let entries = buffer.entries(KEY);
        assert!(entries[0].contains("request=req0"));
        assert!(entries[2].contains("request=req2"));
    }

    #[tokio::test]
    async fn append_records_trace_linkage() {
        let buffer = MemoryBuffer::new();
        let writer = BufferWriter::new(buffer.clone(), KEY, TTL);
        let call = Formatter::new(FixedIds).format(sample_call(1));

        writer.append(&call).await.unwrap();

        assert_eq!(
            buffer.value("trace:00f067aa0ba902b7"),
            Some("4bf92f3577b34da6a3ce929d0e0e4736".to_string())
        );
        assert_eq!(
            buffer.entries("trace_structure:4bf92f3577b34da6a3ce929d0e0e4736"),
            vec!["00f067aa0ba902b7"]
        );
    }
}
