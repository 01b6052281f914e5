use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use logrelay_core::broker::StreamBroker;
use logrelay_core::ids::{IdSource, SpanId, TraceId};
use logrelay_core::model::record::{CallOutcome, CallRecord};
use logrelay_core::{RelayError, Result};

/// Deterministic id source: every generated id is the same fixed pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedIds;

impl IdSource for FixedIds {
    fn trace_id(&self) -> TraceId {
        TraceId::parse("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
    }

    fn span_id(&self) -> SpanId {
        SpanId::parse("00f067aa0ba902b7").unwrap()
    }
}

/// A call record with a fixed timestamp, distinguished by `n`.
pub fn sample_call(n: usize) -> CallRecord {
    let mut record = CallRecord::new(
        "svcA",
        "svcB",
        "GET",
        format!("req{n}"),
        format!("resp{n}"),
        CallOutcome::Success,
    );
    record.ts = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap() + Duration::seconds(n as i64);
    record
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEntry {
    pub topic: String,
    pub key: Option<String>,
    pub payload: String,
}

/// Broker fake that records every publish and can be scripted to fail for
/// payloads containing a given substring.
#[derive(Debug, Clone, Default)]
pub struct RecordingBroker {
    published: Arc<Mutex<Vec<PublishedEntry>>>,
    fail_needles: Arc<Mutex<Vec<String>>>,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_when_payload_contains(&self, needle: impl Into<String>) {
        self.fail_needles.lock().unwrap().push(needle.into());
    }

    pub fn published(&self) -> Vec<PublishedEntry> {
        self.published.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.payload.clone())
            .collect()
    }
}

impl StreamBroker for RecordingBroker {
    async fn publish(&self, topic: &str, key: Option<&str>, payload: &str) -> Result<()> {
        let rejected = self
            .fail_needles
            .lock()
            .unwrap()
            .iter()
            .any(|needle| payload.contains(needle.as_str()));
        if rejected {
            return Err(RelayError::Publish(format!(
                "scripted failure for payload: {payload}"
            )));
        }

        self.published.lock().unwrap().push(PublishedEntry {
            topic: topic.to_string(),
            key: key.map(str::to_string),
            payload: payload.to_string(),
        });
        Ok(())
    }
}
