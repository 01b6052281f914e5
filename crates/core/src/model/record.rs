use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SpanId, TraceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallOutcome {
    Success,
    Failure,
}

impl CallOutcome {
    pub fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::Failure }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// One inter-service call, immutable once created. Trace and span ids are
/// optional on arrival; the formatter fills them in before the record reaches
/// the holding buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallRecord {
    pub ts: DateTime<Utc>,
    pub source: String,
    pub destination: String,
    pub method: String,
    pub request: String,
    pub response: String,
    pub outcome: CallOutcome,
    pub trace_id: Option<TraceId>,
    pub span_id: Option<SpanId>,
    pub parent_span_id: Option<SpanId>,
}

impl CallRecord {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        method: impl Into<String>,
        request: impl Into<String>,
        response: impl Into<String>,
        outcome: CallOutcome,
    ) -> Self {
        Self {
            ts: Utc::now(),
            source: source.into(),
            destination: destination.into(),
            method: method.into(),
            request: request.into(),
            response: response.into(),
            outcome,
            trace_id: None,
            span_id: None,
            parent_span_id: None,
        }
    }

    pub fn with_trace(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_span(mut self, span_id: SpanId) -> Self {
        self.span_id = Some(span_id);
        self
    }

    pub fn with_parent_span(mut self, parent_span_id: SpanId) -> Self {
        self.parent_span_id = Some(parent_span_id);
        self
    }
}
