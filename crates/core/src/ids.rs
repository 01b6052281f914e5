use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanId(String);

impl TraceId {
    pub fn parse(input: &str) -> Result<Self> {
        if input.len() != 32 || !input.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RelayError::InvalidArgument(format!(
                "invalid trace id: {input}"
            )));
        }
        Ok(Self(input.to_ascii_lowercase()))
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SpanId {
    pub fn parse(input: &str) -> Result<Self> {
        if input.len() != 16 || !input.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RelayError::InvalidArgument(format!(
                "invalid span id: {input}"
            )));
        }
        Ok(Self(input.to_ascii_lowercase()))
    }

    pub fn generate() -> Self {
        let full = uuid::Uuid::new_v4().simple().to_string();
        Self(full[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Source of trace and span identifiers for records that arrive without them.
/// The only non-determinism in the formatting path, kept behind a trait so
/// tests can pin the generated ids.
pub trait IdSource {
    fn trace_id(&self) -> TraceId;
    fn span_id(&self) -> SpanId;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn trace_id(&self) -> TraceId {
        TraceId::generate()
    }

    fn span_id(&self) -> SpanId {
        SpanId::generate()
    }
}
