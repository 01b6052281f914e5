use crate::ids::IdSource;
use crate::model::record::CallRecord;

/// A record with ids resolved, plus its single-line buffer encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedCall {
    pub record: CallRecord,
    pub entry: String,
}

/// Builds the canonical buffer entry for a call record. Missing trace and
/// span ids are filled from the injected [`IdSource`]; everything else is a
/// pure function of the record, so identical finalized input renders to
/// byte-identical output.
#[derive(Debug, Clone)]
pub struct Formatter<G> {
    ids: G,
}

impl<G: IdSource> Formatter<G> {
    pub fn new(ids: G) -> Self {
        Self { ids }
    }

    pub fn format(&self, mut record: CallRecord) -> FormattedCall {
        if record.trace_id.is_none() {
            record.trace_id = Some(self.ids.trace_id());
        }
        if record.span_id.is_none() {
            record.span_id = Some(self.ids.span_id());
        }
        let entry = render(&record);
        FormattedCall { record, entry }
    }
}

fn render(record: &CallRecord) -> String {
    let trace_id = record.trace_id.as_ref().map_or("", |t| t.as_str());
    let span_id = record.span_id.as_ref().map_or("", |s| s.as_str());
    let parent = record
        .parent_span_id
        .as_ref()
        .map_or(String::new(), |p| format!("parent_span_id={}, ", p.as_str()));

    format!(
        "{} | source={}, destination={}, method={}, trace_id={}, span_id={}, {}request={}, response={}, success={}",
        record.ts.to_rfc3339(),
        record.source,
        record.destination,
        record.method,
        trace_id,
        span_id,
        parent,
        record.request,
        record.response,
        record.outcome.is_success(),
    )
}

/// Extracts the trace id back out of a formatted entry, for use as the
/// broker routing key. Entries written by other producers may not carry one.
pub fn routing_key(entry: &str) -> Option<&str> {
    let start = entry.find("trace_id=")? + "trace_id=".len();
    let rest = &entry[start..];
    let end = rest.find(',').unwrap_or(rest.len());
    let key = rest[..end].trim();
    if key.is_empty() { None } else { Some(key) }
}
