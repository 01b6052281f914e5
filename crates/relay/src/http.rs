use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use logrelay_core::ids::{SpanId, TraceId};
use logrelay_core::model::record::{CallOutcome, CallRecord};
use logrelay_core::{RelayError, Result};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::logger::CallLogger;

/// Wire shape of one call record as posted by a producer. The timestamp is
/// assigned on arrival; trace and span ids are optional and validated when
/// present.
#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub source: String,
    pub destination: String,
    pub method: String,
    #[serde(default)]
    pub request: String,
    #[serde(default)]
    pub response: String,
    pub success: bool,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub parent_span_id: Option<String>,
}

impl CallRequest {
    fn into_record(self) -> Result<CallRecord> {
        for (field, value) in [
            ("source", &self.source),
            ("destination", &self.destination),
            ("method", &self.method),
        ] {
            if value.is_empty() {
                return Err(RelayError::InvalidArgument(format!(
                    "{field} must not be empty"
                )));
            }
        }

        let mut record = CallRecord::new(
            self.source,
            self.destination,
            self.method,
            self.request,
            self.response,
            CallOutcome::from_success(self.success),
        );
        if let Some(trace_id) = self.trace_id.as_deref() {
            record.trace_id = Some(TraceId::parse(trace_id)?);
        }
        if let Some(span_id) = self.span_id.as_deref() {
            record.span_id = Some(SpanId::parse(span_id)?);
        }
        if let Some(parent) = self.parent_span_id.as_deref() {
            record.parent_span_id = Some(SpanId::parse(parent)?);
        }
        Ok(record)
    }
}

pub fn router(logger: CallLogger) -> Router {
    Router::new()
        .route("/v1/calls", post(ingest_call))
        .layer(
            TraceLayer::new_for_http()
                .on_request(tower_http::trace::DefaultOnRequest::new().level(Level::INFO))
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(logger)
}

pub async fn serve(addr: SocketAddr, logger: CallLogger) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RelayError::Internal(format!("failed to bind {addr}: {e}")))?;
    axum::serve(listener, router(logger))
        .await
        .map_err(|e| RelayError::Internal(format!("ingest server failed: {e}")))
}

async fn ingest_call(
    State(logger): State<CallLogger>,
    Json(request): Json<CallRequest>,
) -> StatusCode {
    match request.into_record() {
        Ok(record) => {
            logger.log(record).await;
            StatusCode::ACCEPTED
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejected call record");
            StatusCode::BAD_REQUEST
        }
    }
}
