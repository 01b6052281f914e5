use logrelay_buffer::BufferStore;
use logrelay_core::format::Formatter;
use logrelay_core::ids::IdSource;
use logrelay_core::model::record::CallRecord;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::writer::BufferWriter;

/// Producer-facing entry point. `log` hands the record to a background task
/// that formats it and appends it to the buffer; write failures are logged,
/// never raised, so the originating service call is never blocked or failed
/// by the relay.
#[derive(Clone)]
pub struct CallLogger {
    tx: mpsc::Sender<CallRecord>,
}

impl CallLogger {
    pub fn spawn<S, G>(writer: BufferWriter<S>, formatter: Formatter<G>, capacity: usize) -> Self
    where
        S: BufferStore + 'static,
        G: IdSource + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<CallRecord>(capacity);

        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                let call = formatter.format(record);
                match writer.append(&call).await {
                    Ok(()) => debug!(entry = %call.entry, "call record buffered"),
                    Err(e) => {
                        warn!(error = ?e, entry = %call.entry, "failed to buffer call record")
                    }
                }
            }
        });

        Self { tx }
    }

    pub async fn log(&self, record: CallRecord) {
        if self.tx.send(record).await.is_err() {
            warn!("call logger dropped record: writer task closed");
        }
    }
}
