use std::future::Future;

use crate::error::Result;

/// Stream broker contract: takes a topic, an optional routing key and a
/// payload, and resolves once the broker acknowledges or rejects the
/// publish. Implementations must tolerate concurrent publishes within one
/// drain batch.
pub trait StreamBroker: Send + Sync {
    fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}
