use std::future::Future;
use std::time::Duration;

use logrelay_core::Result;

/// Contract with the holding buffer: an ordered sequence of entries per key,
/// newest at the head, plus a handful of keyed values for trace linkage.
/// Keys come into existence on first push and are purged by the store once
/// their expiration window passes without a refresh.
pub trait BufferStore: Send + Sync {
    /// Pushes one entry to the head of the sequence at `key`.
    fn push_head(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Resets the expiration window of `key`. No-op for absent keys.
    fn expire(&self, key: &str, ttl: Duration) -> impl Future<Output = Result<()>> + Send;

    /// Reads up to `max` entries from the tail of the sequence, oldest first.
    fn range_tail(
        &self,
        key: &str,
        max: usize,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Removes the `drained` oldest entries from the sequence at `key`.
    fn trim_tail(&self, key: &str, drained: usize) -> impl Future<Output = Result<()>> + Send;

    /// Stores a single value under `key` with its own expiration window.
    fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<()>> + Send;
}
