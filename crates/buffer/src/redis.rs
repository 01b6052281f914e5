use std::time::Duration;

use logrelay_core::{RelayError, Result};
use redis::aio::ConnectionManager;

use crate::store::BufferStore;

/// Redis-backed holding buffer. One key maps to one Redis list; pushes go to
/// the list head, so the oldest entries sit at the list tail.
#[derive(Clone)]
pub struct RedisBuffer {
    conn: ConnectionManager,
}

impl RedisBuffer {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| RelayError::Config(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| RelayError::Internal(format!("redis connect failed: {e}")))?;
        Ok(Self { conn })
    }
}

impl BufferStore for RedisBuffer {
    async fn push_head(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("LPUSH")
            .arg(key)
            .arg(value)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|e| RelayError::Write(format!("LPUSH {key} failed: {e}")))?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl.as_secs() as i64)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|e| RelayError::Write(format!("EXPIRE {key} failed: {e}")))?;
        Ok(())
    }

    async fn range_tail(&self, key: &str, max: usize) -> Result<Vec<String>> {
        if max == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        // LRANGE with a negative start reads the last `max` elements, which
        // are the oldest ones under head pushes. Redis returns them in list
        // order (newest first within the window), so reverse to oldest-first.
        let mut entries: Vec<String> = redis::cmd("LRANGE")
            .arg(key)
            .arg(-(max as i64))
            .arg(-1)
            .query_async(&mut conn)
            .await
            .map_err(|e| RelayError::DrainRead(format!("LRANGE {key} failed: {e}")))?;
        entries.reverse();
        Ok(entries)
    }

    async fn trim_tail(&self, key: &str, drained: usize) -> Result<()> {
        if drained == 0 {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        // Keep everything except the `drained` oldest entries at the tail.
        // When drained equals the list length the kept range is empty and
        // Redis drops the key, which is exactly the full-drain case.
        redis::cmd("LTRIM")
            .arg(key)
            .arg(0)
            .arg(-(drained as i64 + 1))
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| RelayError::DrainTrim(format!("LTRIM {key} failed: {e}")))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| RelayError::Write(format!("SET {key} failed: {e}")))
    }
}
