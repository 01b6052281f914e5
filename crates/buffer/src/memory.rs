use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use logrelay_core::Result;

use crate::store::BufferStore;

/// In-process buffer with real expiration behavior. Backs every test in the
/// workspace and works as a single-process buffer where Redis is overkill.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    inner: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    lists: HashMap<String, Expiring<VecDeque<String>>>,
    values: HashMap<String, Expiring<String>>,
}

#[derive(Debug)]
struct Expiring<T> {
    value: T,
    expires_at: Option<Instant>,
}

impl<T> Expiring<T> {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries in the sequence at `key`.
    pub fn len(&self, key: &str) -> usize {
        let mut state = self.lock();
        live_list(&mut state, key).map_or(0, |list| list.len())
    }

    pub fn is_empty(&self, key: &str) -> bool {
        self.len(key) == 0
    }

    /// Live entries at `key`, oldest first.
    pub fn entries(&self, key: &str) -> Vec<String> {
        let mut state = self.lock();
        live_list(&mut state, key)
            .map_or_else(Vec::new, |list| list.iter().rev().cloned().collect())
    }

    /// Live keyed value, if any.
    pub fn value(&self, key: &str) -> Option<String> {
        let mut state = self.lock();
        match state.values.get(key) {
            Some(entry) if !entry.expired() => Some(entry.value.clone()),
            Some(_) => {
                state.values.remove(key);
                None
            }
            None => None,
        }
    }

    /// Remaining time before the sequence at `key` expires.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let mut state = self.lock();
        live_list(&mut state, key)?;
        state
            .lists
            .get(key)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn live_list<'a>(state: &'a mut State, key: &str) -> Option<&'a mut VecDeque<String>> {
    if state.lists.get(key).is_some_and(Expiring::expired) {
        state.lists.remove(key);
        return None;
    }
    state.lists.get_mut(key).map(|entry| &mut entry.value)
}

impl BufferStore for MemoryBuffer {
    async fn push_head(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.lock();
        if state.lists.get(key).is_some_and(Expiring::expired) {
            state.lists.remove(key);
        }
        state
            .lists
            .entry(key.to_string())
            .or_insert_with(|| Expiring {
                value: VecDeque::new(),
                expires_at: None,
            })
            .value
            .push_front(value.to_string());
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut state = self.lock();
        if live_list(&mut state, key).is_none() {
            return Ok(());
        }
        if let Some(entry) = state.lists.get_mut(key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn range_tail(&self, key: &str, max: usize) -> Result<Vec<String>> {
        let mut state = self.lock();
        Ok(live_list(&mut state, key).map_or_else(Vec::new, |list| {
            list.iter().rev().take(max).cloned().collect()
        }))
    }

    async fn trim_tail(&self, key: &str, drained: usize) -> Result<()> {
        let mut state = self.lock();
        if let Some(list) = live_list(&mut state, key) {
            for _ in 0..drained {
                list.pop_back();
            }
        }
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut state = self.lock();
        state.values.insert(
            key.to_string(),
            Expiring {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }
}
