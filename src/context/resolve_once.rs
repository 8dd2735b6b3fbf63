//! A lazily resolved value guarded by a double-checked gate.
//!
//! Readers take the fast path through the slot's read lock. On a miss, callers queue on the
//! gate, re-check the slot, and only the first one runs the resolver. The slot has three
//! states: unresolved, resolved to a value, or confirmed empty. A failed resolution leaves it
//! unresolved so the next caller retries. The gate guard is released on every exit path,
//! including a caller dropping the future mid-resolution.

use std::future::Future;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone)]
enum Slot<T> {
    Unresolved,
    Resolved(T),
    Empty,
}

/// Result of [`ResolveOnce::get_or_resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<T> {
    pub value: Option<T>,
    /// `true` when the value came from the slot without running the resolver.
    pub cached: bool,
}

#[derive(Debug)]
pub struct ResolveOnce<T> {
    slot: RwLock<Slot<T>>,
    gate: Mutex<()>,
}

impl<T> Default for ResolveOnce<T> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(Slot::Unresolved),
            gate: Mutex::new(()),
        }
    }
}

impl<T: Clone> ResolveOnce<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while unresolved, `Some(None)` once confirmed empty.
    pub async fn peek(&self) -> Option<Option<T>> {
        match &*self.slot.read().await {
            Slot::Unresolved => None,
            Slot::Resolved(value) => Some(Some(value.clone())),
            Slot::Empty => Some(None),
        }
    }

    pub async fn get_or_resolve<F, Fut, E>(&self, resolve: F) -> Result<Lookup<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if let Some(value) = self.peek().await {
            return Ok(Lookup { value, cached: true });
        }

        let _gate = self.gate.lock().await;

        if let Some(value) = self.peek().await {
            return Ok(Lookup { value, cached: true });
        }

        let value = resolve().await?;
        *self.slot.write().await = match &value {
            Some(v) => Slot::Resolved(v.clone()),
            None => Slot::Empty,
        };

        Ok(Lookup { value, cached: false })
    }

    /// Applies `update` to a resolved value. Returns whether anything was changed.
    pub async fn update_resolved(&self, update: impl FnOnce(&mut T) -> bool) -> bool {
        match &mut *self.slot.write().await {
            Slot::Resolved(value) => update(value),
            Slot::Unresolved | Slot::Empty => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_run_the_resolver_once() {
        let once = Arc::new(ResolveOnce::<u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let once = once.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    once.get_or_resolve(|| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, ()>(Some(42))
                    })
                    .await
                    .unwrap()
                })
            })
            .collect();

        let mut fresh = 0;
        for handle in handles {
            let lookup = handle.await.unwrap();
            assert_eq!(lookup.value, Some(42));
            if !lookup.cached {
                fresh += 1;
            }
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fresh, 1);
    }

    #[tokio::test]
    async fn failure_leaves_the_slot_unresolved() {
        let once = ResolveOnce::<u32>::new();

        let failed = once.get_or_resolve(|| async { Err::<Option<u32>, _>("offline") }).await;
        assert_eq!(failed, Err("offline"));
        assert_eq!(once.peek().await, None);

        let lookup = once.get_or_resolve(|| async { Ok::<_, &str>(Some(7)) }).await.unwrap();
        assert_eq!(lookup, Lookup { value: Some(7), cached: false });
    }

    #[tokio::test]
    async fn empty_outcome_is_remembered() {
        let once = ResolveOnce::<u32>::new();

        once.get_or_resolve(|| async { Ok::<_, ()>(None) }).await.unwrap();
        let lookup = once
            .get_or_resolve(|| async { Ok::<_, ()>(Some(1)) })
            .await
            .unwrap();

        assert_eq!(lookup, Lookup { value: None, cached: true });
        assert!(!once.update_resolved(|v| { *v += 1; true }).await);
    }

    #[tokio::test]
    async fn cancelled_resolution_releases_the_gate() {
        let once = ResolveOnce::<u32>::new();

        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            once.get_or_resolve(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, ()>(Some(1))
            }),
        )
        .await;
        assert!(cancelled.is_err());

        let lookup = tokio::time::timeout(
            Duration::from_secs(1),
            once.get_or_resolve(|| async { Ok::<_, ()>(Some(2)) }),
        )
        .await
        .expect("gate must be free after cancellation")
        .unwrap();
        assert_eq!(lookup.value, Some(2));
    }

    #[tokio::test]
    async fn updates_only_touch_a_resolved_value() {
        let once = ResolveOnce::<u32>::new();
        assert!(!once.update_resolved(|v| { *v = 5; true }).await);

        once.get_or_resolve(|| async { Ok::<_, ()>(Some(1)) }).await.unwrap();
        assert!(once.update_resolved(|v| { *v = 5; true }).await);

        assert_eq!(once.peek().await, Some(Some(5)));
    }
}
