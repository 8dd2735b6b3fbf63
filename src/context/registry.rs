use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::EmployeeContext;
use crate::auth::IdentityLookup;
use crate::store::RecordStore;

/// Session-scoped employee contexts, one per subject id, expiring after a fixed TTL.
pub struct EmployeeContextRegistry {
    store: Arc<dyn RecordStore>,
    contexts: Cache<String, Arc<EmployeeContext>>,
}

impl EmployeeContextRegistry {
    pub fn new(store: Arc<dyn RecordStore>, ttl: Duration) -> Self {
        let contexts = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(10_000)
            .build();

        Self { store, contexts }
    }

    /// The live context for the caller's subject, created on first use.
    ///
    /// Concurrent first requests of one subject receive the same context. Anonymous callers
    /// get a throwaway context that resolves to no employee.
    pub async fn context_for(&self, identity: Arc<dyn IdentityLookup>) -> Arc<EmployeeContext> {
        let Some(subject_id) = identity.current_subject_id().await.filter(|s| !s.is_empty()) else {
            return Arc::new(EmployeeContext::new(self.store.clone(), identity));
        };

        let store = self.store.clone();
        self.contexts
            .get_with(subject_id, async move { Arc::new(EmployeeContext::new(store, identity)) })
            .await
    }

    pub async fn invalidate(&self, subject_id: &str) {
        self.contexts.invalidate(subject_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AnonymousIdentity;
    use crate::context::employee_context::tests::StaticIdentity;
    use crate::store::InMemoryRecordStore;

    fn registry(store: &Arc<InMemoryRecordStore>) -> EmployeeContextRegistry {
        EmployeeContextRegistry::new(store.clone(), Duration::from_secs(60))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_requests_share_one_context_and_one_row() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.set_latency(Duration::from_millis(5));
        let registry = Arc::new(registry(&store));

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let ctx = registry
                        .context_for(Arc::new(StaticIdentity::subject("oid-session")))
                        .await;
                    ctx.require_current().await.unwrap().employee_id
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }

        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.employee_insert_attempts(), 1);
    }

    #[tokio::test]
    async fn distinct_subjects_get_distinct_employees() {
        let store = Arc::new(InMemoryRecordStore::new());
        let registry = registry(&store);

        let a = registry.context_for(Arc::new(StaticIdentity::subject("oid-a"))).await;
        let b = registry.context_for(Arc::new(StaticIdentity::subject("oid-b"))).await;

        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(
            a.require_current().await.unwrap().employee_id,
            b.require_current().await.unwrap().employee_id
        );
    }

    #[tokio::test]
    async fn anonymous_contexts_are_not_cached() {
        let store = Arc::new(InMemoryRecordStore::new());
        let registry = registry(&store);

        let first = registry.context_for(Arc::new(AnonymousIdentity)).await;
        let second = registry.context_for(Arc::new(AnonymousIdentity)).await;

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.resolve_current().await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalidated_subject_gets_a_fresh_context() {
        let store = Arc::new(InMemoryRecordStore::new());
        let registry = registry(&store);
        let identity = Arc::new(StaticIdentity::subject("oid-evict"));

        let first = registry.context_for(identity.clone()).await;
        registry.invalidate("oid-evict").await;
        let second = registry.context_for(identity).await;

        assert!(!Arc::ptr_eq(&first, &second));
    }
}
