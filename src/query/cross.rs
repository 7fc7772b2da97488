//! Cross-predicate resolution
//!
//! Handles predicate combinations one store query cannot express, such as
//! two inequality conditions on different properties. Each side runs as its
//! own key-only query; the key sets are intersected and only the surviving
//! keys are loaded, in one batch.
//!
//! Sub-queries run concurrently on the blocking pool and are joined before
//! any result is produced. Any failing sub-query fails the whole call.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::try_join_all;

use crate::model::EntityKey;
use crate::store::{Entity, EntityStore, StoreError, StoreQuery, StoreResult};

use super::errors::QueryResult;

/// Runs restricted queries concurrently and combines their results
pub struct CrossPredicateResolver<S> {
    store: Arc<S>,
}

impl<S> Clone for CrossPredicateResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: EntityStore + 'static> CrossPredicateResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Keys matched by both `a` and `b`, in the order `a` returned them
    pub async fn intersect_keys(&self, a: StoreQuery, b: StoreQuery) -> QueryResult<Vec<EntityKey>> {
        let (a_keys, b_keys) = tokio::try_join!(
            self.blocking(move |store| store.fetch_keys(&a)),
            self.blocking(move |store| store.fetch_keys(&b)),
        )?;

        let b_set: HashSet<EntityKey> = b_keys.into_iter().collect();
        let a_len = a_keys.len();
        let keys: Vec<EntityKey> = a_keys.into_iter().filter(|k| b_set.contains(k)).collect();

        tracing::debug!(left = a_len, right = b_set.len(), common = keys.len(), "key sets intersected");
        Ok(keys)
    }

    /// Entities matched by both `a` and `b`.
    ///
    /// Result order is unspecified; callers re-sort when order matters.
    /// No batch load is issued when the intersection is empty.
    pub async fn intersect(&self, a: StoreQuery, b: StoreQuery) -> QueryResult<Vec<Entity>> {
        let keys = self.intersect_keys(a, b).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        self.blocking(move |store| store.batch_get(&keys)).await
    }

    /// Runs `template` once per ancestor, concurrently, and concatenates the
    /// results in ancestor order.
    pub async fn fan_out_by_ancestor(&self, ancestors: &[EntityKey], template: &StoreQuery) -> QueryResult<Vec<Entity>> {
        let reads = ancestors.iter().map(|ancestor| {
            let query = template.clone().ancestor(ancestor.clone());
            self.blocking(move |store| store.fetch(&query))
        });

        let batches = try_join_all(reads).await?;
        tracing::debug!(ancestors = ancestors.len(), "fan-out joined");
        Ok(batches.into_iter().flatten().collect())
    }

    async fn blocking<T, F>(&self, f: F) -> QueryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> StoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| StoreError::unavailable(format!("store task failed: {}", e)))?;
        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Kind;
    use crate::store::{Comparator, MemoryStore};
    use serde_json::json;

    fn session_store() -> (Arc<MemoryStore>, EntityKey) {
        let store = Arc::new(MemoryStore::new());
        let conf = EntityKey::root(Kind::Profile, "alice").child(Kind::Conference, "c1");
        let sessions = [
            ("s1", "Intro", "workshop", "09:00:00"),
            ("s2", "Deep Dive", "lecture", "10:00:00"),
            ("s3", "Keynote", "keynote", "18:00:00"),
            ("s4", "Evening Lab", "workshop", "20:00:00"),
            ("s5", "Late Talk", "lecture", "21:00:00"),
        ];
        for (id, name, kind, start) in sessions {
            store
                .put(Entity::new(
                    conf.child(Kind::Session, id),
                    json!({"name": name, "typeOfSession": [kind], "startTime": start}),
                ))
                .unwrap();
        }
        (store, conf)
    }

    fn not_type(kind: &str) -> StoreQuery {
        StoreQuery::kind(Kind::Session).filter("typeOfSession", Comparator::Ne, json!(kind))
    }

    fn starts_before(time: &str) -> StoreQuery {
        StoreQuery::kind(Kind::Session).filter("startTime", Comparator::Lt, json!(time))
    }

    fn ids(entities: &[Entity]) -> Vec<String> {
        let mut ids: Vec<_> = entities.iter().map(|e| e.key.id().to_string()).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_intersect_two_inequality_predicates() {
        let (store, _) = session_store();
        let resolver = CrossPredicateResolver::new(Arc::clone(&store));

        let found = resolver
            .intersect(not_type("workshop"), starts_before("19:00:00"))
            .await
            .unwrap();

        assert_eq!(ids(&found), vec!["s2", "s3"]);
        let counts = store.op_counts();
        assert_eq!(counts.key_fetches, 2);
        assert_eq!(counts.batch_gets, 1);
    }

    #[tokio::test]
    async fn test_disjoint_sets_skip_batch_load() {
        let (store, _) = session_store();
        let resolver = CrossPredicateResolver::new(Arc::clone(&store));

        let only_late = StoreQuery::kind(Kind::Session).filter("startTime", Comparator::Gt, json!("20:30:00"));
        let found = resolver.intersect(starts_before("09:30:00"), only_late).await.unwrap();

        assert!(found.is_empty());
        assert_eq!(store.op_counts().batch_gets, 0);
    }

    #[tokio::test]
    async fn test_empty_side_skips_batch_load() {
        let (store, _) = session_store();
        let resolver = CrossPredicateResolver::new(Arc::clone(&store));

        let found = resolver
            .intersect(not_type("workshop"), starts_before("00:00:00"))
            .await
            .unwrap();

        assert!(found.is_empty());
        assert_eq!(store.op_counts().batch_gets, 0);
    }

    #[tokio::test]
    async fn test_subset_returns_subset_either_order() {
        let (store, _) = session_store();
        let resolver = CrossPredicateResolver::new(store);

        let early = starts_before("11:00:00");
        let not_keynote = not_type("keynote");

        let ab = resolver.intersect_keys(early.clone(), not_keynote.clone()).await.unwrap();
        let ba = resolver.intersect_keys(not_keynote, early).await.unwrap();

        let as_set = |keys: Vec<EntityKey>| keys.into_iter().collect::<HashSet<_>>();
        let ab = as_set(ab);
        assert_eq!(ab.len(), 2);
        assert_eq!(ab, as_set(ba));
    }

    #[tokio::test]
    async fn test_store_failure_is_fatal() {
        let (store, _) = session_store();
        store.set_unavailable(true);
        let resolver = CrossPredicateResolver::new(Arc::clone(&store));

        let err = resolver
            .intersect(not_type("workshop"), starts_before("19:00:00"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONF_STORE_UNAVAILABLE");
        assert!(!err.is_client_fault());
    }

    #[tokio::test]
    async fn test_fan_out_keeps_ancestor_order() {
        let store = Arc::new(MemoryStore::new());
        let alice = EntityKey::root(Kind::Profile, "alice");
        let c1 = alice.child(Kind::Conference, "c1");
        let c2 = alice.child(Kind::Conference, "c2");
        store.put(Entity::new(c1.child(Kind::Session, "a"), json!({"name": "A", "date": "2026-06-03"}))).unwrap();
        store.put(Entity::new(c2.child(Kind::Session, "b"), json!({"name": "B", "date": "2026-06-03"}))).unwrap();
        store.put(Entity::new(c2.child(Kind::Session, "c"), json!({"name": "C", "date": "2026-06-04"}))).unwrap();

        let resolver = CrossPredicateResolver::new(Arc::clone(&store));
        let template = StoreQuery::kind(Kind::Session).filter("date", Comparator::Eq, json!("2026-06-03"));

        let found = resolver.fan_out_by_ancestor(&[c2, c1], &template).await.unwrap();
        let names: Vec<_> = found.iter().map(|e| e.body["name"].clone()).collect();
        assert_eq!(names, vec![json!("B"), json!("A")]);
        assert_eq!(store.op_counts().fetches, 2);
    }

    #[tokio::test]
    async fn test_fan_out_with_no_ancestors() {
        let store = Arc::new(MemoryStore::new());
        let resolver = CrossPredicateResolver::new(Arc::clone(&store));

        let found = resolver
            .fan_out_by_ancestor(&[], &StoreQuery::kind(Kind::Session))
            .await
            .unwrap();
        assert!(found.is_empty());
        assert_eq!(store.op_counts().fetches, 0);
    }
}
