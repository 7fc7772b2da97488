//! In-memory entity store
//!
//! Entities live in a `BTreeMap` keyed by the websafe key string, so scans
//! run in key order. Transactions hold the write lock for their whole
//! duration and stage writes until the closure succeeds.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::model::{EntityKey, Kind};

use super::errors::{StoreError, StoreResult};
use super::eval::{PredicateFilter, ResultSorter};
use super::query::StoreQuery;
use super::{Entity, EntityStore, Transaction};

type EntityMap = BTreeMap<String, Entity>;

/// Per-operation call counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    pub fetches: u64,
    pub key_fetches: u64,
    pub batch_gets: u64,
    pub transactions: u64,
}

/// Entity store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: RwLock<EntityMap>,
    unavailable: AtomicBool,
    fetches: AtomicU64,
    key_fetches: AtomicU64,
    batch_gets: AtomicU64,
    transactions: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns how often each operation has been called
    pub fn op_counts(&self) -> OpCounts {
        OpCounts {
            fetches: self.fetches.load(Ordering::Relaxed),
            key_fetches: self.key_fetches.load(Ordering::Relaxed),
            batch_gets: self.batch_gets.load(Ordering::Relaxed),
            transactions: self.transactions.load(Ordering::Relaxed),
        }
    }

    /// Number of stored entities
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("memory store marked unavailable"));
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, EntityMap>> {
        self.check_available()?;
        self.entities
            .read()
            .map_err(|_| StoreError::unavailable("entity map lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, EntityMap>> {
        self.check_available()?;
        self.entities
            .write()
            .map_err(|_| StoreError::unavailable("entity map lock poisoned"))
    }

    fn run_query(&self, query: &StoreQuery) -> StoreResult<Vec<Entity>> {
        query.validate()?;
        let entities = self.read()?;

        let mut matched: Vec<Entity> = entities
            .values()
            .filter(|e| e.key.kind() == query.kind)
            .filter(|e| match &query.ancestor {
                Some(ancestor) => e.key.has_ancestor(ancestor),
                None => true,
            })
            .filter(|e| PredicateFilter::matches(&e.body, &query.predicates))
            .cloned()
            .collect();

        if !query.order.is_empty() {
            ResultSorter::sort(&mut matched, &query.order);
        }
        Ok(matched)
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, key: &EntityKey) -> StoreResult<Option<Entity>> {
        Ok(self.read()?.get(&key.encode()).cloned())
    }

    fn put(&self, entity: Entity) -> StoreResult<EntityKey> {
        let key = entity.key.clone();
        self.write()?.insert(key.encode(), entity);
        Ok(key)
    }

    fn batch_get(&self, keys: &[EntityKey]) -> StoreResult<Vec<Entity>> {
        self.batch_gets.fetch_add(1, Ordering::Relaxed);
        let entities = self.read()?;
        Ok(keys
            .iter()
            .filter_map(|k| entities.get(&k.encode()).cloned())
            .collect())
    }

    fn fetch(&self, query: &StoreQuery) -> StoreResult<Vec<Entity>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.run_query(query)
    }

    fn fetch_keys(&self, query: &StoreQuery) -> StoreResult<Vec<EntityKey>> {
        self.key_fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.run_query(query)?.into_iter().map(|e| e.key).collect())
    }

    fn allocate_key(&self, kind: Kind, parent: Option<&EntityKey>) -> EntityKey {
        let id = Uuid::new_v4().simple().to_string();
        match parent {
            Some(parent) => parent.child(kind, id),
            None => EntityKey::root(kind, id),
        }
    }

    fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.transactions.fetch_add(1, Ordering::Relaxed);
        let mut entities = self.write()?;

        let mut txn = MemoryTransaction {
            base: &entities,
            staged: BTreeMap::new(),
        };
        let value = f(&mut txn)?;

        let staged = txn.staged;
        entities.extend(staged);
        Ok(value)
    }
}

/// Staged view over the locked entity map
struct MemoryTransaction<'a> {
    base: &'a EntityMap,
    staged: EntityMap,
}

impl Transaction for MemoryTransaction<'_> {
    fn get(&self, key: &EntityKey) -> StoreResult<Option<Entity>> {
        let encoded = key.encode();
        Ok(self
            .staged
            .get(&encoded)
            .or_else(|| self.base.get(&encoded))
            .cloned())
    }

    fn put(&mut self, entity: Entity) -> StoreResult<()> {
        self.staged.insert(entity.key.encode(), entity);
        Ok(())
    }
}
