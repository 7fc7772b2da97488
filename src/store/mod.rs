//! Entity store adapter contract
//!
//! The query engine only needs a small surface from the backing store:
//! get/put, batch get, ancestor-scoped queries with filters and ordering,
//! key-only fetch, key allocation and an all-or-nothing transaction.
//!
//! # Store rules relied on by the query engine
//!
//! - At most one property per query may carry a non-equality comparator
//! - That property must be the first sort key whenever a sort is given
//!
//! Adapters reject violating queries with `StoreError::InvalidQuery`.

mod errors;
mod eval;
mod memory;
mod query;

use serde_json::Value;

use crate::model::{EntityKey, Kind, Model, Stored};

pub use errors::{StoreError, StoreResult};
pub use eval::{PredicateFilter, ResultSorter};
pub use memory::{MemoryStore, OpCounts};
pub use query::{Comparator, Direction, Predicate, SortKey, StoreQuery};

/// A stored entity: key plus JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub key: EntityKey,
    pub body: Value,
}

impl Entity {
    pub fn new(key: EntityKey, body: Value) -> Self {
        Self { key, body }
    }

    /// Encodes a model under `key`
    pub fn from_model<M: Model>(key: EntityKey, model: &M) -> StoreResult<Self> {
        let body = serde_json::to_value(model).map_err(|e| StoreError::codec(key.encode(), e.to_string()))?;
        Ok(Self { key, body })
    }

    /// Decodes the body into a model
    pub fn decode<M: Model>(&self) -> StoreResult<M> {
        if self.key.kind() != M::KIND {
            return Err(StoreError::codec(
                self.key.encode(),
                format!("expected kind {}, found {}", M::KIND, self.key.kind()),
            ));
        }
        serde_json::from_value(self.body.clone()).map_err(|e| StoreError::codec(self.key.encode(), e.to_string()))
    }

    /// Decodes into a model paired with its key
    pub fn into_stored<M: Model>(self) -> StoreResult<Stored<M>> {
        let value = self.decode()?;
        Ok(Stored::new(self.key, value))
    }
}

/// Reads and staged writes inside a transaction
pub trait Transaction {
    fn get(&self, key: &EntityKey) -> StoreResult<Option<Entity>>;
    fn put(&mut self, entity: Entity) -> StoreResult<()>;
}

/// Backing entity store
pub trait EntityStore: Send + Sync {
    /// Fetch one entity
    fn get(&self, key: &EntityKey) -> StoreResult<Option<Entity>>;

    /// Insert or replace an entity
    fn put(&self, entity: Entity) -> StoreResult<EntityKey>;

    /// Fetch many entities; missing keys are skipped, input order kept
    fn batch_get(&self, keys: &[EntityKey]) -> StoreResult<Vec<Entity>>;

    /// Run a query returning full entities
    fn fetch(&self, query: &StoreQuery) -> StoreResult<Vec<Entity>>;

    /// Run a query returning keys only
    fn fetch_keys(&self, query: &StoreQuery) -> StoreResult<Vec<EntityKey>>;

    /// Allocate a fresh key of `kind` under `parent`
    fn allocate_key(&self, kind: Kind, parent: Option<&EntityKey>) -> EntityKey;

    /// Run `f` so that all of its writes commit together or not at all.
    ///
    /// Writes are discarded when `f` returns an error.
    fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>,
        Self: Sized;
}

/// Typed read helper
pub fn get_model<S: EntityStore + ?Sized, M: Model>(store: &S, key: &EntityKey) -> StoreResult<Option<M>> {
    store.get(key)?.map(|e| e.decode()).transpose()
}

/// Decodes a batch of entities into typed records
pub fn decode_all<M: Model>(entities: Vec<Entity>) -> StoreResult<Vec<Stored<M>>> {
    entities.into_iter().map(Entity::into_stored).collect()
}
