//! Conference service
//!
//! CRUD operations over the entity store plus the query endpoints built on
//! the query engine. Callers pass the acting user's id explicitly.
//!
//! Key layout: conferences live under their organizer's profile key and
//! sessions under their conference, so "conferences by organizer" and
//! "sessions of a conference" are ancestor queries.

mod announcements;
mod conferences;
mod errors;
mod profiles;
mod registration;
mod sessions;

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::model::{EntityKey, Kind, Model, Profile, Stored};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::query::CrossPredicateResolver;
use crate::store::{decode_all, get_model, EntityStore, StoreQuery, Transaction};

pub use conferences::ConferenceSummary;
pub use errors::{ServiceError, ServiceResult};

/// Conference backend over an entity store
pub struct ConferenceService<S> {
    store: Arc<S>,
    config: ServiceConfig,
    metrics: Arc<MetricsRegistry>,
    resolver: CrossPredicateResolver<S>,
}

impl<S: EntityStore + 'static> ConferenceService<S> {
    pub fn new(store: Arc<S>, config: ServiceConfig) -> Self {
        Self::with_metrics(store, config, Arc::new(MetricsRegistry::new()))
    }

    pub fn with_metrics(store: Arc<S>, config: ServiceConfig, metrics: Arc<MetricsRegistry>) -> Self {
        let resolver = CrossPredicateResolver::new(Arc::clone(&store));
        Self {
            store,
            config,
            metrics,
            resolver,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Loads a typed entity or fails with `NotFound`
    fn load<M: Model>(&self, key: &EntityKey) -> ServiceResult<Stored<M>> {
        let model = get_model::<S, M>(self.store.as_ref(), key)?
            .ok_or_else(|| ServiceError::not_found(format!("no {} found with key {}", M::KIND, key)))?;
        Ok(Stored::new(key.clone(), model))
    }

    /// Runs a query and decodes every result
    fn fetch_models<M: Model>(&self, operation: &str, query: &StoreQuery) -> ServiceResult<Vec<Stored<M>>> {
        let result = self
            .store
            .fetch(query)
            .map_err(ServiceError::from)
            .and_then(|entities| decode_all(entities).map_err(ServiceError::from));
        self.observe(operation, result)
    }

    /// Batch-loads typed entities, skipping keys that no longer exist
    fn batch_load<M: Model>(&self, keys: &[EntityKey]) -> ServiceResult<Vec<Stored<M>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        Ok(decode_all(self.store.batch_get(keys)?)?)
    }

    /// Counts and logs store failures on the way out
    fn observe<T>(&self, operation: &str, result: ServiceResult<T>) -> ServiceResult<T> {
        if let Err(err) = &result {
            if err.is_store_failure() {
                self.metrics.increment_store_failures();
                log_event_with_fields(Event::StoreFailure, &[("operation", operation), ("error", &err.to_string())]);
            }
        }
        result
    }
}

/// Root key of a user's profile
pub fn profile_key(user_id: &str) -> EntityKey {
    EntityKey::root(Kind::Profile, user_id)
}

/// Decodes a websafe key and checks its kind
pub fn decode_key(websafe: &str, kind: Kind) -> ServiceResult<EntityKey> {
    let key = EntityKey::decode(websafe)?;
    if key.kind() != kind {
        return Err(ServiceError::not_found(format!("no {} found with key {}", kind, websafe)));
    }
    Ok(key)
}

/// Transactional typed read that fails with `NotFound`
fn txn_load<M: Model>(txn: &dyn Transaction, key: &EntityKey) -> ServiceResult<M> {
    let entity = txn
        .get(key)?
        .ok_or_else(|| ServiceError::not_found(format!("no {} found with key {}", M::KIND, key)))?;
    Ok(entity.decode()?)
}

/// Transactional profile read; a missing profile comes back freshly
/// initialised and is stored only if the caller puts it
fn txn_profile(txn: &dyn Transaction, user_id: &str) -> ServiceResult<Stored<Profile>> {
    let key = profile_key(user_id);
    let profile = match txn.get(&key)? {
        Some(entity) => entity.decode()?,
        None => Profile::new_for_user(user_id),
    };
    Ok(Stored::new(key, profile))
}
