//! Query plan construction
//!
//! Ordering rule: when a clause carries an inequality, its field sorts
//! first and `name` second; otherwise the plan sorts by `name` alone.

use serde::Serialize;

use crate::store::{Direction, Entity, EntityStore, StoreQuery};

use super::ast::Field;
use super::errors::QueryResult;
use super::explain::ExplainPlan;
use super::normalize::NormalizedFilters;

/// Canonical default sort property
pub const DEFAULT_ORDER_PROPERTY: &str = "name";

/// Immutable, store-executable plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    inequality_field: Option<Field>,
    query: StoreQuery,
}

impl QueryPlan {
    pub fn inequality_field(&self) -> Option<Field> {
        self.inequality_field
    }

    pub fn query(&self) -> &StoreQuery {
        &self.query
    }

    pub fn into_query(self) -> StoreQuery {
        self.query
    }

    /// Sort properties in priority order
    pub fn order_keys(&self) -> Vec<&str> {
        self.query.order.iter().map(|k| k.property.as_str()).collect()
    }

    pub fn explain(&self) -> ExplainPlan {
        ExplainPlan::from_plan(self)
    }

    /// Runs the plan in one store call
    pub fn execute<S: EntityStore + ?Sized>(&self, store: &S) -> QueryResult<Vec<Entity>> {
        Ok(store.fetch(&self.query)?)
    }
}

/// Composes ordering and predicates into a plan
pub struct QueryBuilder;

impl QueryBuilder {
    /// Builds a plan on top of `base` (kind and ancestor scope).
    ///
    /// Any ordering already on `base` is replaced. Predicates on `base` are
    /// kept, so callers must not put inequality predicates there.
    pub fn build(base: StoreQuery, filters: &NormalizedFilters) -> QueryPlan {
        let mut query = base.clear_order();

        if let Some(field) = filters.inequality_field {
            query = query.order_by(field.property(), Direction::Asc);
        }
        query = query.order_by(DEFAULT_ORDER_PROPERTY, Direction::Asc);

        for clause in &filters.clauses {
            query = query.filter(
                clause.field.property(),
                clause.operator.comparator(),
                clause.value.to_value(),
            );
        }

        tracing::debug!(
            inequality = ?filters.inequality_field.map(|f| f.property()),
            predicates = query.predicates.len(),
            "query plan built"
        );

        QueryPlan {
            inequality_field: filters.inequality_field,
            query,
        }
    }
}
