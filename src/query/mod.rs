//! Conference query engine
//!
//! Turns user filter clauses into store queries that respect the store's
//! single-inequality-property rule:
//!
//! - `normalize` resolves raw clauses and tracks the inequality field
//! - `QueryBuilder` derives ordering and produces a one-call `QueryPlan`
//! - `CrossPredicateResolver` intersects key-only queries for combinations
//!   a single query cannot express, and fans out per-ancestor reads
//! - `window_around` computes day-clamped time windows

mod ast;
mod builder;
mod cross;
mod errors;
mod explain;
mod normalize;
mod window;

pub use ast::{Field, FilterClause, Operator, RawClause, Scalar};
pub use builder::{QueryBuilder, QueryPlan, DEFAULT_ORDER_PROPERTY};
pub use cross::CrossPredicateResolver;
pub use errors::{QueryError, QueryResult, Severity};
pub use explain::ExplainPlan;
pub use normalize::{normalize, InequalityState, NormalizedFilters};
pub use window::{
    end_of_day, parse_date, parse_start_time, parse_window_minutes, window_around, TimeWindow, START_OF_DAY,
};

use crate::store::StoreQuery;

/// Normalizes `raw` and builds a plan on `base` in one step
pub fn plan(base: StoreQuery, raw: &[RawClause]) -> QueryResult<QueryPlan> {
    let filters = normalize(raw)?;
    Ok(QueryBuilder::build(base, &filters))
}
