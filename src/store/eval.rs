//! Predicate evaluation and ordering over JSON entity bodies
//!
//! - Missing or null properties never match.
//! - Repeated (array) properties match when any element matches.
//! - Numbers compare numerically, strings lexicographically.
//! - Values of different types never match.

use std::cmp::Ordering;

use serde_json::Value;

use super::query::{Comparator, Direction, Predicate, SortKey};
use super::Entity;

/// Evaluates predicates against entity bodies
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a body matches all predicates (AND semantics)
    pub fn matches(body: &Value, predicates: &[Predicate]) -> bool {
        predicates.iter().all(|pred| Self::matches_predicate(body, pred))
    }

    fn matches_predicate(body: &Value, predicate: &Predicate) -> bool {
        match body.get(&predicate.property) {
            None | Some(Value::Null) => false,
            Some(Value::Array(items)) => items
                .iter()
                .any(|item| Self::compare(item, predicate.comparator, &predicate.value)),
            Some(actual) => Self::compare(actual, predicate.comparator, &predicate.value),
        }
    }

    fn compare(actual: &Value, comparator: Comparator, expected: &Value) -> bool {
        let ordering = match compare_scalars(actual, expected) {
            Some(o) => o,
            None => return false,
        };

        match comparator {
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Ne => ordering != Ordering::Equal,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Lte => ordering != Ordering::Greater,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Gte => ordering != Ordering::Less,
        }
    }
}

/// Orders two scalars of the same type; `None` when types differ
fn compare_scalars(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(xi), Some(yi)) = (x.as_i64(), y.as_i64()) {
                return Some(xi.cmp(&yi));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Sorts entities by a list of sort keys
pub struct ResultSorter;

impl ResultSorter {
    /// Stable multi-key sort; the entity key breaks remaining ties.
    pub fn sort(entities: &mut [Entity], order: &[SortKey]) {
        entities.sort_by(|a, b| {
            for key in order {
                let ordering = Self::compare_property(&a.body, &b.body, &key.property);
                let ordering = match key.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.key.cmp(&b.key)
        });
    }

    fn compare_property(a: &Value, b: &Value, property: &str) -> Ordering {
        let a_val = Self::sort_value(a.get(property));
        let b_val = Self::sort_value(b.get(property));

        // missing < bool < number < string
        let rank = |v: Option<&Value>| -> u8 {
            match v {
                None | Some(Value::Null) => 0,
                Some(Value::Bool(_)) => 1,
                Some(Value::Number(_)) => 2,
                Some(Value::String(_)) => 3,
                Some(_) => 4,
            }
        };

        match rank(a_val).cmp(&rank(b_val)) {
            Ordering::Equal => match (a_val, b_val) {
                (Some(x), Some(y)) => compare_scalars(x, y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
            other => other,
        }
    }

    /// Repeated properties sort by their smallest element
    fn sort_value(value: Option<&Value>) -> Option<&Value> {
        match value {
            Some(Value::Array(items)) => items
                .iter()
                .min_by(|x, y| compare_scalars(x, y).unwrap_or(Ordering::Equal)),
            other => other,
        }
    }
}
