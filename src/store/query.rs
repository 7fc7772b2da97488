//! Store-native query handle
//!
//! A `StoreQuery` is what an adapter executes: one entity kind, an optional
//! ancestor, AND-ed predicates and sort keys. Builders are chainable so
//! callers compose queries the way they would against the real store.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::model::{EntityKey, Kind};

use super::errors::{StoreError, StoreResult};

/// Comparison operators understood by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparator {
    /// True for every comparator except equality
    pub fn is_inequality(&self) -> bool {
        !matches!(self, Comparator::Eq)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// A single property predicate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub property: String,
    pub comparator: Comparator,
    pub value: Value,
}

impl Predicate {
    pub fn new(property: impl Into<String>, comparator: Comparator, value: Value) -> Self {
        Self {
            property: property.into(),
            comparator,
            value,
        }
    }
}

/// A sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub property: String,
    pub direction: Direction,
}

/// Query against one entity kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreQuery {
    pub kind: Kind,
    pub ancestor: Option<EntityKey>,
    pub predicates: Vec<Predicate>,
    pub order: Vec<SortKey>,
}

impl StoreQuery {
    /// Starts a query over all entities of `kind`
    pub fn kind(kind: Kind) -> Self {
        Self {
            kind,
            ancestor: None,
            predicates: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Starts a query over entities of `kind` under `ancestor`
    pub fn by_ancestor(kind: Kind, ancestor: EntityKey) -> Self {
        Self::kind(kind).ancestor(ancestor)
    }

    pub fn ancestor(mut self, ancestor: EntityKey) -> Self {
        self.ancestor = Some(ancestor);
        self
    }

    /// Adds an AND-ed predicate
    pub fn filter(mut self, property: impl Into<String>, comparator: Comparator, value: Value) -> Self {
        self.predicates.push(Predicate::new(property, comparator, value));
        self
    }

    /// Appends a sort key
    pub fn order_by(mut self, property: impl Into<String>, direction: Direction) -> Self {
        self.order.push(SortKey {
            property: property.into(),
            direction,
        });
        self
    }

    /// Drops any sort keys
    pub fn clear_order(mut self) -> Self {
        self.order.clear();
        self
    }

    /// Distinct properties carrying a non-equality comparator, in first-seen order
    pub fn inequality_properties(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.predicates
            .iter()
            .filter(|p| p.comparator.is_inequality())
            .filter(|p| seen.insert(p.property.as_str()))
            .map(|p| p.property.as_str())
            .collect()
    }

    /// Checks the rules every adapter enforces:
    /// at most one inequality property, and it sorts first when any sort is given.
    pub fn validate(&self) -> StoreResult<()> {
        let inequality = self.inequality_properties();
        if inequality.len() > 1 {
            return Err(StoreError::invalid_query(format!(
                "inequality filters on multiple properties: {}",
                inequality.join(", ")
            )));
        }

        if let (Some(property), Some(first)) = (inequality.first(), self.order.first()) {
            if first.property != *property {
                return Err(StoreError::invalid_query(format!(
                    "first sort property must be '{}' (inequality filter), got '{}'",
                    property, first.property
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chainable_builder() {
        let conf = EntityKey::root(Kind::Profile, "alice").child(Kind::Conference, "c1");
        let query = StoreQuery::by_ancestor(Kind::Session, conf.clone())
            .filter("typeOfSession", Comparator::Eq, json!("workshop"))
            .order_by("name", Direction::Asc);

        assert_eq!(query.kind, Kind::Session);
        assert_eq!(query.ancestor, Some(conf));
        assert_eq!(query.predicates.len(), 1);
        assert_eq!(query.order[0].property, "name");
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_two_inequality_properties_rejected() {
        let query = StoreQuery::kind(Kind::Session)
            .filter("typeOfSession", Comparator::Ne, json!("workshop"))
            .filter("startTime", Comparator::Lt, json!("19:00:00"));

        let err = query.validate().unwrap_err();
        assert_eq!(err.code(), "CONF_STORE_INVALID_QUERY");
    }

    #[test]
    fn test_range_on_one_property_allowed() {
        let query = StoreQuery::kind(Kind::Conference)
            .filter("seatsAvailable", Comparator::Gt, json!(0))
            .filter("seatsAvailable", Comparator::Lte, json!(5));

        assert_eq!(query.inequality_properties(), vec!["seatsAvailable"]);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_inequality_must_sort_first() {
        let query = StoreQuery::kind(Kind::Conference)
            .filter("maxAttendees", Comparator::Gt, json!(10))
            .order_by("name", Direction::Asc);
        assert!(query.validate().is_err());

        let query = query.clear_order()
            .order_by("maxAttendees", Direction::Asc)
            .order_by("name", Direction::Asc);
        assert!(query.validate().is_ok());
    }
}
