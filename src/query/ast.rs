//! Filter clause structures
//!
//! Raw clauses arrive as three strings. `Field` and `Operator` are closed
//! sets with validating constructors; anything outside them is rejected
//! before a query is built.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Comparator;

/// Filterable conference fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Field {
    City,
    Topic,
    Month,
    MaxAttendees,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::City, Field::Topic, Field::Month, Field::MaxAttendees];

    /// Resolves a wire token (`CITY`, `TOPIC`, `MONTH`, `MAX_ATTENDEES`)
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "CITY" => Some(Field::City),
            "TOPIC" => Some(Field::Topic),
            "MONTH" => Some(Field::Month),
            "MAX_ATTENDEES" => Some(Field::MaxAttendees),
            _ => None,
        }
    }

    /// Stored property name
    pub fn property(&self) -> &'static str {
        match self {
            Field::City => "city",
            Field::Topic => "topics",
            Field::Month => "month",
            Field::MaxAttendees => "maxAttendees",
        }
    }

    /// Values for numeric fields are coerced to integers
    pub fn is_numeric(&self) -> bool {
        matches!(self, Field::Month | Field::MaxAttendees)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.property())
    }
}

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
}

impl Operator {
    /// Resolves a wire name (`EQ`, `GTEQ`, ...) or a symbol (`=`, `>=`, ...)
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "EQ" | "=" => Some(Operator::Eq),
            "GT" | ">" => Some(Operator::Gt),
            "GTEQ" | ">=" => Some(Operator::Gte),
            "LT" | "<" => Some(Operator::Lt),
            "LTEQ" | "<=" => Some(Operator::Lte),
            "NE" | "!=" => Some(Operator::Ne),
            _ => None,
        }
    }

    /// Every operator except equality counts as an inequality,
    /// `!=` included.
    pub fn is_inequality(&self) -> bool {
        !matches!(self, Operator::Eq)
    }

    pub fn comparator(&self) -> Comparator {
        match self {
            Operator::Eq => Comparator::Eq,
            Operator::Gt => Comparator::Gt,
            Operator::Gte => Comparator::Gte,
            Operator::Lt => Comparator::Lt,
            Operator::Lte => Comparator::Lte,
            Operator::Ne => Comparator::Ne,
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.comparator().symbol()
    }
}

/// A literal compared against a stored property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl Scalar {
    /// Value in the same encoding entity bodies use
    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Text(s) => Value::String(s.clone()),
            Scalar::Integer(i) => Value::from(*i),
            Scalar::Date(d) => Value::String(d.to_string()),
            Scalar::Time(t) => Value::String(t.to_string()),
        }
    }
}

/// Unvalidated clause as submitted by a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawClause {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl RawClause {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

/// Validated clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterClause {
    pub field: Field,
    pub operator: Operator,
    pub value: Scalar,
}

impl FilterClause {
    pub fn is_inequality(&self) -> bool {
        self.operator.is_inequality()
    }
}
