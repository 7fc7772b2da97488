//! Filter normalization
//!
//! Resolves raw clauses against the closed field/operator sets, coerces
//! numeric values and tracks the single inequality field as a fold:
//!
//! ```text
//! NoInequality --(inequality on F)--> InequalityOn(F)
//! InequalityOn(F) --(inequality on F)--> InequalityOn(F)
//! InequalityOn(F) --(inequality on G != F)--> MultipleInequalityFields
//! ```

use super::ast::{Field, FilterClause, Operator, RawClause, Scalar};
use super::errors::{QueryError, QueryResult};

/// Inequality tracking state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InequalityState {
    NoInequality,
    InequalityOn(Field),
}

impl InequalityState {
    /// Folds one clause into the state
    pub fn advance(self, clause: &FilterClause) -> QueryResult<Self> {
        if !clause.is_inequality() {
            return Ok(self);
        }
        match self {
            InequalityState::NoInequality => Ok(InequalityState::InequalityOn(clause.field)),
            InequalityState::InequalityOn(field) if field == clause.field => Ok(self),
            InequalityState::InequalityOn(first) => Err(QueryError::MultipleInequalityFields {
                first,
                second: clause.field,
            }),
        }
    }

    pub fn field(&self) -> Option<Field> {
        match self {
            InequalityState::NoInequality => None,
            InequalityState::InequalityOn(field) => Some(*field),
        }
    }
}

/// Output of `normalize`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFilters {
    /// The one field carrying an inequality, if any
    pub inequality_field: Option<Field>,
    /// Clauses in input order
    pub clauses: Vec<FilterClause>,
}

/// Validates and translates raw clauses.
///
/// Clauses are processed in input order; the first failing clause decides
/// the error.
pub fn normalize(raw: &[RawClause]) -> QueryResult<NormalizedFilters> {
    let (state, clauses) = raw.iter().enumerate().try_fold(
        (InequalityState::NoInequality, Vec::with_capacity(raw.len())),
        |(state, mut clauses), (index, item)| {
            let clause = resolve(index, item)?;
            let state = state.advance(&clause)?;
            clauses.push(clause);
            Ok::<_, QueryError>((state, clauses))
        },
    )?;

    Ok(NormalizedFilters {
        inequality_field: state.field(),
        clauses,
    })
}

fn resolve(index: usize, raw: &RawClause) -> QueryResult<FilterClause> {
    let field = Field::from_token(&raw.field)
        .ok_or_else(|| QueryError::invalid_filter(index, format!("unknown field '{}'", raw.field)))?;
    let operator = Operator::from_token(&raw.operator)
        .ok_or_else(|| QueryError::invalid_filter(index, format!("unknown operator '{}'", raw.operator)))?;
    let value = coerce(index, field, &raw.value)?;

    Ok(FilterClause { field, operator, value })
}

fn coerce(index: usize, field: Field, value: &str) -> QueryResult<Scalar> {
    if !field.is_numeric() {
        return Ok(Scalar::Text(value.to_string()));
    }
    value.trim().parse::<i64>().map(Scalar::Integer).map_err(|_| {
        QueryError::invalid_filter(
            index,
            format!("value '{}' for field '{}' is not an integer", value, field),
        )
    })
}
