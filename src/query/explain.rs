//! Explain output for conference filter queries

use std::fmt;

use serde::Serialize;

use super::builder::QueryPlan;
use super::errors::QueryError;

/// Explain plan output
#[derive(Debug, Clone, Serialize)]
pub struct ExplainPlan {
    /// Whether planning succeeded
    pub accepted: bool,
    /// Entity kind queried
    pub kind: Option<String>,
    /// Field carrying the inequality, if any
    pub inequality_field: Option<String>,
    /// Rendered predicates
    pub predicates: Vec<String>,
    /// Rendered sort keys
    pub order: Vec<String>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a successful query plan
    pub fn from_plan(plan: &QueryPlan) -> Self {
        let query = plan.query();
        let predicates = query
            .predicates
            .iter()
            .map(|p| format!("{} {} {}", p.property, p.comparator.symbol(), p.value))
            .collect();
        let order = query
            .order
            .iter()
            .map(|k| format!("{} {}", k.property, k.direction.as_str()))
            .collect();

        Self {
            accepted: true,
            kind: Some(query.kind.to_string()),
            inequality_field: plan.inequality_field().map(|f| f.property().to_string()),
            predicates,
            order,
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a planning error
    pub fn from_error(err: &QueryError) -> Self {
        Self {
            accepted: false,
            kind: None,
            inequality_field: None,
            predicates: Vec::new(),
            order: Vec::new(),
            rejection_reason: Some(err.to_string()),
            rejection_code: Some(err.code().to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if !self.accepted {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "Status: ACCEPTED")?;
        if let Some(kind) = &self.kind {
            writeln!(f, "Kind: {}", kind)?;
        }
        writeln!(
            f,
            "Inequality Field: {}",
            self.inequality_field.as_deref().unwrap_or("(none)")
        )?;
        if !self.predicates.is_empty() {
            writeln!(f, "Predicates:")?;
            for pred in &self.predicates {
                writeln!(f, "  - {}", pred)?;
            }
        }
        writeln!(f, "Order: {}", self.order.join(", "))?;
        Ok(())
    }
}
