//! Entity model for the conference backend
//!
//! Entities are stored as JSON bodies under hierarchical keys:
//!
//! - `Profile:<user id>` (root)
//! - `Profile:<user id>/Conference:<id>` (organizer is the ancestor)
//! - `.../Conference:<id>/Session:<id>`
//! - `Speaker:<id>` (root)
//!
//! Property names on the wire are camelCase, which is what filter clauses
//! and sort keys refer to.

mod conference;
mod errors;
mod key;
mod profile;
mod session;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use conference::{Conference, ConferenceForm};
pub use errors::{ModelError, ModelResult};
pub use key::{EntityKey, Kind};
pub use profile::{Profile, ProfileMiniForm, Speaker, SpeakerForm, TEE_SHIRT_NOT_SPECIFIED};
pub use session::{Session, SessionForm};

/// A typed entity payload stored under keys of one kind
pub trait Model: Serialize + DeserializeOwned {
    const KIND: Kind;
}

/// A decoded entity together with its key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stored<M> {
    pub key: EntityKey,
    #[serde(flatten)]
    pub value: M,
}

impl<M> Stored<M> {
    pub fn new(key: EntityKey, value: M) -> Self {
        Self { key, value }
    }
}

/// Parses a form date, ignoring anything after `YYYY-MM-DD`
pub fn parse_form_date(raw: &str) -> ModelResult<NaiveDate> {
    let day = raw.trim().get(..10).unwrap_or(raw.trim());
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| ModelError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form_date() {
        assert_eq!(
            parse_form_date("2026-02-28").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
        assert!(parse_form_date("28/02/2026").is_err());
        assert!(parse_form_date("2026-02").is_err());
    }
}
