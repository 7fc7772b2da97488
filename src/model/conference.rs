//! Conference entity and its input form

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::errors::{ModelError, ModelResult};
use super::key::Kind;
use super::Model;

/// Stored conference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub organizer_user_id: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Month of `start_date`, 0 when there is none
    #[serde(default)]
    pub month: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub max_attendees: i64,
    #[serde(default)]
    pub seats_available: i64,
}

impl Model for Conference {
    const KIND: Kind = Kind::Conference;
}

impl Conference {
    /// Sets the start date and keeps `month` in step with it
    pub fn set_start_date(&mut self, start_date: Option<NaiveDate>) {
        self.start_date = start_date;
        self.month = start_date.map(|d| i64::from(d.month())).unwrap_or(0);
    }
}

/// Conference fields as submitted by an organizer
///
/// Absent fields take configured defaults on create and are left untouched
/// on update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub max_attendees: Option<i64>,
}

impl ConferenceForm {
    /// Returns the name, which a new conference must have
    pub fn required_name(&self) -> ModelResult<&str> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(ModelError::MissingField("name")),
        }
    }

    pub fn parsed_start_date(&self) -> ModelResult<Option<NaiveDate>> {
        self.start_date.as_deref().map(super::parse_form_date).transpose()
    }

    pub fn parsed_end_date(&self) -> ModelResult<Option<NaiveDate>> {
        self.end_date.as_deref().map(super::parse_form_date).transpose()
    }
}
