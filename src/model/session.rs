//! Session entity and its input form

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::errors::{ModelError, ModelResult};
use super::key::{EntityKey, Kind};
use super::Model;

/// Stored session, always a child of its conference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<String>,
    #[serde(default)]
    pub speaker: Vec<EntityKey>,
    /// Minutes
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub type_of_session: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
}

impl Model for Session {
    const KIND: Kind = Kind::Session;
}

/// Session fields as submitted by an organizer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub highlights: Option<String>,
    /// Websafe speaker keys
    #[serde(default)]
    pub speaker: Vec<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub type_of_session: Vec<String>,
    #[serde(default)]
    pub date: Option<String>,
    /// `HH:MM`
    #[serde(default)]
    pub start_time: Option<String>,
}

impl SessionForm {
    pub fn required_name(&self) -> ModelResult<&str> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(ModelError::MissingField("name")),
        }
    }

    pub fn speaker_keys(&self) -> ModelResult<Vec<EntityKey>> {
        self.speaker.iter().map(|s| EntityKey::decode(s)).collect()
    }

    pub fn parsed_date(&self) -> ModelResult<Option<NaiveDate>> {
        self.date.as_deref().map(super::parse_form_date).transpose()
    }

    pub fn parsed_start_time(&self) -> ModelResult<Option<NaiveTime>> {
        self.start_time
            .as_deref()
            .map(|raw| {
                NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                    .map_err(|_| ModelError::InvalidTime(raw.to_string()))
            })
            .transpose()
    }
}
