//! Attendee profiles and speakers

use serde::{Deserialize, Serialize};

use super::errors::{ModelError, ModelResult};
use super::key::{EntityKey, Kind};
use super::Model;

pub const TEE_SHIRT_NOT_SPECIFIED: &str = "NOT_SPECIFIED";

/// Stored user profile, keyed by user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: String,
    pub main_email: String,
    pub tee_shirt_size: String,
    #[serde(default)]
    pub conference_keys_to_attend: Vec<EntityKey>,
    #[serde(default)]
    pub session_wishlist: Vec<EntityKey>,
}

impl Model for Profile {
    const KIND: Kind = Kind::Profile;
}

impl Profile {
    /// Fresh profile for a user seen for the first time
    pub fn new_for_user(user_id: &str) -> Self {
        let display_name = user_id.split('@').next().unwrap_or(user_id).to_string();
        Self {
            display_name,
            main_email: user_id.to_string(),
            tee_shirt_size: TEE_SHIRT_NOT_SPECIFIED.to_string(),
            conference_keys_to_attend: Vec::new(),
            session_wishlist: Vec::new(),
        }
    }

    pub fn is_attending(&self, conference: &EntityKey) -> bool {
        self.conference_keys_to_attend.contains(conference)
    }
}

/// Editable profile fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMiniForm {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub tee_shirt_size: Option<String>,
}

/// Stored speaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl Model for Speaker {
    const KIND: Kind = Kind::Speaker;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl SpeakerForm {
    pub fn required_name(&self) -> ModelResult<&str> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(ModelError::MissingField("name")),
        }
    }
}
