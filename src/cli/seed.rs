//! Seed data for the in-memory store
//!
//! ```json
//! {
//!   "speakers": [{"id": "ada", "name": "Ada Lovelace"}],
//!   "conferences": [{
//!     "organizer": "org@example.com",
//!     "name": "RustConf", "city": "London", "startDate": "2026-06-10",
//!     "maxAttendees": 100, "topics": ["Rust"],
//!     "sessions": [{"name": "Intro", "date": "2026-06-10", "startTime": "09:00",
//!                   "typeOfSession": ["lecture"], "speakers": ["ada"]}]
//!   }],
//!   "registrations": [{"user": "dana@example.com", "conference": "RustConf"}]
//! }
//! ```
//!
//! Sessions name speakers by their seed `id`; registrations name
//! conferences by name. Everything is written through the service so the
//! usual defaults and checks apply.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::model::{ConferenceForm, SessionForm, SpeakerForm};
use crate::service::ConferenceService;
use crate::store::EntityStore;

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub speakers: Vec<SeedSpeaker>,
    #[serde(default)]
    pub conferences: Vec<SeedConference>,
    #[serde(default)]
    pub registrations: Vec<SeedRegistration>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSpeaker {
    pub id: String,
    #[serde(flatten)]
    pub form: SpeakerForm,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConference {
    pub organizer: String,
    #[serde(flatten)]
    pub form: ConferenceForm,
    #[serde(default)]
    pub sessions: Vec<SeedSession>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSession {
    #[serde(flatten)]
    pub form: SessionForm,
    /// Seed speaker ids
    #[serde(default)]
    pub speakers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRegistration {
    pub user: String,
    pub conference: String,
}

/// Websafe keys of seeded entities, by seed name
#[derive(Debug, Clone, Default)]
pub struct SeedIndex {
    pub conferences: BTreeMap<String, String>,
    pub speakers: BTreeMap<String, String>,
}

impl SeedIndex {
    /// Resolves a conference name, falling back to treating it as a websafe key
    pub fn conference<'a>(&'a self, name_or_key: &'a str) -> &'a str {
        self.conferences
            .get(name_or_key)
            .map(String::as_str)
            .unwrap_or(name_or_key)
    }
}

impl SeedFile {
    pub fn load(path: impl AsRef<Path>) -> CliResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| CliError::seed(format!("failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw).map_err(|e| CliError::seed(format!("invalid seed file {}: {}", path.display(), e)))
    }

    /// Writes every seeded entity through `service`
    pub fn apply<S: EntityStore + 'static>(&self, service: &ConferenceService<S>) -> CliResult<SeedIndex> {
        let mut index = SeedIndex::default();

        for speaker in &self.speakers {
            let stored = service.create_speaker(&speaker.form)?;
            if index.speakers.insert(speaker.id.clone(), stored.key.encode()).is_some() {
                return Err(CliError::seed(format!("duplicate speaker id '{}'", speaker.id)));
            }
        }

        for conference in &self.conferences {
            let stored = service.create_conference(&conference.organizer, &conference.form)?;
            let websafe = stored.key.encode();
            if index.conferences.insert(stored.value.name.clone(), websafe.clone()).is_some() {
                return Err(CliError::seed(format!("duplicate conference name '{}'", stored.value.name)));
            }

            for session in &conference.sessions {
                let mut form = session.form.clone();
                for id in &session.speakers {
                    let key = index
                        .speakers
                        .get(id)
                        .ok_or_else(|| CliError::seed(format!("unknown speaker id '{}'", id)))?;
                    form.speaker.push(key.clone());
                }
                service.create_session(&conference.organizer, &websafe, &form)?;
            }
        }

        for registration in &self.registrations {
            let websafe = index
                .conferences
                .get(&registration.conference)
                .ok_or_else(|| CliError::seed(format!("unknown conference '{}'", registration.conference)))?;
            service.register_for_conference(&registration.user, websafe)?;
        }

        tracing::debug!(
            speakers = index.speakers.len(),
            conferences = index.conferences.len(),
            registrations = self.registrations.len(),
            "seed applied"
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::service;

    const SEED: &str = r#"{
        "speakers": [{"id": "ada", "name": "Ada"}],
        "conferences": [{
            "organizer": "org@example.com",
            "name": "RustConf",
            "city": "London",
            "startDate": "2026-06-10",
            "maxAttendees": 3,
            "sessions": [
                {"name": "Intro", "date": "2026-06-10", "startTime": "09:00", "speakers": ["ada"]}
            ]
        }],
        "registrations": [{"user": "dana", "conference": "RustConf"}]
    }"#;

    #[test]
    fn test_apply_seed() {
        let seed: SeedFile = serde_json::from_str(SEED).unwrap();
        let svc = service();
        let index = seed.apply(&svc).unwrap();

        let websafe = index.conference("RustConf").to_string();
        let conf = svc.get_conference(&websafe).unwrap();
        assert_eq!(conf.conference.seats_available, 2);

        let sessions = svc.get_conference_sessions(&websafe).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].value.speaker.len(), 1);
        assert_eq!(index.conference("Profile:x/Conference:y"), "Profile:x/Conference:y");
    }

    #[test]
    fn test_unknown_speaker_rejected() {
        let seed: SeedFile = serde_json::from_str(
            r#"{"conferences": [{"organizer": "o", "name": "C",
                "sessions": [{"name": "S", "speakers": ["ghost"]}]}]}"#,
        )
        .unwrap();

        let err = seed.apply(&service()).unwrap_err();
        assert_eq!(err.code(), "CONF_CLI_SEED_ERROR");
    }
}
