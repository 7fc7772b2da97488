//! Derived announcement texts, computed on demand

use std::collections::BTreeMap;

use serde_json::json;

use crate::model::{Conference, EntityKey, Kind, Speaker};
use crate::observability::{log_event_with_fields, Event};
use crate::store::{Comparator, Direction, EntityStore, StoreQuery};

use super::{ConferenceService, ServiceResult};

const ANNOUNCEMENT_PREFIX: &str = "Last chance to attend! The following conferences are nearly sold out: ";
const FEATURED_SPEAKERS_HEADER: &str = "Featured Speaker(s):";

impl<S: EntityStore + 'static> ConferenceService<S> {
    /// Lists conferences with at least one and at most the configured
    /// number of seats left, fewest seats first.
    ///
    /// Empty when no conference qualifies.
    pub fn almost_sold_out_announcement(&self) -> ServiceResult<String> {
        let query = StoreQuery::kind(Kind::Conference)
            .filter("seatsAvailable", Comparator::Gt, json!(0))
            .filter(
                "seatsAvailable",
                Comparator::Lte,
                json!(self.config.announcement_seat_threshold),
            )
            .order_by("seatsAvailable", Direction::Asc)
            .order_by("name", Direction::Asc);
        let conferences = self.fetch_models::<Conference>("almost_sold_out_announcement", &query)?;

        log_event_with_fields(
            Event::AnnouncementComputed,
            &[("conferences", &conferences.len().to_string())],
        );
        if conferences.is_empty() {
            return Ok(String::new());
        }

        let names: Vec<&str> = conferences.iter().map(|c| c.value.name.as_str()).collect();
        Ok(format!("{}{}", ANNOUNCEMENT_PREFIX, names.join(", ")))
    }

    /// Names speakers with more than one session at the conference, each
    /// followed by their session names.
    ///
    /// Empty when no speaker qualifies.
    pub fn featured_speakers(&self, websafe_conference_key: &str) -> ServiceResult<String> {
        let sessions = self.get_conference_sessions(websafe_conference_key)?;

        let mut by_speaker: BTreeMap<EntityKey, Vec<String>> = BTreeMap::new();
        for session in &sessions {
            for speaker in &session.value.speaker {
                by_speaker
                    .entry(speaker.clone())
                    .or_default()
                    .push(session.value.name.clone());
            }
        }
        by_speaker.retain(|_, names| names.len() > 1);

        let keys: Vec<EntityKey> = by_speaker.keys().cloned().collect();
        let mut featured: Vec<(String, Vec<String>)> = self
            .batch_load::<Speaker>(&keys)?
            .into_iter()
            .map(|speaker| {
                let sessions = by_speaker.remove(&speaker.key).unwrap_or_default();
                (speaker.value.name, sessions)
            })
            .collect();
        featured.sort();

        log_event_with_fields(
            Event::FeaturedSpeakersComputed,
            &[("conference", websafe_conference_key), ("speakers", &featured.len().to_string())],
        );
        if featured.is_empty() {
            return Ok(String::new());
        }

        let mut text = String::from(FEATURED_SPEAKERS_HEADER);
        for (name, sessions) in featured {
            text.push('\n');
            text.push_str(&format!("{} - {}", name, sessions.join("; ")));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use crate::service::test_support::*;

    #[test]
    fn test_announcement_lists_nearly_sold_out() {
        let svc = service();
        let roomy = conference_form("Roomy", "London", 6, 100);
        svc.create_conference(ORGANIZER, &roomy).unwrap();
        let beta = svc
            .create_conference(ORGANIZER, &conference_form("Beta", "London", 6, 3))
            .unwrap()
            .key
            .encode();
        svc.create_conference(ORGANIZER, &conference_form("Alpha", "Paris", 6, 5)).unwrap();
        let full = svc
            .create_conference(ORGANIZER, &conference_form("Full", "Paris", 6, 1))
            .unwrap()
            .key
            .encode();

        svc.register_for_conference("dana", &full).unwrap();
        svc.register_for_conference("dana", &beta).unwrap();

        let text = svc.almost_sold_out_announcement().unwrap();
        assert_eq!(
            text,
            "Last chance to attend! The following conferences are nearly sold out: Beta, Alpha"
        );
    }

    #[test]
    fn test_announcement_empty_when_none_qualify() {
        let svc = service();
        svc.create_conference(ORGANIZER, &conference_form("Roomy", "London", 6, 100)).unwrap();
        assert_eq!(svc.almost_sold_out_announcement().unwrap(), "");
    }

    #[test]
    fn test_featured_speakers() {
        let svc = service();
        let conf = svc
            .create_conference(ORGANIZER, &conference_form("RustConf", "London", 6, 100))
            .unwrap()
            .key
            .encode();
        let ada = svc.create_speaker(&speaker_form("Ada")).unwrap().key;
        let bob = svc.create_speaker(&speaker_form("Bob")).unwrap().key;

        for (name, speakers) in [
            ("Async Deep Dive", vec![&ada]),
            ("Borrowing", vec![&ada, &bob]),
            ("Closing", vec![&ada]),
            ("Macros", vec![&bob]),
        ] {
            svc.create_session(
                ORGANIZER,
                &conf,
                &session_form(name, "lecture", "2026-06-10", "10:00", &speakers),
            )
            .unwrap();
        }

        let text = svc.featured_speakers(&conf).unwrap();
        assert_eq!(
            text,
            "Featured Speaker(s):\nAda - Async Deep Dive; Borrowing; Closing\nBob - Borrowing; Macros"
        );
    }

    #[test]
    fn test_no_featured_speakers() {
        let svc = service();
        let conf = svc
            .create_conference(ORGANIZER, &conference_form("RustConf", "London", 6, 100))
            .unwrap()
            .key
            .encode();
        let ada = svc.create_speaker(&speaker_form("Ada")).unwrap().key;
        svc.create_session(
            ORGANIZER,
            &conf,
            &session_form("Solo", "lecture", "2026-06-10", "10:00", &[&ada]),
        )
        .unwrap();

        assert_eq!(svc.featured_speakers(&conf).unwrap(), "");
    }
}
