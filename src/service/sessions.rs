//! Sessions and the session query endpoints

use serde_json::json;

use crate::model::{Conference, Kind, Session, SessionForm, Speaker, Stored};
use crate::observability::{log_event_with_fields, Event};
use crate::query::{parse_date, parse_start_time, parse_window_minutes, window_around, QueryError, Scalar};
use crate::store::{decode_all, Comparator, Direction, Entity, EntityStore, StoreQuery};

use super::{decode_key, ConferenceService, ServiceError, ServiceResult};

impl<S: EntityStore + 'static> ConferenceService<S> {
    /// Creates a session under a conference; only the conference's organizer
    /// may do so.
    pub fn create_session(
        &self,
        user_id: &str,
        websafe_conference_key: &str,
        form: &SessionForm,
    ) -> ServiceResult<Stored<Session>> {
        let conf_key = decode_key(websafe_conference_key, Kind::Conference)?;
        let conference = self.load::<Conference>(&conf_key)?;
        if conference.value.organizer_user_id != user_id {
            return Err(ServiceError::forbidden("only the conference organizer can add sessions"));
        }

        let name = form.required_name()?.to_string();
        let speaker = form.speaker_keys()?;
        if let Some(bad) = speaker.iter().find(|k| k.kind() != Kind::Speaker) {
            return Err(ServiceError::bad_request(format!("{} is not a speaker key", bad)));
        }
        let found = self.batch_load::<Speaker>(&speaker)?;
        if found.len() != speaker.len() {
            return Err(ServiceError::not_found("one or more speakers do not exist"));
        }

        let duration = form.duration.unwrap_or(self.config.default_session_duration);
        if duration <= 0 {
            return Err(ServiceError::bad_request(format!("duration must be positive, got {}", duration)));
        }
        let type_of_session = if form.type_of_session.is_empty() {
            vec![self.config.default_session_type.clone()]
        } else {
            form.type_of_session.clone()
        };

        let session = Session {
            name,
            highlights: form.highlights.clone(),
            speaker,
            duration,
            type_of_session,
            date: form.parsed_date()?,
            start_time: form.parsed_start_time()?,
        };
        let key = self.store.allocate_key(Kind::Session, Some(&conf_key));
        self.store.put(Entity::from_model(key.clone(), &session)?)?;

        self.metrics.increment_sessions_created();
        log_event_with_fields(
            Event::SessionCreated,
            &[("key", &key.encode()), ("conference", websafe_conference_key)],
        );
        Ok(Stored::new(key, session))
    }

    /// Sessions of a conference, by name
    pub fn get_conference_sessions(&self, websafe_conference_key: &str) -> ServiceResult<Vec<Stored<Session>>> {
        let conf_key = decode_key(websafe_conference_key, Kind::Conference)?;
        self.load::<Conference>(&conf_key)?;

        let query = StoreQuery::by_ancestor(Kind::Session, conf_key).order_by("name", Direction::Asc);
        self.fetch_models("get_conference_sessions", &query)
    }

    /// Sessions of a conference with the given type, by name
    pub fn get_conference_sessions_by_type(
        &self,
        websafe_conference_key: &str,
        type_of_session: &str,
    ) -> ServiceResult<Vec<Stored<Session>>> {
        let conf_key = decode_key(websafe_conference_key, Kind::Conference)?;
        self.load::<Conference>(&conf_key)?;

        let query = StoreQuery::by_ancestor(Kind::Session, conf_key)
            .filter("typeOfSession", Comparator::Eq, json!(type_of_session))
            .order_by("name", Direction::Asc);
        self.fetch_models("get_conference_sessions_by_type", &query)
    }

    /// Sessions across all conferences given by a speaker, by name
    pub fn get_sessions_by_speaker(&self, websafe_speaker_key: &str) -> ServiceResult<Vec<Stored<Session>>> {
        let speaker_key = decode_key(websafe_speaker_key, Kind::Speaker)?;
        self.load::<Speaker>(&speaker_key)?;

        let query = StoreQuery::kind(Kind::Session)
            .filter("speaker", Comparator::Eq, json!(speaker_key.encode()))
            .order_by("name", Direction::Asc);
        self.fetch_models("get_sessions_by_speaker", &query)
    }

    /// Sessions of a conference on `date` starting within `window` minutes
    /// of `start` (`HHMM`), by start time.
    pub fn get_sessions_with_start_times_within(
        &self,
        websafe_conference_key: &str,
        date: &str,
        start: &str,
        window: &str,
    ) -> ServiceResult<Vec<Stored<Session>>> {
        let date = parse_date(date)?;
        let center = parse_start_time(start)?;
        let window = window_around(date, center, parse_window_minutes(window)?)?;

        let conf_key = decode_key(websafe_conference_key, Kind::Conference)?;
        self.load::<Conference>(&conf_key)?;

        self.metrics.increment_windows_resolved();
        log_event_with_fields(
            Event::WindowResolved,
            &[("before", &window.before.to_string()), ("after", &window.after.to_string())],
        );
        self.fetch_models("get_sessions_with_start_times_within", &window.session_query(&conf_key))
    }

    /// Sessions on `date` at conferences held in `city`.
    ///
    /// Conference keys come from one key-only query; the per-conference
    /// session reads then run concurrently. Results are grouped by conference
    /// (conference key order) and ordered by start time within each.
    pub async fn get_sessions_by_date_and_city(&self, date: &str, city: &str) -> ServiceResult<Vec<Stored<Session>>> {
        let date = parse_date(date)?;

        let conferences = StoreQuery::kind(Kind::Conference).filter("city", Comparator::Eq, json!(city));
        let result = self.store.fetch_keys(&conferences).map_err(ServiceError::from);
        let conf_keys = self.observe("get_sessions_by_date_and_city", result)?;

        let template = StoreQuery::kind(Kind::Session)
            .filter("date", Comparator::Eq, Scalar::Date(date).to_value())
            .order_by("startTime", Direction::Asc)
            .order_by("name", Direction::Asc);
        let result = self
            .resolver
            .fan_out_by_ancestor(&conf_keys, &template)
            .await
            .map_err(ServiceError::from)
            .and_then(|entities| decode_all::<Session>(entities).map_err(ServiceError::from));
        let sessions = self.observe("get_sessions_by_date_and_city", result)?;

        self.metrics.increment_fan_outs();
        log_event_with_fields(
            Event::FanOutComplete,
            &[("conferences", &conf_keys.len().to_string()), ("rows", &sessions.len().to_string())],
        );
        Ok(sessions)
    }

    /// Sessions not of `excluded_type` starting before `before` (`HHMM`),
    /// ordered by start time then name.
    ///
    /// The two conditions are inequalities on different properties, so each
    /// runs as its own key-only query and the results are intersected.
    pub async fn get_sessions_before_start_time_excluding_type(
        &self,
        excluded_type: &str,
        before: &str,
    ) -> ServiceResult<Vec<Stored<Session>>> {
        let before = parse_start_time(before)?;
        if excluded_type.trim().is_empty() {
            return Err(QueryError::invalid_filter(0, "session type must not be empty").into());
        }

        let not_type =
            StoreQuery::kind(Kind::Session).filter("typeOfSession", Comparator::Ne, json!(excluded_type));
        let starts_before = StoreQuery::kind(Kind::Session)
            .filter("startTime", Comparator::Lt, Scalar::Time(before).to_value());

        let result = self
            .resolver
            .intersect(not_type, starts_before)
            .await
            .map_err(ServiceError::from)
            .and_then(|entities| decode_all::<Session>(entities).map_err(ServiceError::from));
        let mut sessions = self.observe("get_sessions_before_start_time_excluding_type", result)?;

        sessions.sort_by(|a, b| {
            a.value
                .start_time
                .cmp(&b.value.start_time)
                .then_with(|| a.value.name.cmp(&b.value.name))
        });

        self.metrics.record_intersection(sessions.is_empty());
        log_event_with_fields(Event::IntersectionResolved, &[("rows", &sessions.len().to_string())]);
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use crate::model::{EntityKey, SessionForm};
    use crate::service::test_support::*;
    use crate::service::ConferenceService;
    use crate::store::MemoryStore;

    fn session_names(sessions: &[crate::model::Stored<crate::model::Session>]) -> Vec<&str> {
        sessions.iter().map(|s| s.value.name.as_str()).collect()
    }

    fn with_conference() -> (ConferenceService<MemoryStore>, String) {
        let svc = service();
        let conf = svc
            .create_conference(ORGANIZER, &conference_form("RustConf", "London", 6, 100))
            .unwrap();
        (svc, conf.key.encode())
    }

    fn add(svc: &ConferenceService<MemoryStore>, conf: &str, name: &str, kind: &str, start: &str, speakers: &[&EntityKey]) {
        svc.create_session(ORGANIZER, conf, &session_form(name, kind, "2026-06-10", start, speakers))
            .unwrap();
    }

    #[test]
    fn test_create_session_defaults() {
        let (svc, conf) = with_conference();
        let form = SessionForm {
            name: Some("Open Space".into()),
            ..Default::default()
        };
        let session = svc.create_session(ORGANIZER, &conf, &form).unwrap();

        assert_eq!(session.value.duration, 30);
        assert_eq!(session.value.type_of_session, vec!["lecture"]);
        assert_eq!(session.key.parent().unwrap().encode(), conf);
        assert!(session.value.start_time.is_none());
    }

    #[test]
    fn test_create_session_checks_owner_and_speakers() {
        let (svc, conf) = with_conference();
        let form = session_form("Intro", "lecture", "2026-06-10", "09:00", &[]);
        let err = svc.create_session("mallory", &conf, &form).unwrap_err();
        assert_eq!(err.code(), "CONF_SERVICE_FORBIDDEN");

        let ghost = EntityKey::root(crate::model::Kind::Speaker, "ghost");
        let form = session_form("Intro", "lecture", "2026-06-10", "09:00", &[&ghost]);
        let err = svc.create_session(ORGANIZER, &conf, &form).unwrap_err();
        assert_eq!(err.code(), "CONF_SERVICE_NOT_FOUND");

        let form = session_form("Intro", "lecture", "2026-06-10", "9am", &[]);
        let err = svc.create_session(ORGANIZER, &conf, &form).unwrap_err();
        assert_eq!(err.code(), "CONF_MODEL_INVALID_TIME");
    }

    #[test]
    fn test_sessions_by_conference_type_and_speaker() {
        let (svc, conf) = with_conference();
        let ada = svc.create_speaker(&speaker_form("Ada")).unwrap().key;
        add(&svc, &conf, "Workshop B", "workshop", "10:00", &[&ada]);
        add(&svc, &conf, "Keynote", "keynote", "09:00", &[]);
        add(&svc, &conf, "Workshop A", "workshop", "14:00", &[&ada]);

        let all = svc.get_conference_sessions(&conf).unwrap();
        assert_eq!(session_names(&all), vec!["Keynote", "Workshop A", "Workshop B"]);

        let workshops = svc.get_conference_sessions_by_type(&conf, "workshop").unwrap();
        assert_eq!(session_names(&workshops), vec!["Workshop A", "Workshop B"]);

        let by_ada = svc.get_sessions_by_speaker(&ada.encode()).unwrap();
        assert_eq!(session_names(&by_ada), vec!["Workshop A", "Workshop B"]);
    }

    #[test]
    fn test_sessions_within_window() {
        let (svc, conf) = with_conference();
        add(&svc, &conf, "Early", "lecture", "11:00", &[]);
        add(&svc, &conf, "Edge", "lecture", "11:30", &[]);
        add(&svc, &conf, "Noon", "lecture", "12:00", &[]);
        add(&svc, &conf, "Late", "lecture", "12:31", &[]);
        svc.create_session(ORGANIZER, &conf, &session_form("Other Day", "lecture", "2026-06-11", "12:00", &[]))
            .unwrap();

        let found = svc
            .get_sessions_with_start_times_within(&conf, "2026-06-10", "1200", "30")
            .unwrap();
        assert_eq!(session_names(&found), vec!["Edge", "Noon"]);
        assert_eq!(svc.metrics().snapshot().windows_resolved, 1);
    }

    #[test]
    fn test_sessions_within_clamped_window() {
        let (svc, conf) = with_conference();
        add(&svc, &conf, "Midnight", "lecture", "00:00", &[]);
        add(&svc, &conf, "Night Owl", "lecture", "00:35", &[]);
        add(&svc, &conf, "Late Show", "lecture", "23:59", &[]);

        let early = svc
            .get_sessions_with_start_times_within(&conf, "2026-06-10", "0010", "30")
            .unwrap();
        assert_eq!(session_names(&early), vec!["Midnight", "Night Owl"]);

        let late = svc
            .get_sessions_with_start_times_within(&conf, "2026-06-10", "2350", "30")
            .unwrap();
        assert_eq!(session_names(&late), vec!["Late Show"]);
    }

    #[test]
    fn test_sessions_within_rejects_bad_input() {
        let (svc, conf) = with_conference();
        for (date, start, window) in [
            ("2026-06-10", "1200", "0"),
            ("2026-06-10", "1200", "-5"),
            ("2026-06-10", "1200", "half"),
            ("10/06/2026", "1200", "30"),
            ("2026-06-10", "12:00", "30"),
        ] {
            let err = svc
                .get_sessions_with_start_times_within(&conf, date, start, window)
                .unwrap_err();
            assert_eq!(err.code(), "CONF_QUERY_INVALID_WINDOW", "input {date} {start} {window}");
        }
    }

    #[tokio::test]
    async fn test_sessions_by_date_and_city() {
        let svc = service();
        let london_a = svc
            .create_conference(ORGANIZER, &conference_form("London A", "London", 6, 10))
            .unwrap()
            .key
            .encode();
        let london_b = svc
            .create_conference("other", &conference_form("London B", "London", 6, 10))
            .unwrap()
            .key
            .encode();
        let paris = svc
            .create_conference(ORGANIZER, &conference_form("Paris", "Paris", 6, 10))
            .unwrap()
            .key
            .encode();

        add(&svc, &london_a, "A2", "lecture", "15:00", &[]);
        add(&svc, &london_a, "A1", "lecture", "09:00", &[]);
        svc.create_session("other", &london_b, &session_form("B1", "lecture", "2026-06-10", "10:00", &[]))
            .unwrap();
        svc.create_session("other", &london_b, &session_form("B-next", "lecture", "2026-06-11", "10:00", &[]))
            .unwrap();
        add(&svc, &paris, "P1", "lecture", "09:00", &[]);

        let found = svc.get_sessions_by_date_and_city("2026-06-10", "London").await.unwrap();
        let mut names = session_names(&found);
        names.sort();
        assert_eq!(names, vec!["A1", "A2", "B1"]);

        // within one conference, start time order
        let a1 = found.iter().position(|s| s.value.name == "A1").unwrap();
        let a2 = found.iter().position(|s| s.value.name == "A2").unwrap();
        assert!(a1 < a2);

        assert!(svc.get_sessions_by_date_and_city("2026-06-10", "Oslo").await.unwrap().is_empty());
        assert_eq!(svc.metrics().snapshot().fan_outs, 2);
    }

    #[tokio::test]
    async fn test_sessions_before_excluding_type() {
        let (svc, conf) = with_conference();
        add(&svc, &conf, "Morning Workshop", "workshop", "09:00", &[]);
        add(&svc, &conf, "Talk B", "lecture", "17:00", &[]);
        add(&svc, &conf, "Talk A", "lecture", "10:00", &[]);
        add(&svc, &conf, "Keynote", "keynote", "10:00", &[]);
        add(&svc, &conf, "Evening Talk", "lecture", "20:00", &[]);

        let found = svc
            .get_sessions_before_start_time_excluding_type("workshop", "1900")
            .await
            .unwrap();
        assert_eq!(session_names(&found), vec!["Keynote", "Talk A", "Talk B"]);
        assert!(found.iter().all(|s| s.value.start_time < NaiveTime::from_hms_opt(19, 0, 0)));

        let counts = svc.store().op_counts();
        assert_eq!(counts.key_fetches, 2);
        assert_eq!(counts.batch_gets, 1);
    }

    #[tokio::test]
    async fn test_sessions_before_empty_intersection() {
        let (svc, conf) = with_conference();
        add(&svc, &conf, "Morning Workshop", "workshop", "09:00", &[]);
        add(&svc, &conf, "Evening Talk", "lecture", "20:00", &[]);

        let found = svc
            .get_sessions_before_start_time_excluding_type("workshop", "1900")
            .await
            .unwrap();
        assert!(found.is_empty());
        assert_eq!(svc.store().op_counts().batch_gets, 0);
        assert_eq!(svc.metrics().snapshot().empty_intersections, 1);
    }

    #[tokio::test]
    async fn test_sessions_before_store_failure() {
        let (svc, _) = with_conference();
        svc.store().set_unavailable(true);

        let err = svc
            .get_sessions_before_start_time_excluding_type("workshop", "1900")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONF_STORE_UNAVAILABLE");
        assert_eq!(svc.metrics().snapshot().store_failures, 1);
    }

    #[tokio::test]
    async fn test_outage_code_same_on_every_path() {
        let (svc, conf) = with_conference();
        svc.store().set_unavailable(true);

        let direct = svc.get_conference_sessions(&conf).unwrap_err();
        let intersected = svc
            .get_sessions_before_start_time_excluding_type("workshop", "1900")
            .await
            .unwrap_err();
        let fanned_out = svc
            .get_sessions_by_date_and_city("2026-06-10", "London")
            .await
            .unwrap_err();

        assert_eq!(direct.code(), "CONF_STORE_UNAVAILABLE");
        assert_eq!(intersected.code(), direct.code());
        assert_eq!(fanned_out.code(), direct.code());
    }
}
