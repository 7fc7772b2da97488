//! Conference creation, update and filtered listing

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::model::{Conference, ConferenceForm, EntityKey, Kind, Profile, Stored};
use crate::observability::{log_event_with_fields, Event};
use crate::query::{self, ExplainPlan, RawClause};
use crate::store::{decode_all, Direction, Entity, EntityStore, StoreQuery};

use super::{decode_key, profile_key, txn_load, ConferenceService, ServiceError, ServiceResult};

/// Conference as returned to callers, with its websafe key and the
/// organizer's display name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceSummary {
    pub websafe_key: String,
    #[serde(flatten)]
    pub conference: Conference,
    pub organizer_display_name: String,
}

impl<S: EntityStore + 'static> ConferenceService<S> {
    /// Creates a conference owned by `user_id`.
    ///
    /// Missing city and topics take configured defaults, `month` follows the
    /// start date and every seat starts out available.
    pub fn create_conference(&self, user_id: &str, form: &ConferenceForm) -> ServiceResult<Stored<Conference>> {
        let name = form.required_name()?.to_string();
        let max_attendees = form.max_attendees.unwrap_or(0);
        if max_attendees < 0 {
            return Err(ServiceError::bad_request(format!(
                "maxAttendees must not be negative, got {}",
                max_attendees
            )));
        }

        let topics = match &form.topics {
            Some(topics) if !topics.is_empty() => topics.clone(),
            _ => self.config.default_topics.clone(),
        };
        let mut conference = Conference {
            name,
            description: form.description.clone(),
            organizer_user_id: user_id.to_string(),
            topics,
            city: Some(form.city.clone().unwrap_or_else(|| self.config.default_city.clone())),
            start_date: None,
            month: 0,
            end_date: form.parsed_end_date()?,
            max_attendees,
            seats_available: max_attendees,
        };
        conference.set_start_date(form.parsed_start_date()?);

        let profile = self.get_profile(user_id)?;
        let key = self.store.allocate_key(Kind::Conference, Some(&profile.key));
        self.store.put(Entity::from_model(key.clone(), &conference)?)?;

        self.metrics.increment_conferences_created();
        log_event_with_fields(
            Event::ConferenceCreated,
            &[("key", &key.encode()), ("organizer", user_id)],
        );
        Ok(Stored::new(key, conference))
    }

    /// Updates a conference; only its organizer may do so.
    ///
    /// Fields absent from the form are left untouched.
    pub fn update_conference(
        &self,
        user_id: &str,
        websafe_key: &str,
        form: &ConferenceForm,
    ) -> ServiceResult<Stored<Conference>> {
        let key = decode_key(websafe_key, Kind::Conference)?;

        // registrations change seatsAvailable concurrently
        let result: ServiceResult<Conference> = self.store.transact(|txn| {
            let mut conference: Conference = txn_load(txn, &key)?;
            if conference.organizer_user_id != user_id {
                return Err(ServiceError::forbidden("only the owner can update the conference"));
            }
            apply_update(&mut conference, form)?;
            txn.put(Entity::from_model(key.clone(), &conference)?)?;
            Ok(conference)
        });
        let conference = self.observe("update_conference", result)?;

        log_event_with_fields(Event::ConferenceUpdated, &[("key", websafe_key)]);
        Ok(Stored::new(key, conference))
    }

    pub fn get_conference(&self, websafe_key: &str) -> ServiceResult<ConferenceSummary> {
        let key = decode_key(websafe_key, Kind::Conference)?;
        let stored = self.load::<Conference>(&key)?;
        let mut summaries = self.summarize(vec![stored])?;
        summaries
            .pop()
            .ok_or_else(|| ServiceError::not_found(format!("no conference found with key {}", websafe_key)))
    }

    /// Conferences organized by `user_id`, by name
    pub fn get_conferences_created(&self, user_id: &str) -> ServiceResult<Vec<ConferenceSummary>> {
        let query = StoreQuery::by_ancestor(Kind::Conference, profile_key(user_id)).order_by("name", Direction::Asc);
        let conferences = self.fetch_models::<Conference>("get_conferences_created", &query)?;
        self.summarize(conferences)
    }

    /// Conferences matching every clause.
    ///
    /// Results are ordered by the inequality field (if any) and then by name.
    pub fn query_conferences(&self, raw: &[RawClause]) -> ServiceResult<Vec<ConferenceSummary>> {
        let plan = match query::plan(StoreQuery::kind(Kind::Conference), raw) {
            Ok(plan) => plan,
            Err(err) => {
                self.metrics.increment_queries_rejected();
                log_event_with_fields(Event::QueryRejected, &[("code", err.code()), ("reason", &err.to_string())]);
                return Err(err.into());
            }
        };
        self.metrics.increment_queries_planned();
        log_event_with_fields(Event::QueryPlanned, &[("predicates", &raw.len().to_string())]);

        let result = plan
            .execute(self.store.as_ref())
            .map_err(ServiceError::from)
            .and_then(|entities| decode_all::<Conference>(entities).map_err(ServiceError::from));
        let conferences = self.observe("query_conferences", result)?;

        self.metrics.increment_queries_executed();
        log_event_with_fields(Event::QueryExecuted, &[("rows", &conferences.len().to_string())]);
        self.summarize(conferences)
    }

    /// Describes how `raw` would be planned, or why it is rejected
    pub fn explain_conferences(&self, raw: &[RawClause]) -> ExplainPlan {
        let explain = match query::plan(StoreQuery::kind(Kind::Conference), raw) {
            Ok(plan) => plan.explain(),
            Err(err) => ExplainPlan::from_error(&err),
        };
        log_event_with_fields(
            Event::ExplainComplete,
            &[("accepted", if explain.accepted { "true" } else { "false" })],
        );
        explain
    }

    /// Attaches organizer display names, loading all organizer profiles in one batch
    pub(super) fn summarize(&self, conferences: Vec<Stored<Conference>>) -> ServiceResult<Vec<ConferenceSummary>> {
        let organizers: BTreeSet<EntityKey> = conferences
            .iter()
            .map(|c| profile_key(&c.value.organizer_user_id))
            .collect();
        let organizers: Vec<EntityKey> = organizers.into_iter().collect();

        let names: HashMap<String, String> = self
            .batch_load::<Profile>(&organizers)?
            .into_iter()
            .map(|p| (p.key.id().to_string(), p.value.display_name))
            .collect();

        Ok(conferences
            .into_iter()
            .map(|c| {
                let organizer_display_name = names.get(&c.value.organizer_user_id).cloned().unwrap_or_default();
                ConferenceSummary {
                    websafe_key: c.key.encode(),
                    conference: c.value,
                    organizer_display_name,
                }
            })
            .collect())
    }
}

/// Copies the fields present in `form` onto `conference`
fn apply_update(conference: &mut Conference, form: &ConferenceForm) -> ServiceResult<()> {
    if form.name.is_some() {
        conference.name = form.required_name()?.to_string();
    }
    if let Some(description) = &form.description {
        conference.description = Some(description.clone());
    }
    if let Some(topics) = &form.topics {
        conference.topics = topics.clone();
    }
    if let Some(city) = &form.city {
        conference.city = Some(city.clone());
    }
    if form.start_date.is_some() {
        conference.set_start_date(form.parsed_start_date()?);
    }
    if form.end_date.is_some() {
        conference.end_date = form.parsed_end_date()?;
    }
    if let Some(max) = form.max_attendees {
        conference.max_attendees = max;
    }
    Ok(())
}
