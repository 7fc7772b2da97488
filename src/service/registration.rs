//! Conference registration
//!
//! Registering touches two entities: the attendee's profile (list of
//! conferences to attend) and the conference (seat counter). Both writes go
//! through one store transaction so they commit together or not at all.

use crate::model::{Conference, Kind, Profile};
use crate::observability::{log_event_with_fields, Event};
use crate::store::{Entity, EntityStore};

use super::{decode_key, txn_load, ConferenceService, ConferenceSummary, ServiceError, ServiceResult};

impl<S: EntityStore + 'static> ConferenceService<S> {
    /// Takes a seat at a conference for `user_id`.
    ///
    /// Fails with `Conflict` when the user is already registered or no
    /// seats are left.
    pub fn register_for_conference(&self, user_id: &str, websafe_conference_key: &str) -> ServiceResult<bool> {
        let conf_key = decode_key(websafe_conference_key, Kind::Conference)?;
        let profile_key = self.get_profile(user_id)?.key;

        let result = self.store.transact(|txn| {
            let mut profile: Profile = txn_load(txn, &profile_key)?;
            let mut conference: Conference = txn_load(txn, &conf_key)?;

            if profile.is_attending(&conf_key) {
                return Err(ServiceError::conflict("you have already registered for this conference"));
            }
            if conference.seats_available <= 0 {
                return Err(ServiceError::conflict("there are no seats available"));
            }

            profile.conference_keys_to_attend.push(conf_key.clone());
            conference.seats_available -= 1;

            txn.put(Entity::from_model(profile_key.clone(), &profile)?)?;
            txn.put(Entity::from_model(conf_key.clone(), &conference)?)?;
            Ok(conference.seats_available)
        });

        match self.observe("register_for_conference", result) {
            Ok(seats_left) => {
                self.metrics.increment_registrations();
                log_event_with_fields(
                    Event::RegistrationCommitted,
                    &[
                        ("user", user_id),
                        ("conference", websafe_conference_key),
                        ("seats_left", &seats_left.to_string()),
                    ],
                );
                Ok(true)
            }
            Err(err) => {
                if matches!(err, ServiceError::Conflict(_)) {
                    self.metrics.increment_registrations_rejected();
                    log_event_with_fields(
                        Event::RegistrationRejected,
                        &[("user", user_id), ("reason", &err.to_string())],
                    );
                }
                Err(err)
            }
        }
    }

    /// Gives a seat back.
    ///
    /// Returns false, without writing anything, when `user_id` was not
    /// registered.
    pub fn unregister_from_conference(&self, user_id: &str, websafe_conference_key: &str) -> ServiceResult<bool> {
        let conf_key = decode_key(websafe_conference_key, Kind::Conference)?;
        let profile_key = self.get_profile(user_id)?.key;

        let result = self.store.transact(|txn| {
            let mut profile: Profile = txn_load(txn, &profile_key)?;
            let mut conference: Conference = txn_load(txn, &conf_key)?;

            if !profile.is_attending(&conf_key) {
                return Ok(false);
            }

            profile.conference_keys_to_attend.retain(|k| k != &conf_key);
            conference.seats_available += 1;

            txn.put(Entity::from_model(profile_key.clone(), &profile)?)?;
            txn.put(Entity::from_model(conf_key.clone(), &conference)?)?;
            Ok(true)
        });

        let released = self.observe("unregister_from_conference", result)?;
        if released {
            self.metrics.increment_unregistrations();
            log_event_with_fields(
                Event::UnregistrationCommitted,
                &[("user", user_id), ("conference", websafe_conference_key)],
            );
        }
        Ok(released)
    }

    /// Conferences `user_id` is registered for
    pub fn get_conferences_to_attend(&self, user_id: &str) -> ServiceResult<Vec<ConferenceSummary>> {
        let profile = self.get_profile(user_id)?;
        let conferences = self.batch_load::<Conference>(&profile.value.conference_keys_to_attend)?;
        self.summarize(conferences)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::Kind;
    use crate::service::test_support::*;
    use crate::service::profile_key;

    #[test]
    fn test_register_takes_a_seat() {
        let svc = service();
        let conf = svc
            .create_conference(ORGANIZER, &conference_form("RustConf", "London", 6, 2))
            .unwrap()
            .key
            .encode();

        assert!(svc.register_for_conference("dana", &conf).unwrap());
        assert_eq!(svc.get_conference(&conf).unwrap().conference.seats_available, 1);

        let attending = svc.get_conferences_to_attend("dana").unwrap();
        assert_eq!(attending.len(), 1);
        assert_eq!(attending[0].websafe_key, conf);
        assert_eq!(attending[0].organizer_display_name, "org");
        assert_eq!(svc.metrics().snapshot().registrations, 1);
    }

    #[test]
    fn test_register_twice_conflicts() {
        let svc = service();
        let conf = svc
            .create_conference(ORGANIZER, &conference_form("RustConf", "London", 6, 5))
            .unwrap()
            .key
            .encode();

        svc.register_for_conference("dana", &conf).unwrap();
        let err = svc.register_for_conference("dana", &conf).unwrap_err();

        assert_eq!(err.code(), "CONF_SERVICE_CONFLICT");
        assert_eq!(svc.get_conference(&conf).unwrap().conference.seats_available, 4);
        assert_eq!(svc.metrics().snapshot().registrations_rejected, 1);
    }

    #[test]
    fn test_sold_out_conflicts_without_partial_write() {
        let svc = service();
        let conf = svc
            .create_conference(ORGANIZER, &conference_form("Tiny", "London", 6, 1))
            .unwrap()
            .key
            .encode();

        svc.register_for_conference("dana", &conf).unwrap();
        let err = svc.register_for_conference("eli", &conf).unwrap_err();
        assert_eq!(err.code(), "CONF_SERVICE_CONFLICT");

        // eli's profile must not list the conference
        assert!(svc.get_conferences_to_attend("eli").unwrap().is_empty());
        assert_eq!(svc.get_conference(&conf).unwrap().conference.seats_available, 0);
    }

    #[test]
    fn test_unregister() {
        let svc = service();
        let conf = svc
            .create_conference(ORGANIZER, &conference_form("RustConf", "London", 6, 3))
            .unwrap()
            .key
            .encode();

        assert!(!svc.unregister_from_conference("dana", &conf).unwrap());
        assert_eq!(svc.get_conference(&conf).unwrap().conference.seats_available, 3);

        svc.register_for_conference("dana", &conf).unwrap();
        assert!(svc.unregister_from_conference("dana", &conf).unwrap());
        assert_eq!(svc.get_conference(&conf).unwrap().conference.seats_available, 3);
        assert!(svc.get_conferences_to_attend("dana").unwrap().is_empty());
        assert_eq!(svc.metrics().snapshot().unregistrations, 1);
    }

    #[test]
    fn test_register_unknown_conference() {
        let svc = service();
        let missing = profile_key(ORGANIZER).child(Kind::Conference, "nope").encode();

        let err = svc.register_for_conference("dana", &missing).unwrap_err();
        assert_eq!(err.code(), "CONF_SERVICE_NOT_FOUND");
        assert_eq!(svc.metrics().snapshot().registrations_rejected, 0);
    }

    #[test]
    fn test_register_store_failure() {
        let svc = service();
        let conf = svc
            .create_conference(ORGANIZER, &conference_form("RustConf", "London", 6, 3))
            .unwrap()
            .key
            .encode();
        svc.get_profile("dana").unwrap();
        svc.store().set_unavailable(true);

        let err = svc.register_for_conference("dana", &conf).unwrap_err();
        assert_eq!(err.code(), "CONF_STORE_UNAVAILABLE");
        assert!(!err.is_client_fault());
    }
}
