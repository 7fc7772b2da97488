//! Profiles, speakers and session wishlists

use crate::model::{Kind, Profile, ProfileMiniForm, Session, Speaker, SpeakerForm, Stored};
use crate::observability::{log_event_with_fields, Event};
use crate::store::{get_model, Direction, Entity, EntityStore, StoreQuery};

use super::{decode_key, profile_key, txn_profile, ConferenceService, ServiceResult};

impl<S: EntityStore + 'static> ConferenceService<S> {
    /// Returns the user's profile, creating it on first access
    pub fn get_profile(&self, user_id: &str) -> ServiceResult<Stored<Profile>> {
        let key = profile_key(user_id);
        if let Some(profile) = get_model::<S, Profile>(self.store.as_ref(), &key)? {
            return Ok(Stored::new(key, profile));
        }

        // another caller may create and update it between the read and here
        let result: ServiceResult<Stored<Profile>> = self.store.transact(|txn| {
            if txn.get(&key)?.is_some() {
                return txn_profile(txn, user_id);
            }
            let profile = Profile::new_for_user(user_id);
            txn.put(Entity::from_model(key.clone(), &profile)?)?;
            tracing::debug!(user = user_id, "profile created");
            Ok(Stored::new(key.clone(), profile))
        });
        self.observe("get_profile", result)
    }

    /// Updates display name and tee-shirt size; absent fields are kept
    pub fn save_profile(&self, user_id: &str, form: &ProfileMiniForm) -> ServiceResult<Stored<Profile>> {
        let result: ServiceResult<Stored<Profile>> = self.store.transact(|txn| {
            let mut stored = txn_profile(txn, user_id)?;
            if let Some(name) = form.display_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                stored.value.display_name = name.to_string();
            }
            if let Some(size) = &form.tee_shirt_size {
                stored.value.tee_shirt_size = size.clone();
            }
            txn.put(Entity::from_model(stored.key.clone(), &stored.value)?)?;
            Ok(stored)
        });
        let stored = self.observe("save_profile", result)?;

        log_event_with_fields(Event::ProfileSaved, &[("user", user_id)]);
        Ok(stored)
    }

    pub fn create_speaker(&self, form: &SpeakerForm) -> ServiceResult<Stored<Speaker>> {
        let speaker = Speaker {
            name: form.required_name()?.to_string(),
            bio: form.bio.clone(),
        };
        let key = self.store.allocate_key(Kind::Speaker, None);
        self.store.put(Entity::from_model(key.clone(), &speaker)?)?;

        log_event_with_fields(Event::SpeakerCreated, &[("key", &key.encode())]);
        Ok(Stored::new(key, speaker))
    }

    /// All speakers, by name
    pub fn get_speakers(&self) -> ServiceResult<Vec<Stored<Speaker>>> {
        let query = StoreQuery::kind(Kind::Speaker).order_by("name", Direction::Asc);
        self.fetch_models("get_speakers", &query)
    }

    /// Adds a session to the user's wishlist.
    ///
    /// Returns false when the session was already on it.
    pub fn add_session_to_wishlist(&self, user_id: &str, websafe_session_key: &str) -> ServiceResult<bool> {
        let session_key = decode_key(websafe_session_key, Kind::Session)?;
        self.load::<Session>(&session_key)?;

        let result: ServiceResult<bool> = self.store.transact(|txn| {
            let mut profile = txn_profile(txn, user_id)?;
            if profile.value.session_wishlist.contains(&session_key) {
                return Ok(false);
            }
            profile.value.session_wishlist.push(session_key.clone());
            txn.put(Entity::from_model(profile.key.clone(), &profile.value)?)?;
            Ok(true)
        });
        let added = self.observe("add_session_to_wishlist", result)?;

        if added {
            log_event_with_fields(Event::WishlistUpdated, &[("user", user_id), ("session", websafe_session_key)]);
        }
        Ok(added)
    }

    pub fn get_sessions_in_wishlist(&self, user_id: &str) -> ServiceResult<Vec<Stored<Session>>> {
        let profile = self.get_profile(user_id)?;
        self.batch_load(&profile.value.session_wishlist)
    }
}
