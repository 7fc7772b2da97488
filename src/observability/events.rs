//! Observable events for confcentral
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Process startup begins
    BootStart,
    /// Configuration loaded
    ConfigLoaded,
    /// Seed data written to the store
    SeedLoaded,

    // Query operations
    /// Filter clauses normalized and a plan built
    QueryPlanned,
    /// Plan executed against the store
    QueryExecuted,
    /// Filter clauses rejected
    QueryRejected,
    /// Explain produced
    ExplainComplete,
    /// Two key-only queries intersected
    IntersectionResolved,
    /// Per-ancestor reads joined
    FanOutComplete,
    /// Time window computed
    WindowResolved,

    // Writes
    /// Conference created
    ConferenceCreated,
    /// Conference updated
    ConferenceUpdated,
    /// Session created
    SessionCreated,
    /// Speaker created
    SpeakerCreated,
    /// Profile saved
    ProfileSaved,
    /// Session added to a wishlist
    WishlistUpdated,

    // Registration
    /// Seat taken
    RegistrationCommitted,
    /// Seat released
    UnregistrationCommitted,
    /// Registration refused (already registered, sold out)
    RegistrationRejected,

    // Derived views
    /// Almost-sold-out announcement computed
    AnnouncementComputed,
    /// Featured speaker text computed
    FeaturedSpeakersComputed,

    /// Store failed while serving a request (FATAL for that request)
    StoreFailure,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "CONFCENTRAL_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SeedLoaded => "SEED_LOADED",

            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::ExplainComplete => "EXPLAIN_COMPLETE",
            Event::IntersectionResolved => "INTERSECTION_RESOLVED",
            Event::FanOutComplete => "FAN_OUT_COMPLETE",
            Event::WindowResolved => "WINDOW_RESOLVED",

            Event::ConferenceCreated => "CONFERENCE_CREATED",
            Event::ConferenceUpdated => "CONFERENCE_UPDATED",
            Event::SessionCreated => "SESSION_CREATED",
            Event::SpeakerCreated => "SPEAKER_CREATED",
            Event::ProfileSaved => "PROFILE_SAVED",
            Event::WishlistUpdated => "WISHLIST_UPDATED",

            Event::RegistrationCommitted => "REGISTRATION_COMMIT",
            Event::UnregistrationCommitted => "UNREGISTRATION_COMMIT",
            Event::RegistrationRejected => "REGISTRATION_REJECTED",

            Event::AnnouncementComputed => "ANNOUNCEMENT_COMPUTED",
            Event::FeaturedSpeakersComputed => "FEATURED_SPEAKERS_COMPUTED",

            Event::StoreFailure => "STORE_FAILURE",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::StoreFailure)
    }

    /// Returns true for client-caused refusals
    pub fn is_rejection(&self) -> bool {
        matches!(self, Event::QueryRejected | Event::RegistrationRejected)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
