//! confcentral - conference management backend
//!
//! Conferences, sessions, speakers, profiles and registrations over an
//! ancestor-scoped entity store, with a query engine that keeps every store
//! query to at most one inequality property.

pub mod cli;
pub mod config;
pub mod model;
pub mod observability;
pub mod query;
pub mod service;
pub mod store;
