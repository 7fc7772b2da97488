//! CLI command implementations
//!
//! Each run boots a fresh in-memory store, applies the seed file and
//! executes exactly one command.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::ServiceConfig;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::service::ConferenceService;
use crate::store::{EntityStore, MemoryStore};

use super::args::{Cli, Command};
use super::errors::CliResult;
use super::seed::{SeedFile, SeedIndex};

/// Loads config and seed data, then runs the selected command
pub async fn execute(cli: &Cli) -> CliResult<Value> {
    log_event(Event::BootStart);
    let config = load_config(cli.config.as_deref())?;

    let service = ConferenceService::new(Arc::new(MemoryStore::new()), config);
    let seed = SeedFile::load(&cli.seed)?;
    let index = seed.apply(&service)?;
    log_event_with_fields(
        Event::SeedLoaded,
        &[
            ("conferences", &index.conferences.len().to_string()),
            ("speakers", &index.speakers.len().to_string()),
        ],
    );

    run_command(&service, &index, &cli.command).await
}

/// Reads the config file if one was given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> CliResult<ServiceConfig> {
    let config = match path {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    log_event(Event::ConfigLoaded);
    Ok(config)
}

/// Runs one command against an already seeded service
pub async fn run_command<S: EntityStore + 'static>(
    service: &ConferenceService<S>,
    index: &SeedIndex,
    command: &Command,
) -> CliResult<Value> {
    match command {
        Command::Conferences { filters } => to_json(&service.query_conferences(filters)?),

        Command::Explain { filters, text } => {
            let explain = service.explain_conferences(filters);
            if *text {
                Ok(Value::String(explain.to_string()))
            } else {
                to_json(&explain)
            }
        }

        Command::SessionsWithin {
            conference,
            date,
            start,
            window,
        } => to_json(&service.get_sessions_with_start_times_within(
            index.conference(conference),
            date,
            start,
            window,
        )?),

        Command::SessionsByDateCity { date, city } => {
            to_json(&service.get_sessions_by_date_and_city(date, city).await?)
        }

        Command::SessionsBefore { excluded_type, start } => to_json(
            &service
                .get_sessions_before_start_time_excluding_type(excluded_type, start)
                .await?,
        ),

        Command::FeaturedSpeakers { conference } => Ok(json!({
            "featuredSpeakers": service.featured_speakers(index.conference(conference))?
        })),

        Command::Announcement => Ok(json!({
            "announcement": service.almost_sold_out_announcement()?
        })),
    }
}

fn to_json<T: Serialize>(value: &T) -> CliResult<Value> {
    Ok(serde_json::to_value(value)?)
}
