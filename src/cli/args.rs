//! CLI argument definitions using clap
//!
//! Commands:
//! - confcentral --seed <path> conferences --filter CITY,EQ,London
//! - confcentral --seed <path> explain --filter MONTH,GT,6 [--text]
//! - confcentral --seed <path> sessions-within --conference <name> --date --start --window
//! - confcentral --seed <path> sessions-by-date-city --date --city
//! - confcentral --seed <path> sessions-before --type --start
//! - confcentral --seed <path> featured-speakers --conference <name>
//! - confcentral --seed <path> announcement

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::query::RawClause;

/// confcentral - conference backend query tool
#[derive(Parser, Debug)]
#[command(name = "confcentral")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Seed file with organizers, conferences, sessions and speakers
    #[arg(long)]
    pub seed: PathBuf,

    /// Path to service configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List conferences matching every filter
    Conferences {
        /// FIELD,OPERATOR,VALUE (e.g. CITY,EQ,London or MAX_ATTENDEES,>,50)
        #[arg(long = "filter", value_parser = parse_clause)]
        filters: Vec<RawClause>,
    },

    /// Show how filters would be planned
    Explain {
        /// FIELD,OPERATOR,VALUE
        #[arg(long = "filter", value_parser = parse_clause)]
        filters: Vec<RawClause>,
        /// Return the plan as readable text instead of a JSON object
        #[arg(long)]
        text: bool,
    },

    /// Sessions of a conference starting near a time
    SessionsWithin {
        /// Conference name from the seed file, or a websafe key
        #[arg(long)]
        conference: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HHMM
        #[arg(long)]
        start: String,
        /// Minutes on either side of the start time
        #[arg(long)]
        window: String,
    },

    /// Sessions on a date at conferences in a city
    SessionsByDateCity {
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        city: String,
    },

    /// Sessions not of a type starting before a time
    SessionsBefore {
        /// Session type to exclude
        #[arg(long = "type")]
        excluded_type: String,
        /// HHMM
        #[arg(long)]
        start: String,
    },

    /// Speakers with more than one session at a conference
    FeaturedSpeakers {
        /// Conference name from the seed file, or a websafe key
        #[arg(long)]
        conference: String,
    },

    /// Conferences that are nearly sold out
    Announcement,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Parses `FIELD,OPERATOR,VALUE`; the value may itself contain commas
pub fn parse_clause(raw: &str) -> Result<RawClause, String> {
    let mut parts = raw.splitn(3, ',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(field), Some(op), Some(value)) if !field.trim().is_empty() && !op.trim().is_empty() => {
            Ok(RawClause::new(field.trim(), op.trim(), value))
        }
        _ => Err(format!("expected FIELD,OPERATOR,VALUE, got '{}'", raw)),
    }
}
