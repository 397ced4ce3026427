//! Elo ratings for league seasons, compared against bookmaker-implied
//! probabilities.
//!
//! The rating engine (`elo`, `season`, `trace`) is pure computation over
//! in-memory match sequences. Everything else moves data in and out of it:
//! JSON results pages, CSV files, SQLite, and xlsx scatter workbooks.

pub mod cli;
pub mod config;
pub mod csv_io;
pub mod db;
pub mod elo;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod match_record;
pub mod odds;
pub mod scatter;
pub mod season;
pub mod trace;

pub use elo::{EloConfig, RatingSnapshot, RatingStore, TeamRating, update_pair};
pub use error::EngineError;
pub use match_record::{BookmakerOdds, MatchRecord, Outcome};
pub use season::{StopAfter, WeekSnapshot, run_season, weekly_snapshots};
pub use trace::{FailurePolicy, MatchTraceRow, TraceEvent, run_match_trace, run_match_trace_with};
