use std::env;
use std::path::PathBuf;

use crate::db;
use crate::elo::{DEFAULT_INITIAL_RATING, DEFAULT_MATCHES_PER_WEEK, EloConfig};
use crate::odds::OddsConvention;
use crate::scatter::DEFAULT_LAST_MATCHES;
use crate::trace::FailurePolicy;

const DEFAULT_LOG_FILE: &str = "application.log";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub elo: EloConfig,
    pub odds_convention: OddsConvention,
    pub trace_policy: FailurePolicy,
    pub scatter_last_matches: usize,
    pub log_file: Option<PathBuf>,
    pub log_level: tracing::Level,
    pub db_path: Option<PathBuf>,
}

impl AppConfig {
    /// Loads `.env.local` / `.env` if present, then reads `ELO_*` variables.
    /// Unparseable values fall back to their defaults.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let initial_rating = env::var("ELO_INITIAL_RATING")
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(DEFAULT_INITIAL_RATING);
        let matches_per_week = env::var("ELO_MATCHES_PER_WEEK")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MATCHES_PER_WEEK);
        let odds_convention = opt_env("ELO_ODDS_CONVENTION")
            .and_then(|v| OddsConvention::parse(&v))
            .unwrap_or_default();
        let trace_policy = opt_env("ELO_TRACE_POLICY")
            .and_then(|v| FailurePolicy::parse(&v))
            .unwrap_or_default();
        let scatter_last_matches = env::var("ELO_SCATTER_LAST_MATCHES")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_LAST_MATCHES);
        let log_file = match env::var("ELO_LOG_FILE") {
            Ok(raw) if raw.trim().is_empty() => None,
            Ok(raw) => Some(PathBuf::from(raw.trim())),
            Err(_) => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        };
        let log_level = opt_env("ELO_LOG_LEVEL")
            .and_then(|v| v.trim().parse::<tracing::Level>().ok())
            .unwrap_or(tracing::Level::INFO);
        let db_path = opt_env("ELO_DB_PATH")
            .map(PathBuf::from)
            .or_else(db::default_db_path);

        Self {
            elo: EloConfig {
                initial_rating,
                matches_per_week,
                ..EloConfig::default()
            },
            odds_convention,
            trace_policy,
            scatter_last_matches,
            log_file,
            log_level,
            db_path,
        }
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val)
        }
    })
}
