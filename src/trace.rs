use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::elo::{EloConfig, RatingSnapshot, RatingStore, expected_score, update_pair_with};
use crate::error::EngineError;
use crate::match_record::{MatchRecord, team_names};
use crate::odds::ImpliedProbs;

const MATCH_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What to do when a record lacks the odds or kickoff time the trace needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return the first error; no rows are produced.
    #[default]
    Abort,
    /// Report the record through the event sink and carry on. Skipped records
    /// do not move any rating.
    Skip,
}

impl FailurePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "abort" | "fail" => Some(Self::Abort),
            "skip" | "continue" => Some(Self::Skip),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Skipped {
        index: usize,
        home: String,
        away: String,
        reason: EngineError,
    },
    Completed {
        rows: usize,
        skipped: usize,
    },
}

/// One processed match. Ratings are post-update; every probability is
/// computed from the pre-update ratings.
///
/// `draw_elo` is the residual `1 - home - away` of a two-outcome model and is
/// therefore ~0. The `*_bookies_draw_odds` columns are a hybrid: Elo's
/// home/away split scaled into the mass the bookmaker leaves after its own
/// draw estimate. They are meant for side-by-side comparison with the market,
/// not as a coherent three-way distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchTraceRow {
    #[serde(rename = "home-name")]
    pub home_name: String,
    #[serde(rename = "away-name")]
    pub away_name: String,
    #[serde(rename = "home-elo")]
    pub home_elo: f64,
    #[serde(rename = "away-elo")]
    pub away_elo: f64,
    #[serde(rename = "home-win-odds")]
    pub home_win_odds: f64,
    #[serde(rename = "draw-odds")]
    pub draw_odds: f64,
    #[serde(rename = "away-win-odds")]
    pub away_win_odds: f64,
    #[serde(rename = "home-result")]
    pub home_result: u32,
    #[serde(rename = "away-result")]
    pub away_result: u32,
    #[serde(rename = "match-date")]
    pub match_date: String,
    pub epoch_time: i64,
    #[serde(rename = "home-win-elo")]
    pub home_win_elo: f64,
    #[serde(rename = "draw-elo")]
    pub draw_elo: f64,
    #[serde(rename = "away-win-elo")]
    pub away_win_elo: f64,
    pub home_win_elo_bookies_draw_odds: f64,
    pub away_win_elo_bookies_draw_odds: f64,
    pub draw_elo_bookies_draw_odds: f64,
    #[serde(rename = "bookies-margin")]
    pub bookies_margin: f64,
}

/// Elo probabilities for one fixture from pre-match ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EloProbs {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl EloProbs {
    pub fn from_ratings(home_rating: f64, away_rating: f64, scale: f64) -> Self {
        let home = expected_score(home_rating, away_rating, scale);
        let away = 1.0 - home;
        Self {
            home,
            draw: 1.0 - (home + away),
            away,
        }
    }

    /// Scales home/away into `1 - bookies_draw`; the draw slot takes the
    /// bookmaker's own draw probability.
    pub fn with_bookies_draw(&self, bookies_draw: f64) -> Self {
        Self {
            home: self.home * (1.0 - bookies_draw),
            draw: bookies_draw,
            away: self.away * (1.0 - bookies_draw),
        }
    }
}

struct TraceInputs {
    implied: ImpliedProbs,
    epoch_time: i64,
    match_date: String,
}

fn trace_inputs(index: usize, m: &MatchRecord) -> Result<TraceInputs, EngineError> {
    let missing = |field| EngineError::MissingField {
        index,
        home: m.home_name.clone(),
        away: m.away_name.clone(),
        field,
    };
    let invalid = |field, value: String| EngineError::InvalidField {
        index,
        home: m.home_name.clone(),
        away: m.away_name.clone(),
        field,
        value,
    };

    let odds = m.odds.ok_or_else(|| missing("odds"))?;
    for (field, value) in [
        ("home-odds-avg", odds.home),
        ("draw-odds-avg", odds.draw),
        ("away-odds-avg", odds.away),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(field, value.to_string()));
        }
    }
    let implied =
        ImpliedProbs::from_odds(&odds).ok_or_else(|| invalid("odds", format!("{odds:?}")))?;

    let epoch_time = m
        .date_start_timestamp
        .ok_or_else(|| missing("date-start-timestamp"))?;
    let match_date = DateTime::from_timestamp(epoch_time, 0)
        .ok_or_else(|| invalid("date-start-timestamp", epoch_time.to_string()))?
        .format(MATCH_DATE_FORMAT)
        .to_string();

    Ok(TraceInputs {
        implied,
        epoch_time,
        match_date,
    })
}

/// Per-match trace with the abort-on-first-bad-record policy.
pub fn run_match_trace(
    matches: &[MatchRecord],
    initial: &RatingSnapshot,
    cfg: &EloConfig,
) -> Result<Vec<MatchTraceRow>, EngineError> {
    run_match_trace_with(matches, initial, cfg, FailurePolicy::Abort, |_| {})
}

pub fn run_match_trace_with(
    matches: &[MatchRecord],
    initial: &RatingSnapshot,
    cfg: &EloConfig,
    policy: FailurePolicy,
    mut on_event: impl FnMut(TraceEvent),
) -> Result<Vec<MatchTraceRow>, EngineError> {
    if matches.is_empty() {
        return Err(EngineError::NoData);
    }

    // Under Abort nothing may be emitted for a bad batch, so validate up front.
    if policy == FailurePolicy::Abort {
        for (index, m) in matches.iter().enumerate() {
            trace_inputs(index, m)?;
        }
    }

    let mut store = RatingStore::from_snapshot(initial);
    let teams = team_names(matches);
    store.seed(teams.iter().map(String::as_str), cfg.initial_rating);

    let mut rows = Vec::with_capacity(matches.len());
    let mut skipped = 0usize;
    for (index, m) in matches.iter().enumerate() {
        let inputs = match trace_inputs(index, m) {
            Ok(inputs) => inputs,
            Err(reason) => {
                skipped += 1;
                on_event(TraceEvent::Skipped {
                    index,
                    home: m.home_name.clone(),
                    away: m.away_name.clone(),
                    reason,
                });
                continue;
            }
        };

        let home_rating = store.rating_or_seed(&m.home_name, cfg.initial_rating);
        let away_rating = store.rating_or_seed(&m.away_name, cfg.initial_rating);

        let elo = EloProbs::from_ratings(home_rating, away_rating, cfg.scale);
        let hybrid = elo.with_bookies_draw(inputs.implied.draw);

        let (new_home, new_away) =
            update_pair_with(cfg, m.home_result, m.away_result, home_rating, away_rating);
        store.set(&m.home_name, new_home);
        store.set(&m.away_name, new_away);

        rows.push(MatchTraceRow {
            home_name: m.home_name.clone(),
            away_name: m.away_name.clone(),
            home_elo: new_home,
            away_elo: new_away,
            home_win_odds: inputs.implied.home,
            draw_odds: inputs.implied.draw,
            away_win_odds: inputs.implied.away,
            home_result: m.home_result,
            away_result: m.away_result,
            match_date: inputs.match_date,
            epoch_time: inputs.epoch_time,
            home_win_elo: elo.home,
            draw_elo: elo.draw,
            away_win_elo: elo.away,
            home_win_elo_bookies_draw_odds: hybrid.home,
            away_win_elo_bookies_draw_odds: hybrid.away,
            draw_elo_bookies_draw_odds: hybrid.draw,
            bookies_margin: inputs.implied.overround(),
        });
    }

    on_event(TraceEvent::Completed {
        rows: rows.len(),
        skipped,
    });
    Ok(rows)
}

/// Ratings left in place once the whole trace has been applied.
pub fn final_ratings(rows: &[MatchTraceRow]) -> RatingSnapshot {
    let mut store = RatingStore::new();
    for row in rows {
        store.set(&row.home_name, row.home_elo);
        store.set(&row.away_name, row.away_elo);
    }
    store.snapshot()
}
