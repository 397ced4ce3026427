use crate::elo::{EloConfig, RatingSnapshot, RatingStore, update_pair_with};
use crate::error::EngineError;
use crate::match_record::{MatchRecord, team_names};

/// How much of the season to fold before taking the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAfter {
    Weeks(usize),
    Matches(usize),
}

/// Ratings at one week boundary. Week 0 is the seeded state.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekSnapshot {
    pub week: usize,
    pub matches_played: usize,
    pub ratings: RatingSnapshot,
}

/// Number of complete weeks contained in `matches`.
pub fn complete_weeks(matches: &[MatchRecord], cfg: &EloConfig) -> Result<usize, EngineError> {
    if cfg.matches_per_week == 0 {
        return Err(EngineError::InvalidConfig(
            "matches_per_week must be at least 1".to_string(),
        ));
    }
    Ok(matches.len() / cfg.matches_per_week)
}

fn match_cutoff(
    matches: &[MatchRecord],
    stop_after: Option<StopAfter>,
    cfg: &EloConfig,
) -> Result<usize, EngineError> {
    match stop_after {
        None => Ok(matches.len()),
        Some(StopAfter::Weeks(weeks)) => {
            let max = complete_weeks(matches, cfg)?;
            if weeks > max {
                return Err(EngineError::InvalidCutoff {
                    requested: weeks,
                    max,
                });
            }
            Ok(weeks * cfg.matches_per_week)
        }
        Some(StopAfter::Matches(n)) => {
            if n > matches.len() {
                return Err(EngineError::InvalidMatchCutoff {
                    requested: n,
                    max: matches.len(),
                });
            }
            Ok(n)
        }
    }
}

/// Store seeded from `initial` plus every team of the full season at
/// `cfg.initial_rating`.
fn seeded_store(matches: &[MatchRecord], initial: &RatingSnapshot, cfg: &EloConfig) -> RatingStore {
    let mut store = RatingStore::from_snapshot(initial);
    let teams = team_names(matches);
    store.seed(teams.iter().map(String::as_str), cfg.initial_rating);
    store
}

fn apply_match(store: &mut RatingStore, m: &MatchRecord, cfg: &EloConfig) {
    let home = store.rating_or_seed(&m.home_name, cfg.initial_rating);
    let away = store.rating_or_seed(&m.away_name, cfg.initial_rating);
    let (new_home, new_away) = update_pair_with(cfg, m.home_result, m.away_result, home, away);
    store.set(&m.home_name, new_home);
    store.set(&m.away_name, new_away);
}

/// Folds `matches` in order (optionally only a prefix) and returns the final
/// ratings. The cutoff is validated before any rating is touched.
pub fn run_season(
    matches: &[MatchRecord],
    initial: &RatingSnapshot,
    stop_after: Option<StopAfter>,
    cfg: &EloConfig,
) -> Result<RatingSnapshot, EngineError> {
    let cutoff = match_cutoff(matches, stop_after, cfg)?;
    if matches.is_empty() {
        return Ok(initial.clone());
    }

    let mut store = seeded_store(matches, initial, cfg);
    for m in &matches[..cutoff] {
        apply_match(&mut store, m, cfg);
    }
    Ok(store.snapshot())
}

/// One snapshot per complete week (plus week 0), taken during a single fold.
pub fn weekly_snapshots(
    matches: &[MatchRecord],
    initial: &RatingSnapshot,
    cfg: &EloConfig,
) -> Result<Vec<WeekSnapshot>, EngineError> {
    if matches.is_empty() {
        return Err(EngineError::NoData);
    }
    let weeks = complete_weeks(matches, cfg)?;

    let mut store = seeded_store(matches, initial, cfg);
    let mut out = Vec::with_capacity(weeks + 1);
    out.push(WeekSnapshot {
        week: 0,
        matches_played: 0,
        ratings: store.snapshot(),
    });
    for week in 1..=weeks {
        let start = (week - 1) * cfg.matches_per_week;
        let end = week * cfg.matches_per_week;
        for m in &matches[start..end] {
            apply_match(&mut store, m, cfg);
        }
        out.push(WeekSnapshot {
            week,
            matches_played: end,
            ratings: store.snapshot(),
        });
    }
    Ok(out)
}
