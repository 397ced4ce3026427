use std::collections::HashSet;

use crate::odds::OddsConvention;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub fn from_goals(home_goals: u32, away_goals: u32) -> Self {
        if home_goals > away_goals {
            Outcome::Home
        } else if home_goals < away_goals {
            Outcome::Away
        } else {
            Outcome::Draw
        }
    }

    /// Actual score from the home side's point of view.
    pub fn home_score(self) -> f64 {
        match self {
            Outcome::Home => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Away => 0.0,
        }
    }
}

/// Three-way bookmaker prices, always held as decimal odds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookmakerOdds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl BookmakerOdds {
    pub fn decimal(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    pub fn from_convention(convention: OddsConvention, home: f64, draw: f64, away: f64) -> Self {
        Self {
            home: convention.to_decimal(home),
            draw: convention.to_decimal(draw),
            away: convention.to_decimal(away),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub home_name: String,
    pub away_name: String,
    pub home_result: u32,
    pub away_result: u32,
    pub odds: Option<BookmakerOdds>,
    pub max_odds: Option<BookmakerOdds>,
    pub date_start_timestamp: Option<i64>,
}

impl MatchRecord {
    pub fn new(home_name: &str, away_name: &str, home_result: u32, away_result: u32) -> Self {
        Self {
            home_name: home_name.to_string(),
            away_name: away_name.to_string(),
            home_result,
            away_result,
            odds: None,
            max_odds: None,
            date_start_timestamp: None,
        }
    }

    pub fn with_odds(mut self, odds: BookmakerOdds) -> Self {
        self.odds = Some(odds);
        self
    }

    pub fn with_timestamp(mut self, ts: i64) -> Self {
        self.date_start_timestamp = Some(ts);
        self
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from_goals(self.home_result, self.away_result)
    }
}

/// Distinct team names in order of first appearance (home checked before away).
pub fn team_names(matches: &[MatchRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for m in matches {
        for name in [&m.home_name, &m.away_name] {
            if seen.insert(name.as_str()) {
                out.push(name.clone());
            }
        }
    }
    out
}
