use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::match_record::Outcome;

pub const DEFAULT_INITIAL_RATING: f64 = 1000.0;
pub const DEFAULT_MATCHES_PER_WEEK: usize = 10;

/// Step function mapping the absolute rating gap to a K-factor.
/// Both thresholds are inclusive upper bounds of their tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KTiers {
    pub near: f64,
    pub mid: f64,
    pub far: f64,
    pub near_gap: f64,
    pub far_gap: f64,
}

impl Default for KTiers {
    fn default() -> Self {
        Self {
            near: 32.0,
            mid: 24.0,
            far: 16.0,
            near_gap: 400.0,
            far_gap: 800.0,
        }
    }
}

impl KTiers {
    pub fn k_for_gap(&self, gap: f64) -> f64 {
        let gap = gap.abs();
        if gap <= self.near_gap {
            self.near
        } else if gap <= self.far_gap {
            self.mid
        } else {
            self.far
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EloConfig {
    pub initial_rating: f64,
    pub scale: f64,
    /// League format assumption used to turn a week cutoff into a match count.
    pub matches_per_week: usize,
    pub k_tiers: KTiers,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            initial_rating: DEFAULT_INITIAL_RATING,
            scale: 400.0,
            matches_per_week: DEFAULT_MATCHES_PER_WEEK,
            k_tiers: KTiers::default(),
        }
    }
}

pub fn expected_score(rating: f64, opponent: f64, scale: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((opponent - rating) / scale))
}

pub fn k_factor(gap: f64) -> f64 {
    KTiers::default().k_for_gap(gap)
}

/// New `(home, away)` ratings after one match, with the default constants.
pub fn update_pair(
    home_goals: u32,
    away_goals: u32,
    home_rating: f64,
    away_rating: f64,
) -> (f64, f64) {
    update_pair_with(
        &EloConfig::default(),
        home_goals,
        away_goals,
        home_rating,
        away_rating,
    )
}

pub fn update_pair_with(
    cfg: &EloConfig,
    home_goals: u32,
    away_goals: u32,
    home_rating: f64,
    away_rating: f64,
) -> (f64, f64) {
    let home_exp = expected_score(home_rating, away_rating, cfg.scale);
    let away_exp = 1.0 - home_exp;
    let k = cfg.k_tiers.k_for_gap(home_rating - away_rating);

    let s_home = Outcome::from_goals(home_goals, away_goals).home_score();
    let s_away = 1.0 - s_home;

    (
        home_rating + k * (s_home - home_exp),
        away_rating + k * (s_away - away_exp),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRating {
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Rating")]
    pub rating: f64,
}

/// Owned copy of the ratings at one point in a traversal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingSnapshot {
    entries: Vec<TeamRating>,
}

impl RatingSnapshot {
    pub fn from_entries(entries: Vec<TeamRating>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TeamRating] {
        &self.entries
    }

    pub fn get(&self, team: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.team == team)
            .map(|e| e.rating)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted best first; ties keep declaration order.
    pub fn ranked(&self) -> Vec<TeamRating> {
        let mut out = self.entries.clone();
        out.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        out
    }
}

/// Live team -> rating map for one traversal. Iteration follows the order in
/// which teams were first inserted.
#[derive(Debug, Clone, Default)]
pub struct RatingStore {
    index: HashMap<String, usize>,
    entries: Vec<TeamRating>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: &RatingSnapshot) -> Self {
        let mut store = Self::new();
        for e in snapshot.entries() {
            store.set(&e.team, e.rating);
        }
        store
    }

    /// Gives every listed team `initial` unless it already has a rating.
    pub fn seed<'a>(&mut self, teams: impl IntoIterator<Item = &'a str>, initial: f64) {
        for team in teams {
            if !self.index.contains_key(team) {
                self.set(team, initial);
            }
        }
    }

    pub fn get(&self, team: &str) -> Option<f64> {
        self.index.get(team).map(|&i| self.entries[i].rating)
    }

    pub fn rating_or_seed(&mut self, team: &str, initial: f64) -> f64 {
        if let Some(r) = self.get(team) {
            return r;
        }
        self.set(team, initial);
        initial
    }

    pub fn set(&mut self, team: &str, rating: f64) {
        match self.index.get(team) {
            Some(&i) => self.entries[i].rating = rating,
            None => {
                self.index.insert(team.to_string(), self.entries.len());
                self.entries.push(TeamRating {
                    team: team.to_string(),
                    rating,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> RatingSnapshot {
        RatingSnapshot::from_entries(self.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn equal_ratings_home_win() {
        let (h, a) = update_pair(2, 0, 1000.0, 1000.0);
        assert!(close(h, 1016.0));
        assert!(close(a, 984.0));
    }

    #[test]
    fn equal_ratings_draw_is_a_no_op() {
        for r in [-250.0, 0.0, 1000.0, 1873.5] {
            let (h, a) = update_pair(1, 1, r, r);
            assert!(close(h, r));
            assert!(close(a, r));
        }
    }

    #[test]
    fn update_is_zero_sum() {
        let cases = [
            (3, 1, 1100.0, 950.0),
            (0, 2, 1400.0, 900.0),
            (1, 1, 700.0, 1650.0),
            (0, 0, 2000.0, 1000.0),
        ];
        for (hg, ag, hr, ar) in cases {
            let (h, a) = update_pair(hg, ag, hr, ar);
            assert!(close(h - hr, -(a - ar)), "{hg}-{ag} {hr} {ar}");
        }
    }

    #[test]
    fn winner_always_gains() {
        for (hr, ar) in [(1000.0, 1000.0), (2500.0, 100.0), (100.0, 2500.0)] {
            let (h, a) = update_pair(1, 0, hr, ar);
            assert!(h > hr && a < ar);
            let (h, a) = update_pair(0, 1, hr, ar);
            assert!(h < hr && a > ar);
        }
    }

    #[test]
    fn k_factor_tier_boundaries() {
        assert_eq!(k_factor(400.0), 32.0);
        assert_eq!(k_factor(400.0001), 24.0);
        assert_eq!(k_factor(800.0), 24.0);
        assert_eq!(k_factor(800.0001), 16.0);
        assert_eq!(k_factor(-900.0), 16.0);
        assert_eq!(k_factor(0.0), 32.0);
    }

    #[test]
    fn k_tier_is_visible_in_update() {
        // 500-point favourite wins: K=24, expectation ~0.9468.
        let (h, _) = update_pair(1, 0, 1500.0, 1000.0);
        let exp = expected_score(1500.0, 1000.0, 400.0);
        assert!(close(h, 1500.0 + 24.0 * (1.0 - exp)));
    }

    #[test]
    fn store_keeps_insertion_order_and_snapshot_is_detached() {
        let mut store = RatingStore::new();
        store.seed(["B", "A", "B"], 1000.0);
        assert_eq!(store.len(), 2);
        store.set("A", 1010.0);
        let snap = store.snapshot();
        store.set("A", 1200.0);

        let names: Vec<_> = snap.entries().iter().map(|e| e.team.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(snap.get("A"), Some(1010.0));
        assert_eq!(store.get("A"), Some(1200.0));
        assert_eq!(store.rating_or_seed("C", 1000.0), 1000.0);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn seeding_does_not_overwrite_existing_ratings() {
        let mut store = RatingStore::new();
        store.set("A", 1234.0);
        store.seed(["A", "B"], 1000.0);
        assert_eq!(store.get("A"), Some(1234.0));
        assert_eq!(store.get("B"), Some(1000.0));
    }
}
