use crate::match_record::BookmakerOdds;

/// How odds columns are expressed in a source file.
///
/// `Net` is the legacy processed-CSV form (`decimal - 1`). Everything past the
/// ingestion boundary works in decimal odds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OddsConvention {
    #[default]
    Decimal,
    Net,
}

impl OddsConvention {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "decimal" | "dec" => Some(Self::Decimal),
            "net" | "fractional" => Some(Self::Net),
            _ => None,
        }
    }

    pub fn to_decimal(self, value: f64) -> f64 {
        match self {
            Self::Decimal => value,
            Self::Net => value + 1.0,
        }
    }
}

pub fn implied_probability(decimal_odds: f64) -> Option<f64> {
    if !decimal_odds.is_finite() || decimal_odds <= 0.0 {
        return None;
    }
    Some(1.0 / decimal_odds)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpliedProbs {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl ImpliedProbs {
    pub fn from_odds(odds: &BookmakerOdds) -> Option<Self> {
        Some(Self {
            home: implied_probability(odds.home)?,
            draw: implied_probability(odds.draw)?,
            away: implied_probability(odds.away)?,
        })
    }

    /// Bookmaker margin: how far the raw implied probabilities sum past 1.
    pub fn overround(&self) -> f64 {
        self.home + self.draw + self.away - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implied_probability_inverts_decimal_odds() {
        assert_eq!(implied_probability(2.0), Some(0.5));
        assert_eq!(implied_probability(4.0), Some(0.25));
        assert_eq!(implied_probability(0.0), None);
        assert_eq!(implied_probability(-1.5), None);
        assert_eq!(implied_probability(f64::NAN), None);
    }

    #[test]
    fn net_odds_are_shifted_by_one() {
        let net = OddsConvention::Net;
        assert_eq!(net.to_decimal(1.5), 2.5);
        assert_eq!(OddsConvention::Decimal.to_decimal(2.5), 2.5);
        assert_eq!(OddsConvention::parse(" NET "), Some(OddsConvention::Net));
        assert_eq!(OddsConvention::parse("american"), None);
    }

    #[test]
    fn overround_is_the_bookmaker_margin() {
        let probs = ImpliedProbs::from_odds(&BookmakerOdds::decimal(2.0, 4.0, 4.0)).unwrap();
        assert!(probs.overround().abs() < 1e-12);

        let probs = ImpliedProbs::from_odds(&BookmakerOdds::decimal(1.9, 3.4, 4.2)).unwrap();
        assert!(probs.overround() > 0.0);
        assert!(ImpliedProbs::from_odds(&BookmakerOdds::decimal(1.9, 0.0, 4.2)).is_none());
    }
}
