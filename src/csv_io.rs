use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::elo::{RatingSnapshot, TeamRating};
use crate::match_record::{BookmakerOdds, MatchRecord, Outcome};
use crate::odds::OddsConvention;
use crate::trace::MatchTraceRow;

/// Cell values treated as missing on read.
const NA_VALUES: &[&str] = &["", "N/A", "NA", "NaN", "-", "?"];

#[derive(Debug, Serialize, Deserialize)]
struct MatchCsvRow {
    #[serde(rename = "home-name")]
    home_name: String,
    #[serde(rename = "away-name")]
    away_name: String,
    #[serde(rename = "home-result")]
    home_result: String,
    #[serde(rename = "away-result")]
    away_result: String,
    #[serde(rename = "home-win", default)]
    home_win: Option<String>,
    #[serde(rename = "away-win", default)]
    away_win: Option<String>,
    #[serde(rename = "home-odds-avg", default)]
    home_odds_avg: Option<String>,
    #[serde(rename = "home-odds-max", default)]
    home_odds_max: Option<String>,
    #[serde(rename = "draw-odds-avg", default)]
    draw_odds_avg: Option<String>,
    #[serde(rename = "draw-odds-max", default)]
    draw_odds_max: Option<String>,
    #[serde(rename = "away-odds-avg", default)]
    away_odds_avg: Option<String>,
    #[serde(rename = "away-odds-max", default)]
    away_odds_max: Option<String>,
    #[serde(rename = "date-start-timestamp", default)]
    date_start_timestamp: Option<String>,
}

impl MatchCsvRow {
    fn into_record(self, convention: OddsConvention) -> Result<MatchRecord> {
        let home_result = parse_goals(&self.home_result).context("home-result")?;
        let away_result = parse_goals(&self.away_result).context("away-result")?;

        let triplet = |h: &Option<String>, d: &Option<String>, a: &Option<String>| {
            Some(BookmakerOdds::from_convention(
                convention,
                cell_f64(h)?,
                cell_f64(d)?,
                cell_f64(a)?,
            ))
        };
        let odds = triplet(&self.home_odds_avg, &self.draw_odds_avg, &self.away_odds_avg);
        let max_odds = triplet(&self.home_odds_max, &self.draw_odds_max, &self.away_odds_max);
        let date_start_timestamp =
            parse_timestamp(&self.date_start_timestamp).context("date-start-timestamp")?;

        Ok(MatchRecord {
            home_name: self.home_name.trim().to_string(),
            away_name: self.away_name.trim().to_string(),
            home_result,
            away_result,
            odds,
            max_odds,
            date_start_timestamp,
        })
    }

    fn from_record(m: &MatchRecord) -> Self {
        let outcome = m.outcome();
        let [home_odds_avg, draw_odds_avg, away_odds_avg] = price_cells(m.odds);
        let [home_odds_max, draw_odds_max, away_odds_max] = price_cells(m.max_odds);
        Self {
            home_name: m.home_name.clone(),
            away_name: m.away_name.clone(),
            home_result: m.home_result.to_string(),
            away_result: m.away_result.to_string(),
            home_win: Some(bool_cell(outcome == Outcome::Home)),
            away_win: Some(bool_cell(outcome == Outcome::Away)),
            home_odds_avg,
            home_odds_max,
            draw_odds_avg,
            draw_odds_max,
            away_odds_avg,
            away_odds_max,
            date_start_timestamp: m.date_start_timestamp.map(|t| t.to_string()),
        }
    }
}

/// Reads a processed-match CSV. Odds columns are interpreted with
/// `convention` and stored as decimal odds.
pub fn read_matches(path: &Path, convention: OddsConvention) -> Result<Vec<MatchRecord>> {
    ensure_csv_path(path)?;
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("the file {} could not be opened", path.display()))?;

    let mut out = Vec::new();
    for (idx, row) in reader.deserialize::<MatchCsvRow>().enumerate() {
        let row = row.with_context(|| format!("decode row {} of {}", idx + 1, path.display()))?;
        let record = row
            .into_record(convention)
            .with_context(|| format!("row {} of {}", idx + 1, path.display()))?;
        out.push(record);
    }
    tracing::debug!(path = %path.display(), matches = out.len(), "match csv loaded");
    Ok(out)
}

/// Writes matches with decimal odds and derived `home-win`/`away-win` flags.
pub fn write_matches(path: &Path, matches: &[MatchRecord]) -> Result<()> {
    if matches.is_empty() {
        return Err(anyhow!("no data to save to {}", path.display()));
    }
    write_rows(path, matches.iter().map(MatchCsvRow::from_record))
}

pub fn write_snapshot(path: &Path, snapshot: &RatingSnapshot) -> Result<()> {
    if snapshot.is_empty() {
        return Err(anyhow!("no data to save to {}", path.display()));
    }
    write_rows(path, snapshot.entries().iter())
}

pub fn read_snapshot(path: &Path) -> Result<RatingSnapshot> {
    ensure_csv_path(path)?;
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("the file {} could not be opened", path.display()))?;
    let entries = reader
        .deserialize::<TeamRating>()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("decode ratings {}", path.display()))?;
    Ok(RatingSnapshot::from_entries(entries))
}

pub fn write_trace(path: &Path, rows: &[MatchTraceRow]) -> Result<()> {
    if rows.is_empty() {
        return Err(anyhow!("no data to save to {}", path.display()));
    }
    write_rows(path, rows.iter())
}

pub fn read_trace(path: &Path) -> Result<Vec<MatchTraceRow>> {
    ensure_csv_path(path)?;
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("the file {} could not be opened", path.display()))?;
    reader
        .deserialize::<MatchTraceRow>()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("decode trace {}", path.display()))
}

fn write_rows<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<()> {
    ensure_csv_path(path)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.is_dir()
    {
        return Err(anyhow!(
            "the directory {} does not exist",
            parent.display()
        ));
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create csv {}", path.display()))?;
    let mut written = 0usize;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("write csv row {written}"))?;
        written += 1;
    }
    writer
        .flush()
        .with_context(|| format!("flush csv {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = written, "csv saved");
    Ok(())
}

fn ensure_csv_path(path: &Path) -> Result<()> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(anyhow!("{} is not a .csv file", path.display()));
    }
    Ok(())
}

fn cell_f64(cell: &Option<String>) -> Option<f64> {
    let raw = cell.as_deref()?.trim();
    if NA_VALUES.contains(&raw) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_goals(raw: &str) -> Result<u32> {
    let t = raw.trim();
    if let Ok(n) = t.parse::<u32>() {
        return Ok(n);
    }
    match t.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
        _ => Err(anyhow!("invalid goal count {t:?}")),
    }
}

/// Whole seconds only; spreadsheets sometimes write them as `1565380800.0`.
fn parse_timestamp(cell: &Option<String>) -> Result<Option<i64>> {
    let Some(raw) = cell.as_deref().map(str::trim) else {
        return Ok(None);
    };
    if NA_VALUES.contains(&raw) {
        return Ok(None);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Some(n));
    }
    match raw.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => {
            Ok(Some(v as i64))
        }
        _ => Err(anyhow!("invalid timestamp {raw:?}")),
    }
}

fn price_cells(odds: Option<BookmakerOdds>) -> [Option<String>; 3] {
    match odds {
        Some(o) => [o.home, o.draw, o.away].map(|v| Some(format!("{v:.2}"))),
        None => [None, None, None],
    }
}

fn bool_cell(v: bool) -> String {
    let s = if v { "True" } else { "False" };
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn na_cells_are_missing() {
        assert_eq!(cell_f64(&Some("N/A".to_string())), None);
        assert_eq!(cell_f64(&Some(" - ".to_string())), None);
        assert_eq!(cell_f64(&Some("?".to_string())), None);
        assert_eq!(cell_f64(&None), None);
        assert_eq!(cell_f64(&Some("1.25".to_string())), Some(1.25));
    }

    #[test]
    fn timestamps_must_be_whole_seconds() {
        let cell = |raw: &str| Some(raw.to_string());
        assert_eq!(parse_timestamp(&cell("1565380800")).unwrap(), Some(1_565_380_800));
        assert_eq!(parse_timestamp(&cell("1565380800.0")).unwrap(), Some(1_565_380_800));
        assert_eq!(parse_timestamp(&cell("N/A")).unwrap(), None);
        assert_eq!(parse_timestamp(&None).unwrap(), None);
        assert!(parse_timestamp(&cell("1565380800.7")).is_err());
        assert!(parse_timestamp(&cell("1e30")).is_err());
        assert!(parse_timestamp(&cell("kickoff")).is_err());
    }

    #[test]
    fn goals_accept_float_formatting() {
        assert_eq!(parse_goals("3").unwrap(), 3);
        assert_eq!(parse_goals("2.0").unwrap(), 2);
        assert!(parse_goals("-1").is_err());
        assert!(parse_goals("1.5").is_err());
    }

    #[test]
    fn net_odds_rows_become_decimal() {
        let row = MatchCsvRow {
            home_name: "Liverpool".to_string(),
            away_name: "Norwich".to_string(),
            home_result: "4".to_string(),
            away_result: "1".to_string(),
            home_win: None,
            away_win: None,
            home_odds_avg: Some("0.14".to_string()),
            home_odds_max: None,
            draw_odds_avg: Some("8.2".to_string()),
            draw_odds_max: None,
            away_odds_avg: Some("18".to_string()),
            away_odds_max: None,
            date_start_timestamp: Some("1565380800".to_string()),
        };
        let m = row.into_record(OddsConvention::Net).unwrap();
        let odds = m.odds.unwrap();
        assert!((odds.home - 1.14).abs() < 1e-12);
        assert!((odds.draw - 9.2).abs() < 1e-12);
        assert_eq!(odds.away, 19.0);
        assert_eq!(m.max_odds, None);
        assert_eq!(m.date_start_timestamp, Some(1_565_380_800));
    }

    #[test]
    fn non_csv_paths_are_rejected() {
        assert!(ensure_csv_path(Path::new("ratings.txt")).is_err());
        assert!(ensure_csv_path(Path::new("ratings")).is_err());
        assert!(ensure_csv_path(Path::new("out/ratings.CSV")).is_ok());
    }
}
