use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::match_record::{BookmakerOdds, MatchRecord};

const POSTPONED: &str = "postp.";

#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub files_read: usize,
    pub rows_seen: usize,
    pub postponed: usize,
    pub matches: Vec<MatchRecord>,
    pub errors: Vec<String>,
}

/// Reads every `*.json` results page in `dir` (file-name order) and returns
/// the matches in chronological order. Bad files and bad rows are recorded in
/// `errors` and skipped.
pub fn ingest_results_dir(dir: &Path) -> Result<IngestSummary> {
    if !dir.is_dir() {
        return Err(anyhow!("results folder {} does not exist", dir.display()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("list results folder {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut summary = IngestSummary::default();
    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                summary.errors.push(format!("{name}: {err}"));
                continue;
            }
        };
        if let Err(err) = ingest_results_page(&raw, &mut summary) {
            summary.errors.push(format!("{name}: {err:#}"));
            continue;
        }
        summary.files_read += 1;
    }

    tracing::info!(
        files = summary.files_read,
        matches = summary.matches.len(),
        postponed = summary.postponed,
        errors = summary.errors.len(),
        "results folder ingested"
    );
    Ok(summary)
}

/// Parses one results page. Pages list the newest match first.
pub fn ingest_results_page(raw: &str, summary: &mut IngestSummary) -> Result<()> {
    let v: Value = serde_json::from_str(raw.trim()).context("invalid results json")?;
    let rows = v
        .get("d")
        .and_then(|d| d.get("rows"))
        .and_then(|r| r.as_array())
        .ok_or_else(|| anyhow!("missing d.rows"))?;

    for (i, row) in rows.iter().rev().enumerate() {
        summary.rows_seen += 1;
        let home = row.get("home-name").and_then(|x| x.as_str()).unwrap_or("?");
        let away = row.get("away-name").and_then(|x| x.as_str()).unwrap_or("?");

        let Some(result) = row.get("result") else {
            tracing::warn!(home, away, "game is missing the result key");
            continue;
        };
        if result.as_str() == Some(POSTPONED) {
            tracing::info!(home, away, "game was postponed");
            summary.postponed += 1;
            continue;
        }

        match parse_result_row(row) {
            Ok(m) => summary.matches.push(m),
            Err(err) => summary
                .errors
                .push(format!("game {i} ({home} vs {away}): {err}")),
        }
    }
    Ok(())
}

fn parse_result_row(v: &Value) -> Result<MatchRecord> {
    let home_name = required_str(v, "home-name")?;
    let away_name = required_str(v, "away-name")?;
    let home_result = v
        .get("homeResult")
        .and_then(as_u32_any)
        .ok_or_else(|| anyhow!("missing homeResult"))?;
    let away_result = v
        .get("awayResult")
        .and_then(as_u32_any)
        .ok_or_else(|| anyhow!("missing awayResult"))?;
    let ts = v
        .get("date-start-timestamp")
        .and_then(as_i64_any)
        .ok_or_else(|| anyhow!("missing date-start-timestamp"))?;

    let odds = v
        .get("odds")
        .and_then(|o| o.as_array())
        .ok_or_else(|| anyhow!("missing odds"))?;
    let avg = odds_triplet(odds, "avgOdds").ok_or_else(|| anyhow!("missing avgOdds"))?;
    let max = odds_triplet(odds, "maxOdds");

    Ok(MatchRecord {
        home_name,
        away_name,
        home_result,
        away_result,
        odds: Some(avg),
        max_odds: max,
        date_start_timestamp: Some(ts),
    })
}

/// Odds entries are ordered home, draw, away.
fn odds_triplet(odds: &[Value], key: &str) -> Option<BookmakerOdds> {
    let price = |idx: usize| odds.get(idx)?.get(key).and_then(as_f64_any);
    Some(BookmakerOdds::decimal(price(0)?, price(1)?, price(2)?))
}

fn required_str(v: &Value, key: &str) -> Result<String> {
    let s = v
        .get(key)
        .and_then(|x| x.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    if s.is_empty() {
        return Err(anyhow!("missing {key}"));
    }
    Ok(s)
}

fn as_i64_any(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<i64>().ok()
}

fn as_u32_any(v: &Value) -> Option<u32> {
    let n = as_i64_any(v)?;
    u32::try_from(n).ok()
}

fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{"d":{"rows":[
        {"home-name":"Spurs","away-name":"Villa","result":"3:1","homeResult":"3","awayResult":1,
         "date-start-timestamp":1565539200,
         "odds":[{"avgOdds":1.3,"maxOdds":1.35},{"avgOdds":5.6,"maxOdds":6.0},{"avgOdds":"10.5","maxOdds":12.0}]},
        {"home-name":"Bournemouth","away-name":"Sheffield Utd","result":"postp.","homeResult":"","awayResult":""},
        {"home-name":"Liverpool","away-name":"Norwich","result":"4:1","homeResult":4,"awayResult":1,
         "date-start-timestamp":1565380800,
         "odds":[{"avgOdds":1.14},{"avgOdds":9.2},{"avgOdds":19.0}]}
    ]}}"#;

    #[test]
    fn page_rows_are_reversed_and_postponed_skipped() {
        let mut summary = IngestSummary::default();
        ingest_results_page(PAGE, &mut summary).unwrap();
        assert_eq!(summary.rows_seen, 3);
        assert_eq!(summary.postponed, 1);
        assert!(summary.errors.is_empty());
        assert_eq!(summary.matches.len(), 2);

        let first = &summary.matches[0];
        assert_eq!(first.home_name, "Liverpool");
        assert_eq!(first.odds, Some(BookmakerOdds::decimal(1.14, 9.2, 19.0)));
        assert_eq!(first.max_odds, None);

        let second = &summary.matches[1];
        assert_eq!(second.home_result, 3);
        assert_eq!(second.odds.unwrap().away, 10.5);
        assert_eq!(second.max_odds.unwrap().draw, 6.0);
    }

    #[test]
    fn rows_with_missing_fields_are_reported() {
        let raw = r#"{"d":{"rows":[
            {"home-name":"A","away-name":"B","result":"1:0","homeResult":1,"awayResult":0,"odds":[]},
            {"home-name":"C","away-name":"D","homeResult":1,"awayResult":0}
        ]}}"#;
        let mut summary = IngestSummary::default();
        ingest_results_page(raw, &mut summary).unwrap();
        assert!(summary.matches.is_empty());
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("A vs B"));
    }

    #[test]
    fn page_without_rows_is_an_error() {
        let mut summary = IngestSummary::default();
        assert!(ingest_results_page(r#"{"d":{}}"#, &mut summary).is_err());
        assert!(ingest_results_page("not json", &mut summary).is_err());
    }
}
