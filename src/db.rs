use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, Transaction, params};

use crate::elo::{RatingSnapshot, TeamRating};
use crate::match_record::{BookmakerOdds, MatchRecord};
use crate::trace::MatchTraceRow;

const DATA_DIR: &str = "elo_bookies";
const DB_FILE: &str = "elo_bookies.sqlite";

pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_DATA_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(DATA_DIR).join(DB_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR)
            .join(DB_FILE),
    )
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            season TEXT NOT NULL,
            seq INTEGER NOT NULL,
            home_name TEXT NOT NULL,
            away_name TEXT NOT NULL,
            home_result INTEGER NOT NULL,
            away_result INTEGER NOT NULL,
            home_odds_avg REAL NULL,
            draw_odds_avg REAL NULL,
            away_odds_avg REAL NULL,
            home_odds_max REAL NULL,
            draw_odds_max REAL NULL,
            away_odds_max REAL NULL,
            date_start_timestamp INTEGER NULL,
            PRIMARY KEY (season, seq)
        );

        CREATE TABLE IF NOT EXISTS rating_snapshots (
            season TEXT NOT NULL,
            label TEXT NOT NULL,
            pos INTEGER NOT NULL,
            team TEXT NOT NULL,
            rating REAL NOT NULL,
            saved_at TEXT NOT NULL,
            PRIMARY KEY (season, label, team)
        );

        CREATE TABLE IF NOT EXISTS match_trace (
            season TEXT NOT NULL,
            seq INTEGER NOT NULL,
            home_name TEXT NOT NULL,
            away_name TEXT NOT NULL,
            home_elo REAL NOT NULL,
            away_elo REAL NOT NULL,
            home_win_odds REAL NOT NULL,
            draw_odds REAL NOT NULL,
            away_win_odds REAL NOT NULL,
            home_result INTEGER NOT NULL,
            away_result INTEGER NOT NULL,
            match_date TEXT NOT NULL,
            epoch_time INTEGER NOT NULL,
            home_win_elo REAL NOT NULL,
            draw_elo REAL NOT NULL,
            away_win_elo REAL NOT NULL,
            home_win_elo_bookies_draw_odds REAL NOT NULL,
            away_win_elo_bookies_draw_odds REAL NOT NULL,
            draw_elo_bookies_draw_odds REAL NOT NULL,
            bookies_margin REAL NOT NULL,
            PRIMARY KEY (season, seq)
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Replaces every stored match of `season` with `matches`, keeping their order.
pub fn replace_season_matches(
    conn: &mut Connection,
    season: &str,
    matches: &[MatchRecord],
) -> Result<usize> {
    let tx = conn.transaction().context("begin matches transaction")?;
    let n = replace_season_matches_tx(&tx, season, matches)?;
    tx.commit().context("commit matches transaction")?;
    Ok(n)
}

pub fn replace_season_matches_tx(
    tx: &Transaction<'_>,
    season: &str,
    matches: &[MatchRecord],
) -> Result<usize> {
    tx.execute("DELETE FROM matches WHERE season = ?1", params![season])
        .context("clear season matches")?;
    for (seq, m) in matches.iter().enumerate() {
        let avg = m.odds;
        let max = m.max_odds;
        tx.execute(
            r#"
            INSERT INTO matches (
                season, seq, home_name, away_name, home_result, away_result,
                home_odds_avg, draw_odds_avg, away_odds_avg,
                home_odds_max, draw_odds_max, away_odds_max,
                date_start_timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                season,
                seq as i64,
                m.home_name,
                m.away_name,
                m.home_result,
                m.away_result,
                avg.map(|o| o.home),
                avg.map(|o| o.draw),
                avg.map(|o| o.away),
                max.map(|o| o.home),
                max.map(|o| o.draw),
                max.map(|o| o.away),
                m.date_start_timestamp,
            ],
        )
        .context("insert match")?;
    }
    Ok(matches.len())
}

pub fn load_season_matches(conn: &Connection, season: &str) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                home_name, away_name, home_result, away_result,
                home_odds_avg, draw_odds_avg, away_odds_avg,
                home_odds_max, draw_odds_max, away_odds_max,
                date_start_timestamp
            FROM matches
            WHERE season = ?1
            ORDER BY seq ASC
            "#,
        )
        .context("prepare load matches query")?;

    let rows = stmt
        .query_map(params![season], |row| {
            let triplet = |a: Option<f64>, b: Option<f64>, c: Option<f64>| {
                Some(BookmakerOdds::decimal(a?, b?, c?))
            };
            Ok(MatchRecord {
                home_name: row.get(0)?,
                away_name: row.get(1)?,
                home_result: row.get(2)?,
                away_result: row.get(3)?,
                odds: triplet(row.get(4)?, row.get(5)?, row.get(6)?),
                max_odds: triplet(row.get(7)?, row.get(8)?, row.get(9)?),
                date_start_timestamp: row.get(10)?,
            })
        })
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode match row")?);
    }
    Ok(out)
}

pub fn save_snapshot(
    conn: &mut Connection,
    season: &str,
    label: &str,
    snapshot: &RatingSnapshot,
) -> Result<()> {
    let tx = conn.transaction().context("begin snapshot transaction")?;
    save_snapshot_tx(&tx, season, label, snapshot)?;
    tx.commit().context("commit snapshot transaction")?;
    Ok(())
}

pub fn save_snapshot_tx(
    tx: &Transaction<'_>,
    season: &str,
    label: &str,
    snapshot: &RatingSnapshot,
) -> Result<()> {
    let saved_at = Utc::now().to_rfc3339();
    tx.execute(
        "DELETE FROM rating_snapshots WHERE season = ?1 AND label = ?2",
        params![season, label],
    )
    .context("clear snapshot")?;
    for (pos, e) in snapshot.entries().iter().enumerate() {
        tx.execute(
            "INSERT INTO rating_snapshots(season, label, pos, team, rating, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![season, label, pos as i64, e.team, e.rating, saved_at],
        )
        .context("insert snapshot rating")?;
    }
    Ok(())
}

pub fn load_snapshot(conn: &Connection, season: &str, label: &str) -> Result<RatingSnapshot> {
    let mut stmt = conn
        .prepare(
            "SELECT team, rating FROM rating_snapshots
             WHERE season = ?1 AND label = ?2
             ORDER BY pos ASC",
        )
        .context("prepare load snapshot query")?;
    let rows = stmt
        .query_map(params![season, label], |row| {
            Ok(TeamRating {
                team: row.get(0)?,
                rating: row.get(1)?,
            })
        })
        .context("query load snapshot")?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.context("decode snapshot row")?);
    }
    Ok(RatingSnapshot::from_entries(entries))
}

pub fn save_trace(conn: &mut Connection, season: &str, rows: &[MatchTraceRow]) -> Result<usize> {
    let tx = conn.transaction().context("begin trace transaction")?;
    let n = save_trace_tx(&tx, season, rows)?;
    tx.commit().context("commit trace transaction")?;
    Ok(n)
}

pub fn save_trace_tx(tx: &Transaction<'_>, season: &str, rows: &[MatchTraceRow]) -> Result<usize> {
    tx.execute("DELETE FROM match_trace WHERE season = ?1", params![season])
        .context("clear season trace")?;
    for (seq, r) in rows.iter().enumerate() {
        tx.execute(
            r#"
            INSERT INTO match_trace (
                season, seq, home_name, away_name, home_elo, away_elo,
                home_win_odds, draw_odds, away_win_odds, home_result, away_result,
                match_date, epoch_time, home_win_elo, draw_elo, away_win_elo,
                home_win_elo_bookies_draw_odds, away_win_elo_bookies_draw_odds,
                draw_elo_bookies_draw_odds, bookies_margin
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20
            )
            "#,
            params![
                season,
                seq as i64,
                r.home_name,
                r.away_name,
                r.home_elo,
                r.away_elo,
                r.home_win_odds,
                r.draw_odds,
                r.away_win_odds,
                r.home_result,
                r.away_result,
                r.match_date,
                r.epoch_time,
                r.home_win_elo,
                r.draw_elo,
                r.away_win_elo,
                r.home_win_elo_bookies_draw_odds,
                r.away_win_elo_bookies_draw_odds,
                r.draw_elo_bookies_draw_odds,
                r.bookies_margin,
            ],
        )
        .context("insert trace row")?;
    }
    Ok(rows.len())
}

/// Rows written by [`save_season`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonWrite {
    pub matches: usize,
    pub ratings: usize,
    pub trace_rows: usize,
}

/// Replaces a season's matches, one rating snapshot and its trace in a single
/// transaction. Nothing is kept if any write fails.
pub fn save_season(
    conn: &mut Connection,
    season: &str,
    matches: &[MatchRecord],
    label: &str,
    snapshot: &RatingSnapshot,
    rows: &[MatchTraceRow],
) -> Result<SeasonWrite> {
    let tx = conn.transaction().context("begin season transaction")?;
    let stored = replace_season_matches_tx(&tx, season, matches)?;
    save_snapshot_tx(&tx, season, label, snapshot)?;
    let trace_rows = save_trace_tx(&tx, season, rows)?;
    tx.commit().context("commit season transaction")?;
    Ok(SeasonWrite {
        matches: stored,
        ratings: snapshot.len(),
        trace_rows,
    })
}

pub fn count_trace_rows(conn: &Connection, season: &str) -> Result<usize> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM match_trace WHERE season = ?1",
            params![season],
            |row| row.get(0),
        )
        .context("count trace rows")?;
    Ok(n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn matches_round_trip_in_order() {
        let mut conn = memory_db();
        let matches = vec![
            MatchRecord::new("Liverpool", "Norwich", 4, 1)
                .with_odds(BookmakerOdds::decimal(1.14, 9.2, 19.0))
                .with_timestamp(1_565_380_800),
            MatchRecord::new("West Ham", "Man City", 0, 5),
        ];
        replace_season_matches(&mut conn, "19-20", &matches).unwrap();
        replace_season_matches(&mut conn, "19-20", &matches).unwrap();
        let loaded = load_season_matches(&conn, "19-20").unwrap();
        assert_eq!(loaded, matches);
        assert!(load_season_matches(&conn, "20-21").unwrap().is_empty());
    }

    #[test]
    fn snapshot_keeps_team_order() {
        let mut conn = memory_db();
        let snap = RatingSnapshot::from_entries(vec![
            TeamRating {
                team: "Norwich".to_string(),
                rating: 984.0,
            },
            TeamRating {
                team: "Liverpool".to_string(),
                rating: 1016.0,
            },
        ]);
        save_snapshot(&mut conn, "19-20", "week-1", &snap).unwrap();
        assert_eq!(load_snapshot(&conn, "19-20", "week-1").unwrap(), snap);
        assert!(load_snapshot(&conn, "19-20", "full").unwrap().is_empty());
    }

    #[test]
    fn trace_rows_replace_per_season() {
        let mut conn = memory_db();
        let matches = vec![
            MatchRecord::new("Liverpool", "Norwich", 4, 1)
                .with_odds(BookmakerOdds::decimal(1.14, 9.2, 19.0))
                .with_timestamp(1_565_380_800),
        ];
        let rows = crate::trace::run_match_trace(
            &matches,
            &RatingSnapshot::default(),
            &crate::elo::EloConfig::default(),
        )
        .unwrap();
        assert_eq!(save_trace(&mut conn, "19-20", &rows).unwrap(), 1);
        assert_eq!(save_trace(&mut conn, "19-20", &rows).unwrap(), 1);
        assert_eq!(count_trace_rows(&conn, "19-20").unwrap(), 1);
        assert_eq!(count_trace_rows(&conn, "20-21").unwrap(), 0);
    }

    fn priced_season() -> Vec<MatchRecord> {
        vec![
            MatchRecord::new("Liverpool", "Norwich", 4, 1)
                .with_odds(BookmakerOdds::decimal(1.14, 9.2, 19.0))
                .with_timestamp(1_565_380_800),
            MatchRecord::new("West Ham", "Man City", 0, 5)
                .with_odds(BookmakerOdds::decimal(12.0, 6.5, 1.25))
                .with_timestamp(1_565_451_000),
        ]
    }

    #[test]
    fn season_is_written_in_one_transaction() {
        let mut conn = memory_db();
        let matches = priced_season();
        let cfg = crate::elo::EloConfig::default();
        let snap = crate::season::run_season(&matches, &RatingSnapshot::default(), None, &cfg)
            .unwrap();
        let rows =
            crate::trace::run_match_trace(&matches, &RatingSnapshot::default(), &cfg).unwrap();

        let written = save_season(&mut conn, "19-20", &matches, "full", &snap, &rows).unwrap();
        assert_eq!(
            written,
            SeasonWrite {
                matches: 2,
                ratings: 4,
                trace_rows: 2
            }
        );
        assert_eq!(load_season_matches(&conn, "19-20").unwrap(), matches);
        assert_eq!(load_snapshot(&conn, "19-20", "full").unwrap(), snap);
        assert_eq!(count_trace_rows(&conn, "19-20").unwrap(), 2);
    }

    #[test]
    fn failed_season_write_keeps_nothing() {
        let mut conn = memory_db();
        let matches = priced_season();
        let cfg = crate::elo::EloConfig::default();
        let snap = crate::season::run_season(&matches, &RatingSnapshot::default(), None, &cfg)
            .unwrap();
        let rows =
            crate::trace::run_match_trace(&matches, &RatingSnapshot::default(), &cfg).unwrap();
        conn.execute_batch("DROP TABLE match_trace").unwrap();

        assert!(save_season(&mut conn, "19-20", &matches, "full", &snap, &rows).is_err());
        assert!(load_season_matches(&conn, "19-20").unwrap().is_empty());
        assert!(load_snapshot(&conn, "19-20", "full").unwrap().is_empty());
    }
}
