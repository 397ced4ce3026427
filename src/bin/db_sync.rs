use anyhow::{Context, Result};

use elo_bookies::config::AppConfig;
use elo_bookies::elo::RatingSnapshot;
use elo_bookies::season::run_season;
use elo_bookies::trace::run_match_trace_with;
use elo_bookies::{cli, csv_io, db, logging};

const SNAPSHOT_LABEL: &str = "full-season";

fn main() -> Result<()> {
    let cfg = AppConfig::load();
    logging::init(&cfg)?;

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let input = cli::required_path(&args, "--csv")?;
    let season = cli::flag_value(&args, "--season").context("missing required flag --season")?;
    let db_path = cli::path_flag(&args, "--db")
        .or_else(|| cfg.db_path.clone())
        .context("unable to resolve sqlite path")?;

    let matches = csv_io::read_matches(&input, cfg.odds_convention)?;

    // Everything is computed before the db is opened for writing.
    let initial = RatingSnapshot::default();
    let full = run_season(&matches, &initial, None, &cfg.elo)
        .with_context(|| format!("rating season {season}"))?;
    let rows = run_match_trace_with(
        &matches,
        &initial,
        &cfg.elo,
        cfg.trace_policy,
        logging::log_trace_event,
    )
    .with_context(|| format!("tracing season {season}"))?;

    let mut conn = db::open_db(&db_path)?;
    let written = db::save_season(&mut conn, &season, &matches, SNAPSHOT_LABEL, &full, &rows)?;
    let stored_trace = db::count_trace_rows(&conn, &season)?;

    println!("Season {season} stored");
    println!("DB: {}", db_path.display());
    println!("Matches: {}", written.matches);
    println!("Teams rated: {}", written.ratings);
    println!("Trace rows: {} (stored {stored_trace})", written.trace_rows);
    for (pos, e) in full.ranked().iter().take(5).enumerate() {
        println!("{:>2}. {:<24} {:.1}", pos + 1, e.team, e.rating);
    }
    Ok(())
}
