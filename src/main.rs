use anyhow::{Context, Result, anyhow};

use elo_bookies::config::AppConfig;
use elo_bookies::elo::RatingSnapshot;
use elo_bookies::season::{StopAfter, run_season, weekly_snapshots};
use elo_bookies::trace::{FailurePolicy, run_match_trace_with};
use elo_bookies::{cli, csv_io, logging};

const USAGE: &str = "usage:
  elo_bookies season --csv IN.csv --out OUT.csv [--weeks N] [--initial RATINGS.csv]
  elo_bookies weeks  --csv IN.csv --out-dir DIR
  elo_bookies trace  --csv IN.csv --out OUT.csv [--skip-bad-rows]";

fn main() {
    let cfg = AppConfig::load();
    if let Err(err) = logging::init(&cfg) {
        eprintln!("error: {err:#}");
    }
    if let Err(err) = run(&cfg) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cfg: &AppConfig) -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(command) = args.first() else {
        return Err(anyhow!("{USAGE}"));
    };
    match command.as_str() {
        "season" => season(cfg, &args),
        "weeks" => weeks(cfg, &args),
        "trace" => trace(cfg, &args),
        other => Err(anyhow!("unknown command {other:?}\n{USAGE}")),
    }
}

fn load_initial(args: &[String]) -> Result<RatingSnapshot> {
    match cli::path_flag(args, "--initial") {
        Some(path) => csv_io::read_snapshot(&path),
        None => Ok(RatingSnapshot::default()),
    }
}

fn season(cfg: &AppConfig, args: &[String]) -> Result<()> {
    let input = cli::required_path(args, "--csv")?;
    let output = cli::required_path(args, "--out")?;
    let stop_after = cli::usize_flag(args, "--weeks")?.map(StopAfter::Weeks);

    let matches = csv_io::read_matches(&input, cfg.odds_convention)?;
    let initial = load_initial(args)?;
    let ratings = run_season(&matches, &initial, stop_after, &cfg.elo)
        .with_context(|| format!("rating {}", input.display()))?;
    csv_io::write_snapshot(&output, &ratings)?;

    let label = match stop_after {
        Some(StopAfter::Weeks(w)) => format!("week {w}"),
        Some(StopAfter::Matches(n)) => format!("{n} matches"),
        None => "the full season".to_string(),
    };
    tracing::info!(
        "Elo ratings for {label} have been calculated and saved to {}",
        output.display()
    );
    Ok(())
}

fn weeks(cfg: &AppConfig, args: &[String]) -> Result<()> {
    let input = cli::required_path(args, "--csv")?;
    let out_dir = cli::required_path(args, "--out-dir")?;
    if !out_dir.is_dir() {
        return Err(anyhow!("output directory {} does not exist", out_dir.display()));
    }

    let matches = csv_io::read_matches(&input, cfg.odds_convention)?;
    let initial = load_initial(args)?;
    let snapshots = weekly_snapshots(&matches, &initial, &cfg.elo)
        .with_context(|| format!("rating {}", input.display()))?;
    for snap in &snapshots {
        let path = out_dir.join(format!("week-{}.csv", snap.week));
        csv_io::write_snapshot(&path, &snap.ratings)?;
    }
    tracing::info!(
        weeks = snapshots.len().saturating_sub(1),
        "Elo ratings for the season have been calculated and saved to {}",
        out_dir.display()
    );
    Ok(())
}

fn trace(cfg: &AppConfig, args: &[String]) -> Result<()> {
    let input = cli::required_path(args, "--csv")?;
    let output = cli::required_path(args, "--out")?;
    let policy = if cli::has_flag(args, "--skip-bad-rows") {
        FailurePolicy::Skip
    } else {
        cfg.trace_policy
    };

    let matches = csv_io::read_matches(&input, cfg.odds_convention)?;
    let initial = load_initial(args)?;
    let rows = run_match_trace_with(&matches, &initial, &cfg.elo, policy, logging::log_trace_event)
        .with_context(|| format!("tracing {}", input.display()))?;
    csv_io::write_trace(&output, &rows)?;
    tracing::info!(
        "Elo ratings for matches in the season have been calculated and saved to {}",
        output.display()
    );
    Ok(())
}
