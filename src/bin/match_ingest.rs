use anyhow::{Result, anyhow};

use elo_bookies::config::AppConfig;
use elo_bookies::{cli, csv_io, ingest, logging};

fn main() -> Result<()> {
    let cfg = AppConfig::load();
    logging::init(&cfg)?;

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let json_dir = cli::required_path(&args, "--json-dir")?;
    let output = cli::required_path(&args, "--out")?;

    let summary = ingest::ingest_results_dir(&json_dir)?;
    for err in &summary.errors {
        tracing::error!("{err}");
    }
    if summary.matches.is_empty() {
        return Err(anyhow!("no results to save to {}", output.display()));
    }
    csv_io::write_matches(&output, &summary.matches)?;

    println!("Results ingest complete");
    println!("Files read: {}", summary.files_read);
    println!("Rows seen: {}", summary.rows_seen);
    println!("Postponed: {}", summary.postponed);
    println!("Matches written: {}", summary.matches.len());
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(8) {
            println!(" - {err}");
        }
    }
    Ok(())
}
