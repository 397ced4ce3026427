use anyhow::Result;

use elo_bookies::config::AppConfig;
use elo_bookies::scatter::{linear_fit, scatter_points, write_scatter_workbook};
use elo_bookies::{cli, csv_io, logging};

fn main() -> Result<()> {
    let cfg = AppConfig::load();
    logging::init(&cfg)?;

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let trace_path = cli::required_path(&args, "--trace")?;
    let output = cli::required_path(&args, "--out")?;
    let title = cli::flag_value(&args, "--title").unwrap_or_else(|| "Season".to_string());
    let last_n = cli::usize_flag(&args, "--last")?.unwrap_or(cfg.scatter_last_matches);

    let rows = csv_io::read_trace(&trace_path)?;
    let points = scatter_points(&rows, last_n);
    let report = write_scatter_workbook(&output, &title, &points)?;

    tracing::info!(
        "Elo vs bookies probabilities scatter graph has been created saved to {}",
        output.display()
    );
    println!("Points: {} Charts: {}", report.points, report.charts);
    for (label, pts) in [
        ("home win", &points.home_win),
        ("home loss", &points.home_loss),
        ("away win", &points.away_win),
        ("away loss", &points.away_loss),
    ] {
        match linear_fit(pts) {
            Some(fit) => println!(
                "{label}: n={} slope={:.3} intercept={:.3} r={:.3}",
                pts.len(),
                fit.slope,
                fit.intercept,
                fit.r
            ),
            None => println!("{label}: n={} (no fit)", pts.len()),
        }
    }
    Ok(())
}
