use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rust_xlsxwriter::{Chart, ChartType, Workbook, Worksheet};

use crate::trace::MatchTraceRow;

/// Matches plotted by default: the second half of a 380-match season.
pub const DEFAULT_LAST_MATCHES: usize = 180;

const DATA_SHEET: &str = "Points";

/// (P_elo, P_bookies) pairs split by side and result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScatterPoints {
    pub home_win: Vec<(f64, f64)>,
    pub home_loss: Vec<(f64, f64)>,
    pub away_win: Vec<(f64, f64)>,
    pub away_loss: Vec<(f64, f64)>,
}

impl ScatterPoints {
    fn series(&self) -> [(&'static str, &'static str, &[(f64, f64)]); 4] {
        [
            ("Home", "Win", self.home_win.as_slice()),
            ("Home", "Loss", self.home_loss.as_slice()),
            ("Away", "Win", self.away_win.as_slice()),
            ("Away", "Loss", self.away_loss.as_slice()),
        ]
    }

    pub fn len(&self) -> usize {
        self.home_win.len() + self.home_loss.len() + self.away_win.len() + self.away_loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
}

/// Builds the comparison points from the last `last_n` trace rows. A draw is
/// grouped with away wins.
pub fn scatter_points(rows: &[MatchTraceRow], last_n: usize) -> ScatterPoints {
    let start = rows.len().saturating_sub(last_n);
    let mut out = ScatterPoints::default();
    for r in &rows[start..] {
        if r.home_result > r.away_result {
            out.home_win
                .push((r.home_win_elo_bookies_draw_odds, r.home_win_odds));
            out.away_loss.push((
                1.0 - r.home_win_elo_bookies_draw_odds - r.draw_elo_bookies_draw_odds,
                r.away_win_odds,
            ));
        } else {
            out.away_win
                .push((r.away_win_elo_bookies_draw_odds, r.away_win_odds));
            out.home_loss.push((
                1.0 - r.away_win_elo_bookies_draw_odds - r.draw_elo_bookies_draw_odds,
                r.home_win_odds,
            ));
        }
    }
    out
}

/// Ordinary least squares of y on x.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in points {
        sxx += (x - mean_x).powi(2);
        syy += (y - mean_y).powi(2);
        sxy += (x - mean_x) * (y - mean_y);
    }
    if sxx <= f64::EPSILON {
        return None;
    }
    let slope = sxy / sxx;
    let r = if syy <= f64::EPSILON {
        0.0
    } else {
        sxy / (sxx * syy).sqrt()
    };
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
        r,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScatterReport {
    pub points: usize,
    pub charts: usize,
}

/// Writes the points, their fits and one scatter chart per non-empty series.
pub fn write_scatter_workbook(
    path: &Path,
    title: &str,
    points: &ScatterPoints,
) -> Result<ScatterReport> {
    if points.is_empty() {
        return Err(anyhow!("no scatter points to plot"));
    }

    let mut workbook = Workbook::new();
    let series = points.series();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(DATA_SHEET)?;
        for (idx, (side, result, pts)) in series.iter().enumerate() {
            let col = (idx * 2) as u16;
            write_header(sheet, col, &format!("{side} {result} P_elo"))?;
            write_header(sheet, col + 1, &format!("{side} {result} P_bookies"))?;
            for (row, (x, y)) in pts.iter().enumerate() {
                let row = row as u32 + 1;
                sheet
                    .write_number(row, col, *x)
                    .with_context(|| format!("write cell ({row},{col})"))?;
                sheet
                    .write_number(row, col + 1, *y)
                    .with_context(|| format!("write cell ({row},{})", col + 1))?;
            }
        }
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Fit")?;
        for (col, label) in ["Series", "Points", "Slope", "Intercept", "r"]
            .iter()
            .enumerate()
        {
            write_header(sheet, col as u16, label)?;
        }
        for (idx, (side, result, pts)) in series.iter().enumerate() {
            let row = idx as u32 + 1;
            sheet.write_string(row, 0, format!("{side} {result}"))?;
            sheet.write_number(row, 1, pts.len() as f64)?;
            if let Some(fit) = linear_fit(pts) {
                sheet.write_number(row, 2, fit.slope)?;
                sheet.write_number(row, 3, fit.intercept)?;
                sheet.write_number(row, 4, fit.r)?;
            }
        }
    }

    let mut charts = 0usize;
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Charts")?;
        sheet.write_string(0, 0, format!("{title} Premier League"))?;
        for (idx, (side, result, pts)) in series.iter().enumerate() {
            if pts.is_empty() {
                continue;
            }
            let col = (idx * 2) as u16;
            let last = pts.len() as u32;
            let mut chart = Chart::new(ChartType::Scatter);
            chart
                .add_series()
                .set_name(*result)
                .set_categories((DATA_SHEET, 1, col, last, col))
                .set_values((DATA_SHEET, 1, col + 1, last, col + 1));
            let chart_title = format!("{side} {result}");
            chart.title().set_name(chart_title.as_str());
            chart.x_axis().set_name("P_elo");
            chart.y_axis().set_name("P_bookies");

            // 2x2 grid: home on the top row, wins on the left.
            let grid_row = (idx / 2) as u32 * 16 + 2;
            let grid_col = (idx % 2) as u16 * 8;
            sheet
                .insert_chart(grid_row, grid_col, &chart)
                .with_context(|| format!("insert {side} {result} chart"))?;
            charts += 1;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ScatterReport {
        points: points.len(),
        charts,
    })
}

fn write_header(worksheet: &mut Worksheet, col: u16, value: &str) -> Result<()> {
    worksheet
        .write_string(0, col, value)
        .with_context(|| format!("write header ({col})"))?;
    Ok(())
}
