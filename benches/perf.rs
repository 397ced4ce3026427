use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use elo_bookies::ingest::{IngestSummary, ingest_results_page};
use elo_bookies::{
    BookmakerOdds, EloConfig, MatchRecord, RatingSnapshot, StopAfter, run_match_trace, run_season,
    weekly_snapshots,
};

/// A 20-team double round robin: 38 weeks of 10 fixtures.
fn full_season() -> Vec<MatchRecord> {
    let teams = (0..20).map(|i| format!("Team {i:02}")).collect::<Vec<_>>();
    let mut out = Vec::with_capacity(380);
    let mut ts = 1_565_380_800i64;
    for round in 0..38 {
        for slot in 0..10 {
            let a = (round + slot) % 20;
            let b = (round + 19 - slot) % 20;
            let (home, away) = if round % 2 == 0 { (a, b) } else { (b, a) };
            out.push(
                MatchRecord::new(
                    &teams[home],
                    &teams[away],
                    ((round * 3 + slot) % 4) as u32,
                    ((round + slot * 5) % 3) as u32,
                )
                .with_odds(BookmakerOdds::decimal(2.1, 3.4, 3.6))
                .with_timestamp(ts),
            );
            ts += 3_600;
        }
    }
    out
}

fn bench_season_fold(c: &mut Criterion) {
    let matches = full_season();
    let cfg = EloConfig::default();
    let initial = RatingSnapshot::default();
    c.bench_function("season_fold", |b| {
        b.iter(|| {
            let snap = run_season(black_box(&matches), &initial, None, &cfg).unwrap();
            black_box(snap.len());
        })
    });
    c.bench_function("season_fold_week_19", |b| {
        b.iter(|| {
            let snap =
                run_season(black_box(&matches), &initial, Some(StopAfter::Weeks(19)), &cfg)
                    .unwrap();
            black_box(snap.len());
        })
    });
}

fn bench_weekly_snapshots(c: &mut Criterion) {
    let matches = full_season();
    let cfg = EloConfig::default();
    let initial = RatingSnapshot::default();
    c.bench_function("weekly_snapshots", |b| {
        b.iter(|| {
            let weeks = weekly_snapshots(black_box(&matches), &initial, &cfg).unwrap();
            black_box(weeks.len());
        })
    });
}

fn bench_match_trace(c: &mut Criterion) {
    let matches = full_season();
    let cfg = EloConfig::default();
    let initial = RatingSnapshot::default();
    c.bench_function("match_trace", |b| {
        b.iter(|| {
            let rows = run_match_trace(black_box(&matches), &initial, &cfg).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_results_page_parse(c: &mut Criterion) {
    c.bench_function("results_page_parse", |b| {
        b.iter(|| {
            let mut summary = IngestSummary::default();
            ingest_results_page(black_box(RESULTS_JSON), &mut summary).unwrap();
            black_box(summary.matches.len());
        })
    });
}

criterion_group!(
    perf,
    bench_season_fold,
    bench_weekly_snapshots,
    bench_match_trace,
    bench_results_page_parse
);
criterion_main!(perf);

static RESULTS_JSON: &str = include_str!("../tests/fixtures/results/page_01.json");
