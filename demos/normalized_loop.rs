//! Time a reduction over growing inputs and report the cost per element.
//!
//! ```text
//! RUST_LOG=perfnorm=debug PERFNORM_VERBOSE=2 cargo run --example normalized_loop
//! ```

use perfnorm::measurement::black_box;
use perfnorm::output::{format_report, to_json_pretty};
use perfnorm::Session;
use tracing_subscriber::EnvFilter;

fn sum_of_squares(data: &[f64]) -> f64 {
    data.iter().map(|x| x * x).sum()
}

fn main() -> perfnorm::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut session = Session::with_defaults()?;

    let outer = session.start("sweep");
    for exp in 10..=20 {
        let n = 1usize << exp;
        let data: Vec<f64> = (0..n).map(|i| i as f64 * 0.5).collect();
        let total = session.measure("sum_of_squares", n as u64, || {
            sum_of_squares(black_box(&data))
        })?;
        tracing::info!(n, total, "reduced");
    }
    session.stop(outer)?;

    // Phase-by-phase printing: each phase closes, prints, and hands over
    // to the next one.
    let n = 1usize << 16;
    let mut phase = session.start("init time");
    phase.store(n as u64)?;
    let data: Vec<f64> = (0..n).map(|i| (i as f64).sqrt()).collect();
    let (done, mut phase) = session.restart(phase, "compute time")?;
    println!("{done}");
    phase.store((n * 8) as u64)?;
    let mut total = 0.0;
    for _ in 0..8 {
        total += sum_of_squares(black_box(&data));
    }
    println!("{}", session.stop(phase)?);
    tracing::info!(total, "phases done");

    let report = session.report();
    print!("{}", format_report(&report, session.config()));

    if std::env::args().any(|a| a == "--json") {
        println!("{}", to_json_pretty(&report)?);
    }
    Ok(())
}
