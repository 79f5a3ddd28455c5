//! corridor — end-to-end demo of the rust_noise pipeline.
//!
//! A 2 km arterial with residents living along it and commuting to a
//! business park at its east end, plus through traffic and freight.  Runs a
//! few outer iterations (each day's departure times are redrawn, as a
//! replanning engine would) and writes receiver, emission, immission and
//! summary tables to `output/corridor/`.
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

mod network;
mod scenario;

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use nz_activity::load_weights_reader;
use nz_core::{NoiseConfig, ScenarioRng};
use nz_events::{CostCollector, CostFlow, Party};
use nz_output::{CsvWriter, StatsObserver};
use nz_pipeline::PipelineBuilder;

use network::build_network;
use scenario::Population;

// ── Constants ─────────────────────────────────────────────────────────────────

const PERSONS:    u32 = 200;
const ITERATIONS: u32 = 3;
const OUT_DIR:    &str = "output/corridor";

// ── Configuration ─────────────────────────────────────────────────────────────

// 30 h horizon so late trips still fall into a bin.  Attenuation follows the
// usual free-field road-traffic curve; valuation uses day/evening/night
// thresholds.
const CONFIG_TOML: &str = r#"
[time]
bin_width_secs = 3600
horizon_secs   = 108000

[grid]
receiver_gap_m   = 100.0
hearing_radius_m = 300.0
bounds           = [0.0, -150.0, 2000.0, 150.0]

[emission]
silence_floor_db = 0.0
scale_factor     = 10.0

[attenuation]
reference_db       = 15.8
log_coefficient    = 10.0
linear_coefficient = 0.0142
linear_exponent    = 0.9
min_distance_m     = 5.0
angle_correction   = true

[damage]
audibility_threshold_db = 0.0
annual_cost_rate        = 63.3
loudness_doubling_db    = 10.0
periods = [
  { name = "day",     start_hour = 6,  end_hour = 18, threshold_db = 50.0 },
  { name = "evening", start_hour = 18, end_hour = 22, threshold_db = 45.0 },
  { name = "night",   start_hour = 22, end_hour = 6,  threshold_db = 40.0 },
]

[activity]
considered = ["home"]
weights    = { home = 1.0 }

[run]
seed = 42
"#;

// Overrides `[activity]`: workers are exposed at the business park too.
const WEIGHTS_CSV: &str = "\
activity_type,weight\n\
home,1.0\n\
work,0.5\n\
";

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== corridor — rust_noise pipeline ===");

    // 1. Configuration and inputs.
    let config = NoiseConfig::from_toml_str(CONFIG_TOML)?;
    let weights = load_weights_reader(Cursor::new(WEIGHTS_CSV))?;
    let network = build_network()?;
    let rng = ScenarioRng::new(config.run.seed);
    let population = Population::generate(&mut rng.child(0), PERSONS);
    println!(
        "Network: {} links  |  Residents: {}  |  Iterations: {ITERATIONS}  |  Seed: {}",
        network.link_count(),
        population.len(),
        config.run.seed,
    );

    // 2. Pipeline.
    let mut pipeline = PipelineBuilder::new(config, network, population.locations.clone())
        .activity_weights(weights)
        .build()?;

    std::fs::create_dir_all(OUT_DIR)?;
    let mut obs = StatsObserver::new(CsvWriter::new(Path::new(OUT_DIR))?);
    pipeline.startup(&mut obs)?;
    if let Some(grid) = pipeline.grid() {
        let isolated = grid.receivers().iter().filter(|r| r.is_isolated()).count();
        println!("Receivers: {} ({isolated} out of hearing range)", grid.len());
    }
    println!();

    // 3. Iterations.
    println!(
        "{:<5} {:>9} {:>9} {:>8} {:>12} {:>12} {:>9}",
        "Iter", "Vehicles", "Activity", "Skipped", "Damage", "Caused", "Time(ms)"
    );
    println!("{}", "-".repeat(70));

    let mut last = CostCollector::new();
    for iteration in 0..ITERATIONS {
        let events = population.day_events(&mut rng.child(iteration as u64 + 1));
        tracing::debug!(iteration, events = events.len(), "generated day");
        let mut sink = CostCollector::new();

        let t0 = Instant::now();
        let summary = pipeline.run_iteration(iteration, &events, &mut sink, &mut obs)?;
        let elapsed = t0.elapsed();

        println!(
            "{:<5} {:>9} {:>9} {:>8} {:>12.4} {:>12.4} {:>9.1}",
            summary.iteration,
            summary.vehicle_events,
            summary.activity_events,
            summary.skipped_events,
            summary.totals.total_damage,
            summary.totals.caused_total,
            elapsed.as_secs_f64() * 1_000.0,
        );
        last = sink;
    }

    obs.finish();
    if let Some(e) = obs.take_error() {
        tracing::error!(error = %e, "output error");
    }

    // 4. Who pays, who suffers (last iteration).
    println!();
    print_top("Top caused cost (vehicles)", &last, CostFlow::Caused);
    print_top("Top affected cost (persons)", &last, CostFlow::Affected);
    println!();
    println!("Tables written to {OUT_DIR}/");

    Ok(())
}

fn print_top(title: &str, sink: &CostCollector, flow: CostFlow) {
    let mut per_party: BTreeMap<Party, f64> = BTreeMap::new();
    for e in sink.flow(flow) {
        *per_party.entry(e.party).or_insert(0.0) += e.amount;
    }
    let mut ranked: Vec<(Party, f64)> = per_party.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    println!("{title}");
    for (party, amount) in ranked.iter().take(5) {
        let label = match party {
            Party::Vehicle(v) => v.to_string(),
            Party::Person(p) => p.to_string(),
        };
        println!("  {label:<20} {amount:>10.5}");
    }
}
