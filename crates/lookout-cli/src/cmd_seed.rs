//! Synthetic demo history. Offline only: reads the registry, writes the
//! history file, never talks to the network or the tracker.

use std::path::Path;

use anyhow::Context;
use lookout_core::clock::format_timestamp;
use lookout_core::{LookoutPaths, MonitorDescriptor, Registry, StatusSample};
use lookout_store::HistoryStore;
use rand::{Rng, SeedableRng};
use time::OffsetDateTime;

/// Chance that a generated sample is `down`.
const DOWN_PROBABILITY: f64 = 0.001;

/// Upper bound on generated samples, about ten years of hourly data for 100 monitors.
const MAX_SAMPLES: u64 = 10_000_000;

pub fn execute(
    root: &Path,
    days: u32,
    interval_minutes: u32,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    anyhow::ensure!(interval_minutes > 0, "--interval-minutes must be positive");
    let paths = LookoutPaths::discover(root);
    let registry = Registry::load(&paths.registry)?;
    let planned = step_count(days, interval_minutes) * registry.len() as u64;
    anyhow::ensure!(
        planned <= MAX_SAMPLES,
        "too many samples ({planned} > {MAX_SAMPLES}), lower --days or raise --interval-minutes"
    );

    let mut rng = match seed {
        Some(s) => rand::rngs::StdRng::seed_from_u64(s),
        None => rand::rngs::StdRng::from_entropy(),
    };
    let samples = generate(
        registry.monitors(),
        OffsetDateTime::now_utc(),
        days,
        interval_minutes,
        &mut rng,
    );

    let store = HistoryStore::new(&paths.history, usize::MAX);
    store
        .persist(&samples)
        .with_context(|| format!("seeding {}", paths.history.display()))?;
    println!(
        "Generated {} data points in {}",
        samples.len(),
        paths.history.display()
    );
    Ok(())
}

/// One sample per monitor per step, oldest step first, ending just before `end`.
pub fn generate<R: Rng>(
    monitors: &[MonitorDescriptor],
    end: OffsetDateTime,
    days: u32,
    interval_minutes: u32,
    rng: &mut R,
) -> Vec<StatusSample> {
    let interval = i64::from(interval_minutes.max(1));
    let steps = step_count(days, interval_minutes);
    let mut samples = Vec::new();

    for i in 0..steps {
        let back = time::Duration::minutes((steps - i) as i64 * interval);
        let timestamp = format_timestamp(end - back);
        for m in monitors {
            if rng.gen_bool(DOWN_PROBABILITY) {
                samples.push(StatusSample::down(&m.id, &timestamp));
            } else {
                samples.push(StatusSample::up(&m.id, &timestamp, rng.gen_range(20..150)));
            }
        }
    }
    samples
}

fn step_count(days: u32, interval_minutes: u32) -> u64 {
    u64::from(days) * 24 * 60 / u64::from(interval_minutes.max(1))
}
