//! Layout acceptance statistics
//!
//! Samples many independent task layouts and counts how often the sampler
//! gives up. A healthy task configuration stays at or below
//! [`MAX_FAILURE_RATE`].

use anyhow::Result;
use indicatif::ProgressBar;
use rayon::prelude::*;

use safegym_core::placement::{PlacementSampler, SamplerConfig};
use safegym_core::rng::{derive_seed, episode_rng};
use safegym_core::tasks::Task;

use super::runner::progress_style;

/// Highest acceptable share of failed layouts
pub const MAX_FAILURE_RATE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingReport {
    pub trials: usize,
    pub failures: usize,
}

impl SamplingReport {
    pub fn failure_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.failures as f64 / self.trials as f64
        }
    }

    pub fn passes(&self) -> bool {
        self.failure_rate() <= MAX_FAILURE_RATE
    }
}

/// Sample `trials` layouts for `task`, one derived seed per trial
pub fn run_sampling_check(
    task: &Task,
    sampler: &SamplerConfig,
    arena_radius: f32,
    base_seed: u64,
    trials: usize,
) -> Result<SamplingReport> {
    let sampler = PlacementSampler::new(sampler.clone());

    let pb = ProgressBar::new(trials as u64);
    pb.set_style(progress_style()?);

    let failures = (0..trials)
        .into_par_iter()
        .filter(|&trial| {
            let mut rng = episode_rng(derive_seed(base_seed, trial as u64));
            let placements = task.setup_placements(&mut rng);
            let failed = sampler
                .sample(&placements.specs, arena_radius, &mut rng)
                .is_err();
            pb.inc(1);
            failed
        })
        .count();
    pb.finish_and_clear();

    let report = SamplingReport { trials, failures };
    log::info!(
        "Sampled {} {} layouts: {} failures ({:.2}%)",
        trials,
        task.kind(),
        failures,
        report.failure_rate() * 100.0
    );
    Ok(report)
}
