//! Batch episode runner
//!
//! Each episode gets its own bridge and RNG seeded from the base seed and its
//! index, so a batch is reproducible regardless of how rayon schedules it.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use safegym_core::bridge::{KinematicBridge, KinematicConfig, PhysicsBridge};
use safegym_core::error::ResamplingError;
use safegym_core::placement::{PlacementSampler, SamplerConfig};
use safegym_core::rng::{derive_seed, episode_rng};
use safegym_core::scene::SceneDescriptor;
use safegym_core::tasks::{Task, TaskMachine};

use super::controller::ScriptedController;
use crate::config::GymConfig;

/// Result of one finished episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    pub index: usize,
    pub seed: u64,
    pub steps: u64,
    pub total_reward: f32,
    pub goals_met: u32,
}

impl EpisodeReport {
    pub fn mean_reward(&self) -> f32 {
        if self.steps == 0 {
            0.0
        } else {
            self.total_reward / self.steps as f32
        }
    }
}

/// Aggregate over a batch of episodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub reports: Vec<EpisodeReport>,
    /// Episodes abandoned because a layout could not be sampled
    pub failures: Vec<(usize, ResamplingError)>,
}

impl RunSummary {
    pub fn episodes(&self) -> usize {
        self.reports.len() + self.failures.len()
    }

    pub fn total_goals(&self) -> u32 {
        self.reports.iter().map(|r| r.goals_met).sum()
    }

    pub fn mean_reward(&self) -> f32 {
        if self.reports.is_empty() {
            return 0.0;
        }
        self.reports.iter().map(EpisodeReport::mean_reward).sum::<f32>() / self.reports.len() as f32
    }
}

/// Runs time-limited episodes of one task with the scripted controller
#[derive(Debug, Clone)]
pub struct EpisodeRunner {
    task: Task,
    sampler: SamplerConfig,
    physics: KinematicConfig,
    arena_radius: f32,
    max_steps: u64,
    base_seed: u64,
}

impl EpisodeRunner {
    pub fn new(config: &GymConfig) -> Self {
        Self {
            task: config.task.build(),
            sampler: config.sampler.clone(),
            physics: config.physics.clone(),
            arena_radius: config.task.arena_radius,
            max_steps: config.episode.max_steps,
            base_seed: config.episode.seed,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn max_steps(&self) -> u64 {
        self.max_steps
    }

    /// Seed used for episode `index`
    pub fn episode_seed(&self, index: usize) -> u64 {
        derive_seed(self.base_seed, index as u64)
    }

    fn machine(&self) -> TaskMachine {
        TaskMachine::new(
            self.task.clone(),
            PlacementSampler::new(self.sampler.clone()),
            self.arena_radius,
        )
    }

    /// Scene that episode `index` starts from
    pub fn initial_scene(&self, index: usize) -> Result<SceneDescriptor, ResamplingError> {
        let mut bridge = KinematicBridge::new(self.physics.clone());
        let mut rng = episode_rng(self.episode_seed(index));
        self.machine().reset(&mut bridge, &mut rng)
    }

    /// Run episode `index` until the time limit
    pub fn run_episode(&self, index: usize) -> Result<EpisodeReport, ResamplingError> {
        let seed = self.episode_seed(index);
        let mut rng = episode_rng(seed);
        let mut bridge = KinematicBridge::new(self.physics.clone());
        let mut machine = self.machine();
        let controller = ScriptedController;

        machine.reset(&mut bridge, &mut rng)?;

        let mut total_reward = 0.0;
        let mut steps = 0;
        while steps < self.max_steps {
            bridge.set_robot_command(controller.command(&self.task, &bridge));
            bridge.step_forward();
            let outcome = machine.step(&mut bridge, &mut rng)?;
            total_reward += outcome.reward;
            steps += 1;
            if outcome.episode_done {
                break;
            }
        }

        let goals_met = machine.progress().map_or(0, |p| p.goals_met);
        log::debug!(
            "Episode {} (seed {}): {} steps, {} goals, reward {:.2}",
            index,
            seed,
            steps,
            goals_met,
            total_reward
        );

        Ok(EpisodeReport {
            index,
            seed,
            steps,
            total_reward,
            goals_met,
        })
    }

    /// Run `episodes` episodes in parallel with a progress bar
    pub fn run(&self, episodes: usize) -> Result<RunSummary> {
        let pb = ProgressBar::new(episodes as u64);
        pb.set_style(progress_style()?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.println(format!(
            "Running {} {} episodes of {} steps",
            episodes,
            self.task.kind(),
            self.max_steps
        ));

        let results: Vec<(usize, Result<EpisodeReport, ResamplingError>)> = (0..episodes)
            .into_par_iter()
            .map(|index| {
                let result = self.run_episode(index);
                pb.inc(1);
                (index, result)
            })
            .collect();
        pb.finish_and_clear();

        let mut summary = RunSummary::default();
        for (index, result) in results {
            match result {
                Ok(report) => summary.reports.push(report),
                Err(err) => {
                    log::warn!("Episode {} abandoned: {}", index, err);
                    summary.failures.push((index, err));
                }
            }
        }
        Ok(summary)
    }
}

pub(crate) fn progress_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
        .progress_chars("█▓░"))
}
