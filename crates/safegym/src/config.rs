//! Runner configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `safegym.ron` file (if exists), or an explicit path
//! 3. Environment variables prefixed with `SAFEGYM_`
//!
//! Example environment variable: `SAFEGYM_SAMPLER__LAYOUT_ATTEMPTS=500`

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use safegym_core::bridge::KinematicConfig;
use safegym_core::placement::{SamplerConfig, DEFAULT_ENTITY_ATTEMPTS, DEFAULT_LAYOUT_ATTEMPTS};
use safegym_core::tasks::{Task, TaskKind};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "safegym";

/// Top-level runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GymConfig {
    #[serde(default)]
    pub task: TaskConfig,

    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub episode: EpisodeConfig,

    #[serde(default)]
    pub physics: KinematicConfig,
}

/// Which task to run and in what arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub kind: TaskKind,
    /// Arena disk radius in meters
    pub arena_radius: f32,
    /// Overrides the task's own obstacle count
    pub num_obstacles: Option<usize>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            kind: TaskKind::PushBox,
            arena_radius: 3.0,
            num_obstacles: None,
        }
    }
}

impl TaskConfig {
    pub fn build(&self) -> Task {
        let task = self.kind.build();
        match self.num_obstacles {
            Some(count) => task.with_num_obstacles(count),
            None => task,
        }
    }
}

/// Episode batch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Episodes per run
    pub episodes: usize,
    /// Time limit; the only thing that ends an episode
    pub max_steps: u64,
    /// Base seed; per-episode seeds are derived from it
    pub seed: u64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            episodes: 8,
            max_steps: 1000,
            seed: 0,
        }
    }
}

impl GymConfig {
    /// Load with `safegym.ron` from the working directory, if present
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `path`, or `safegym.ron` when `path` is `None` (optional then)
    /// 3. Environment variables prefixed with `SAFEGYM_` (highest priority)
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Ron).required(true),
            None => File::with_name(CONFIG_FILE)
                .format(FileFormat::Ron)
                .required(false),
        };

        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("task.kind", TaskKind::PushBox.to_string())?
            .set_default("task.arena_radius", 3.0)?
            .set_default("sampler.entity_attempts", DEFAULT_ENTITY_ATTEMPTS as i64)?
            .set_default("sampler.layout_attempts", DEFAULT_LAYOUT_ATTEMPTS as i64)?
            .set_default("episode.episodes", 8_i64)?
            .set_default("episode.max_steps", 1000_i64)?
            .set_default("episode.seed", 0_i64)?
            .set_default("physics.dt", 0.02)?
            .set_default("physics.damping", 0.9)?
            .set_default("physics.max_robot_speed", 1.0)?
            // Layer 2: Config file
            .add_source(file)
            // Layer 3: Environment variables (SAFEGYM_EPISODE__MAX_STEPS, etc.)
            .add_source(
                Environment::with_prefix("SAFEGYM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().context("Failed to build configuration")?;

        let config: GymConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the sampler and runner cannot work with
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.task.arena_radius > 0.0,
            "task.arena_radius must be positive, got {}",
            self.task.arena_radius
        );
        anyhow::ensure!(
            self.sampler.entity_attempts > 0 && self.sampler.layout_attempts > 0,
            "sampler budgets must be positive"
        );
        anyhow::ensure!(self.episode.max_steps > 0, "episode.max_steps must be positive");
        anyhow::ensure!(self.physics.dt > 0.0, "physics.dt must be positive");
        Ok(())
    }
}
