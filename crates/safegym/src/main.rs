use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;

use safegym::config::GymConfig;
use safegym::headless::{run_sampling_check, write_scene, EpisodeRunner, MAX_FAILURE_RATE};
use safegym_core::tasks::TaskKind;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (RON); defaults to ./safegym.ron if present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Task: go_to_goal or push_box
    #[arg(long)]
    task: Option<TaskKind>,

    /// Base seed for per-episode seeds
    #[arg(long)]
    seed: Option<u64>,

    /// Number of episodes to run
    #[arg(long)]
    episodes: Option<usize>,

    /// Steps per episode before the time limit cuts it off
    #[arg(long)]
    max_steps: Option<u64>,

    /// Only measure the layout failure rate over this many samples
    #[arg(long)]
    check_sampling: Option<usize>,

    /// Write the first episode's initial scene as RON and exit
    #[arg(long)]
    dump_scene: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut GymConfig) {
        if let Some(kind) = self.task {
            config.task.kind = kind;
        }
        if let Some(seed) = self.seed {
            config.episode.seed = seed;
        }
        if let Some(episodes) = self.episodes {
            config.episode.episodes = episodes;
        }
        if let Some(max_steps) = self.max_steps {
            config.episode.max_steps = max_steps;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = GymConfig::load_from(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    log::info!("Starting safegym");
    log::info!("  Task: {}", config.task.kind);
    log::info!("  Arena radius: {}", config.task.arena_radius);
    log::info!("  Seed: {}", config.episode.seed);

    // Handle --check-sampling
    if let Some(trials) = args.check_sampling {
        let report = run_sampling_check(
            &config.task.build(),
            &config.sampler,
            config.task.arena_radius,
            config.episode.seed,
            trials,
        )?;
        anyhow::ensure!(
            report.passes(),
            "layout failure rate {:.2}% exceeds {:.2}% ({} of {} samples)",
            report.failure_rate() * 100.0,
            MAX_FAILURE_RATE * 100.0,
            report.failures,
            report.trials
        );
        return Ok(());
    }

    let runner = EpisodeRunner::new(&config);

    // Handle --dump-scene
    if let Some(path) = &args.dump_scene {
        let scene = runner
            .initial_scene(0)
            .context("Failed to sample the initial scene")?;
        return write_scene(path, &scene);
    }

    let summary = runner.run(config.episode.episodes)?;
    log::info!(
        "Finished {} episodes: {} sub-goals met, mean step reward {:.3}, {} abandoned",
        summary.episodes(),
        summary.total_goals(),
        summary.mean_reward(),
        summary.failures.len()
    );
    for report in &summary.reports {
        log::info!(
            "  Episode {:>3}: {} goals, reward {:.1}",
            report.index,
            report.goals_met,
            report.total_reward
        );
    }
    Ok(())
}
