//! Headless episode infrastructure
//!
//! This module runs tasks without any renderer:
//! - Scripted controllers for go-to-goal and push-box
//! - Parallel, seed-reproducible episode batches
//! - Layout acceptance statistics
//! - Scene descriptor dumps in RON

mod controller;
mod runner;
mod sampling_check;
mod scene_dump;

pub use controller::ScriptedController;
pub use runner::{EpisodeReport, EpisodeRunner, RunSummary};
pub use sampling_check::{run_sampling_check, SamplingReport, MAX_FAILURE_RATE};
pub use scene_dump::{read_scene, write_scene};
