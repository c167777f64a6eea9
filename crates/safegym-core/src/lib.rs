//! # safegym-core - Robot navigation tasks with randomized layouts
//!
//! Rejection-sampled placement of robot, goal, box and obstacles in a disk
//! arena, dm_control style tolerance rewards, and a task state machine that
//! re-goals in place whenever a sub-goal is met. Physics is reached through
//! the [`bridge::PhysicsBridge`] trait.

pub mod bridge;
pub mod error;
pub mod layout;
pub mod placement;
pub mod rewards;
pub mod rng;
pub mod scene;
pub mod tasks;

pub use error::ResamplingError;
pub use layout::{Layout, Placement};
pub use placement::{sample_layout, EntitySpec, KeepoutRule, PlacementSampler, SamplerConfig};
pub use rewards::{tolerance, Sigmoid, Tolerance};

/// Common imports for internal use
pub mod prelude {
    pub use crate::bridge::{KinematicBridge, KinematicConfig, PhysicsBridge};
    pub use crate::error::ResamplingError;
    pub use crate::layout::Layout;
    pub use crate::placement::{EntitySpec, PlacementSampler, SamplerConfig};
    pub use crate::rng::{episode_rng, EpisodeRng, SamplingRng};
    pub use crate::tasks::{Task, TaskKind, TaskMachine, TaskPhase};
    pub use glam::{Quat, Vec2, Vec3};
}
