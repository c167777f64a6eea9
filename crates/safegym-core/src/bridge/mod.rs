//! Interface to the physics backend
//!
//! The bridge owns the live simulation state. Tasks read body positions from
//! it and command resets and targeted re-initialisation through it; it is
//! always passed in explicitly, never reached through a global.

mod kinematic;

use glam::{Quat, Vec3};

use crate::scene::SceneDescriptor;

pub use kinematic::{BodyState, BridgeState, KinematicBridge, KinematicConfig};

/// Operations the task layer needs from a physics backend
pub trait PhysicsBridge {
    /// Full snapshot of the simulation, enough to reproduce future steps
    type State: Clone;

    /// Current world position of a body, `None` if it is not in the scene
    fn position_of(&self, name: &str) -> Option<Vec3>;

    /// Radius of the arena, constant for the episode
    fn arena_radius(&self) -> f32;

    /// Atomically replace the whole scene
    fn reset(&mut self, scene: &SceneDescriptor);

    /// Move an existing free body without touching the rest of the state
    fn reinitialize(&mut self, name: &str, position: Vec3, orientation: Quat);

    fn save_state(&self) -> Self::State;

    fn restore_state(&mut self, state: &Self::State);

    /// Advance the simulation by one step
    fn step_forward(&mut self);
}

/// Position of a body that must exist
///
/// # Panics
/// If the scene has no body called `name`; that is a contract violation
/// between the task and the scene it built.
pub fn body_position(bridge: &impl PhysicsBridge, name: &str) -> Vec3 {
    bridge
        .position_of(name)
        .unwrap_or_else(|| panic!("body '{}' is missing from the scene", name))
}
