//! Deterministic kinematic reference bridge
//!
//! No external physics engine: bodies move by explicit velocity integration
//! with damping, the robot follows a velocity command, and contacts are
//! resolved positionally. Everything runs in a fixed order on f32, so a saved
//! state always replays to the same result.

use anyhow::{Context, Result};
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::PhysicsBridge;
use crate::scene::{BodyKind, Contact, SceneDescriptor};

/// Integration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicConfig {
    /// Seconds per step
    pub dt: f32,
    /// Velocity retained per step by unactuated bodies
    pub damping: f32,
    /// Robot speed cap (m/s)
    pub max_robot_speed: f32,
}

impl Default for KinematicConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,
            damping: 0.9,
            max_robot_speed: 1.0,
        }
    }
}

/// Live state of one body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub name: String,
    pub kind: BodyKind,
    pub position: Vec3,
    pub velocity: Vec2,
    pub orientation: Quat,
    pub half_size: f32,
}

impl BodyState {
    fn planar(&self) -> Vec2 {
        self.position.truncate()
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta.extend(0.0);
    }
}

/// Complete simulator snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BridgeState {
    pub arena_radius: f32,
    pub steps: u64,
    pub robot_command: Vec2,
    pub bodies: Vec<BodyState>,
}

impl BridgeState {
    /// Encode with bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode_next::serde::encode_to_vec(self, bincode_next::config::standard())
            .context("Failed to serialize bridge state")
    }

    /// Decode a snapshot written by [`BridgeState::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (state, _): (BridgeState, _) =
            bincode_next::serde::decode_from_slice(bytes, bincode_next::config::standard())
                .map_err(|e| anyhow::anyhow!("Failed to deserialize bridge state: {:?}", e))?;
        Ok(state)
    }
}

/// Reference [`PhysicsBridge`] used by tests and the headless runner
#[derive(Debug, Clone)]
pub struct KinematicBridge {
    config: KinematicConfig,
    state: BridgeState,
}

impl KinematicBridge {
    /// Create an empty bridge; call [`PhysicsBridge::reset`] before use
    pub fn new(config: KinematicConfig) -> Self {
        Self {
            config,
            state: BridgeState::default(),
        }
    }

    pub fn from_scene(config: KinematicConfig, scene: &SceneDescriptor) -> Self {
        let mut bridge = Self::new(config);
        bridge.reset(scene);
        bridge
    }

    pub fn config(&self) -> &KinematicConfig {
        &self.config
    }

    /// Set the robot's desired planar velocity for the following steps
    pub fn set_robot_command(&mut self, velocity: Vec2) {
        self.state.robot_command = velocity.clamp_length_max(self.config.max_robot_speed);
    }

    pub fn body(&self, name: &str) -> Option<&BodyState> {
        self.state.bodies.iter().find(|b| b.name == name)
    }

    pub fn steps(&self) -> u64 {
        self.state.steps
    }

    fn robot_index(&self) -> Option<usize> {
        self.state
            .bodies
            .iter()
            .position(|b| b.kind == BodyKind::Robot)
    }

    fn integrate(&mut self) {
        let dt = self.config.dt;
        let damping = self.config.damping;
        let command = self.state.robot_command;

        for body in &mut self.state.bodies {
            match body.kind {
                BodyKind::Robot => body.velocity = command,
                _ if body.kind.contact() == Contact::Pushable => body.velocity *= damping,
                _ => continue,
            }
            let delta = body.velocity * dt;
            body.translate(delta);
        }
    }

    /// Push movable bodies out of the robot and the robot out of solid ones
    fn resolve_contacts(&mut self) {
        let Some(robot_idx) = self.robot_index() else {
            return;
        };
        let robot_pos = self.state.bodies[robot_idx].planar();
        let robot_radius = self.state.bodies[robot_idx].half_size;
        let robot_vel = self.state.bodies[robot_idx].velocity;
        let mut robot_correction = Vec2::ZERO;

        for (i, body) in self.state.bodies.iter_mut().enumerate() {
            if i == robot_idx {
                continue;
            }
            let delta = body.planar() - robot_pos;
            let dist = delta.length();
            let min_dist = robot_radius + body.half_size;
            if dist >= min_dist || dist <= f32::EPSILON {
                continue;
            }
            let normal = delta / dist;
            let overlap = min_dist - dist;

            match body.kind.contact() {
                Contact::Passthrough => {}
                Contact::Pushable => {
                    body.translate(normal * overlap);
                    let push = robot_vel.dot(normal);
                    let along = body.velocity.dot(normal);
                    if push > along {
                        body.velocity += normal * (push - along);
                    }
                }
                Contact::Solid => robot_correction -= normal * overlap,
            }
        }

        self.state.bodies[robot_idx].translate(robot_correction);
    }

    /// Keep colliding bodies inside the arena wall
    fn confine(&mut self) {
        let arena_radius = self.state.arena_radius;
        for body in &mut self.state.bodies {
            if body.kind.contact() == Contact::Passthrough {
                continue;
            }
            let limit = (arena_radius - body.half_size).max(0.0);
            let planar = body.planar();
            let r = planar.length();
            if r > limit {
                let clamped = planar * (limit / r);
                body.position.x = clamped.x;
                body.position.y = clamped.y;
                body.velocity = Vec2::ZERO;
            }
        }
    }
}

impl PhysicsBridge for KinematicBridge {
    type State = BridgeState;

    fn position_of(&self, name: &str) -> Option<Vec3> {
        self.body(name).map(|b| b.position)
    }

    fn arena_radius(&self) -> f32 {
        self.state.arena_radius
    }

    fn reset(&mut self, scene: &SceneDescriptor) {
        self.state = BridgeState {
            arena_radius: scene.arena_radius,
            steps: 0,
            robot_command: Vec2::ZERO,
            bodies: scene
                .bodies
                .iter()
                .map(|b| BodyState {
                    name: b.name.clone(),
                    kind: b.kind,
                    position: b.position,
                    velocity: Vec2::ZERO,
                    orientation: b.orientation,
                    half_size: b.half_size,
                })
                .collect(),
        };
        log::debug!(
            "Bridge reset with {} bodies (arena radius {:.2})",
            self.state.bodies.len(),
            scene.arena_radius
        );
    }

    fn reinitialize(&mut self, name: &str, position: Vec3, orientation: Quat) {
        let body = self
            .state
            .bodies
            .iter_mut()
            .find(|b| b.name == name)
            .unwrap_or_else(|| panic!("cannot reinitialize unknown body '{}'", name));
        body.position = position;
        body.orientation = orientation;
        body.velocity = Vec2::ZERO;
        log::debug!(
            "Reinitialized '{}' at ({:.2}, {:.2})",
            name,
            position.x,
            position.y
        );
    }

    fn save_state(&self) -> BridgeState {
        self.state.clone()
    }

    fn restore_state(&mut self, state: &BridgeState) {
        self.state = state.clone();
    }

    fn step_forward(&mut self) {
        self.integrate();
        self.resolve_contacts();
        self.confine();
        self.state.steps += 1;
    }
}
