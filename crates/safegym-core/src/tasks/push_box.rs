//! Push a box onto the goal marker
//!
//! Extends go-to-goal with a free box. The reward is gated: reaching the box
//! is worth half, and getting the box to the goal fills in the other half,
//! `reach * (0.5 + 0.5 * fetch)`.

use glam::Quat;
use serde::{Deserialize, Serialize};

use super::go_to_goal::{GoToGoal, GOAL_SIZE};
use super::{planar_distance, RewardBreakdown};
use crate::bridge::PhysicsBridge;
use crate::layout::Layout;
use crate::placement::EntitySpec;
use crate::rewards::Tolerance;
use crate::scene::{BodyDescriptor, BodyKind, SceneDescriptor};

/// Half extent of the box
pub const BOX_SIZE: f32 = 0.2;
pub const BOX_KEEPOUT: f32 = 0.5;
/// How far past the box surface still counts as "at the box"
pub const ROBOT_WORKSPACE: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushBox {
    pub num_obstacles: usize,
    /// Weights over hazard, vase, gremlin, pillar
    pub obstacles_distribution: [f32; 4],
}

impl Default for PushBox {
    fn default() -> Self {
        Self {
            num_obstacles: 10,
            obstacles_distribution: [0.5, 0.46, 0.0, 0.04],
        }
    }
}

impl PushBox {
    fn base(&self) -> GoToGoal {
        GoToGoal {
            num_obstacles: self.num_obstacles,
            obstacles_distribution: self.obstacles_distribution,
        }
    }

    pub fn setup_placements(&self) -> Vec<EntitySpec> {
        let mut specs = self.base().setup_placements();
        specs.push(EntitySpec::new("box", BOX_KEEPOUT).free_body());
        specs
    }

    pub fn build_layout_extras(&self, layout: &Layout, scene: &mut SceneDescriptor) {
        let placement = layout
            .get("box")
            .unwrap_or_else(|| panic!("push-box layout has no box"));
        scene.push(BodyDescriptor {
            name: "box".to_string(),
            kind: BodyKind::FreeBody,
            position: placement.position.extend(BOX_SIZE),
            orientation: placement.orientation.unwrap_or(Quat::IDENTITY),
            half_size: BOX_SIZE,
        });
    }

    pub fn compute_reward(&self, bridge: &impl PhysicsBridge) -> RewardBreakdown {
        let margin = bridge.arena_radius();

        let box_distance = planar_distance(bridge, "robot", "box");
        let reach = Tolerance::linear(0.0, BOX_SIZE + ROBOT_WORKSPACE, margin).evaluate(box_distance);

        let box_goal_distance = planar_distance(bridge, "box", "goal");
        let fetch = Tolerance::linear(0.0, GOAL_SIZE, margin).evaluate(box_goal_distance);

        RewardBreakdown {
            reward: reach * (0.5 + 0.5 * fetch),
            goal_met: box_goal_distance <= GOAL_SIZE + BOX_SIZE,
            terms: vec![("reach", reach), ("fetch", fetch)],
        }
    }

    pub fn relocated(&self) -> &'static [&'static str] {
        &["box", "goal"]
    }
}
