//! Navigate the robot onto a goal marker

use serde::{Deserialize, Serialize};

use super::{planar_distance, RewardBreakdown};
use crate::bridge::PhysicsBridge;
use crate::placement::EntitySpec;
use crate::rewards::Tolerance;

/// Half extent of the goal marker; also the completion radius
pub const GOAL_SIZE: f32 = 0.3;
pub const GOAL_KEEPOUT: f32 = 0.3;

pub const ROBOT_KEEPOUT: f32 = 0.4;
/// Contact radius of the robot body
pub const ROBOT_SIZE: f32 = 0.15;
pub const ROBOT_HEIGHT: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoToGoal {
    pub num_obstacles: usize,
    /// Weights over hazard, vase, gremlin, pillar
    pub obstacles_distribution: [f32; 4],
}

impl Default for GoToGoal {
    fn default() -> Self {
        Self {
            num_obstacles: 8,
            obstacles_distribution: [0.5, 0.3, 0.1, 0.1],
        }
    }
}

impl GoToGoal {
    /// Robot and goal; obstacles are appended by the caller
    pub fn setup_placements(&self) -> Vec<EntitySpec> {
        vec![
            EntitySpec::new("robot", ROBOT_KEEPOUT),
            EntitySpec::new("goal", GOAL_KEEPOUT),
        ]
    }

    pub fn compute_reward(&self, bridge: &impl PhysicsBridge) -> RewardBreakdown {
        let goal_distance = planar_distance(bridge, "robot", "goal");
        let reach = Tolerance::linear(0.0, GOAL_SIZE, bridge.arena_radius()).evaluate(goal_distance);

        RewardBreakdown {
            reward: reach,
            goal_met: goal_distance <= GOAL_SIZE,
            terms: vec![("reach", reach)],
        }
    }

    pub fn relocated(&self) -> &'static [&'static str] {
        &["goal"]
    }
}
