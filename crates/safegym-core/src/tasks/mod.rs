//! Task variants and the re-goaling state machine
//!
//! The variant set is small and closed, so tasks are an enum sharing one
//! capability surface: `setup_placements`, `build_layout_extras`,
//! `compute_reward` and `on_relayout`.

mod go_to_goal;
mod machine;
mod obstacles;
mod push_box;

use std::fmt;
use std::str::FromStr;

use glam::Quat;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bridge::{body_position, PhysicsBridge};
use crate::layout::Layout;
use crate::placement::EntitySpec;
use crate::scene::{BodyDescriptor, BodyKind, SceneDescriptor};

pub use go_to_goal::{GoToGoal, GOAL_KEEPOUT, GOAL_SIZE, ROBOT_HEIGHT, ROBOT_KEEPOUT, ROBOT_SIZE};
pub use machine::{StepInfo, StepOutcome, TaskMachine, TaskPhase, TaskProgress};
pub use obstacles::{draw_obstacles, Obstacle, ObstacleKind};
pub use push_box::{PushBox, BOX_KEEPOUT, BOX_SIZE, ROBOT_WORKSPACE};

/// Reward for one step plus the sub-goal predicate
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RewardBreakdown {
    pub reward: f32,
    pub goal_met: bool,
    /// Named sub-rewards that went into `reward`
    pub terms: Vec<(&'static str, f32)>,
}

/// Entities to place for one episode
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placements {
    pub specs: Vec<EntitySpec>,
    pub obstacles: Vec<Obstacle>,
}

impl Placements {
    pub fn spec(&self, name: &str) -> Option<&EntitySpec> {
        self.specs.iter().find(|s| s.name == name)
    }
}

/// Selectable task type, without parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    GoToGoal,
    PushBox,
}

impl TaskKind {
    pub fn build(self) -> Task {
        match self {
            TaskKind::GoToGoal => Task::GoToGoal(GoToGoal::default()),
            TaskKind::PushBox => Task::PushBox(PushBox::default()),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::GoToGoal => write!(f, "go_to_goal"),
            TaskKind::PushBox => write!(f, "push_box"),
        }
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").to_lowercase().as_str() {
            "go_to_goal" | "goal" => Ok(TaskKind::GoToGoal),
            "push_box" | "push" => Ok(TaskKind::PushBox),
            other => Err(format!(
                "unknown task '{}' (expected go_to_goal or push_box)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Task {
    GoToGoal(GoToGoal),
    PushBox(PushBox),
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::GoToGoal(_) => TaskKind::GoToGoal,
            Task::PushBox(_) => TaskKind::PushBox,
        }
    }

    pub fn num_obstacles(&self) -> usize {
        match self {
            Task::GoToGoal(t) => t.num_obstacles,
            Task::PushBox(t) => t.num_obstacles,
        }
    }

    pub fn obstacles_distribution(&self) -> [f32; 4] {
        match self {
            Task::GoToGoal(t) => t.obstacles_distribution,
            Task::PushBox(t) => t.obstacles_distribution,
        }
    }

    /// Override the obstacle count
    pub fn with_num_obstacles(mut self, count: usize) -> Self {
        match &mut self {
            Task::GoToGoal(t) => t.num_obstacles = count,
            Task::PushBox(t) => t.num_obstacles = count,
        }
        self
    }

    /// Entities for a new episode, with this episode's obstacle draw
    pub fn setup_placements<R: Rng + ?Sized>(&self, rng: &mut R) -> Placements {
        let mut specs = match self {
            Task::GoToGoal(t) => t.setup_placements(),
            Task::PushBox(t) => t.setup_placements(),
        };
        let obstacles = draw_obstacles(self.num_obstacles(), &self.obstacles_distribution(), rng);
        specs.extend(obstacles.iter().map(Obstacle::spec));
        Placements { specs, obstacles }
    }

    /// Scene for a sampled layout: robot, goal and obstacles, then task extras
    pub fn build_scene(
        &self,
        layout: &Layout,
        placements: &Placements,
        arena_radius: f32,
    ) -> SceneDescriptor {
        let mut scene = SceneDescriptor::new(arena_radius);
        let position = |name: &str| {
            layout
                .position(name)
                .unwrap_or_else(|| panic!("layout has no entry for '{}'", name))
        };

        scene.push(BodyDescriptor {
            name: "robot".to_string(),
            kind: BodyKind::Robot,
            position: position("robot").extend(ROBOT_HEIGHT),
            orientation: Quat::IDENTITY,
            half_size: ROBOT_SIZE,
        });
        scene.push(BodyDescriptor {
            name: "goal".to_string(),
            kind: BodyKind::Goal,
            position: position("goal").extend(GOAL_SIZE / 2.0),
            orientation: Quat::IDENTITY,
            half_size: GOAL_SIZE,
        });
        for obstacle in &placements.obstacles {
            scene.push(BodyDescriptor {
                name: obstacle.name.clone(),
                kind: BodyKind::Obstacle(obstacle.kind),
                position: position(&obstacle.name).extend(obstacle.kind.height()),
                orientation: Quat::IDENTITY,
                half_size: obstacle.kind.size(),
            });
        }

        self.build_layout_extras(layout, &mut scene);
        scene
    }

    /// Task-specific bodies beyond robot, goal and obstacles
    pub fn build_layout_extras(&self, layout: &Layout, scene: &mut SceneDescriptor) {
        match self {
            Task::GoToGoal(_) => {}
            Task::PushBox(t) => t.build_layout_extras(layout, scene),
        }
    }

    pub fn compute_reward(&self, bridge: &impl PhysicsBridge) -> RewardBreakdown {
        match self {
            Task::GoToGoal(t) => t.compute_reward(bridge),
            Task::PushBox(t) => t.compute_reward(bridge),
        }
    }

    /// Entities re-sampled when the sub-goal is met
    pub fn on_relayout(&self) -> &'static [&'static str] {
        match self {
            Task::GoToGoal(t) => t.relocated(),
            Task::PushBox(t) => t.relocated(),
        }
    }
}

/// Distance between two bodies in the arena plane
fn planar_distance(bridge: &impl PhysicsBridge, a: &str, b: &str) -> f32 {
    body_position(bridge, a)
        .truncate()
        .distance(body_position(bridge, b).truncate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{KinematicBridge, KinematicConfig};
    use crate::placement::sample_layout;
    use crate::rng::episode_rng;
    use glam::{Vec2, Vec3};

    #[test]
    fn test_task_kind_parse() {
        assert_eq!("push-box".parse::<TaskKind>(), Ok(TaskKind::PushBox));
        assert_eq!("go_to_goal".parse::<TaskKind>(), Ok(TaskKind::GoToGoal));
        assert!("fly".parse::<TaskKind>().is_err());
        assert_eq!(TaskKind::PushBox.to_string(), "push_box");
    }

    #[test]
    fn test_push_box_placements() {
        let task = TaskKind::PushBox.build();
        let placements = task.setup_placements(&mut episode_rng(0));
        assert_eq!(placements.specs.len(), 3 + 10);
        assert_eq!(placements.obstacles.len(), 10);
        let boxed = placements.spec("box").unwrap();
        assert_eq!(boxed.keepout, BOX_KEEPOUT);
        assert!(boxed.free_body);
        assert_eq!(placements.spec("goal").unwrap().keepout, GOAL_KEEPOUT);
    }

    #[test]
    fn test_build_scene_has_every_entity() {
        let task = TaskKind::PushBox.build();
        let mut rng = episode_rng(1);
        let placements = task.setup_placements(&mut rng);
        let layout = sample_layout(&placements.specs, 3.0, &mut rng).unwrap();
        let scene = task.build_scene(&layout, &placements, 3.0);

        assert_eq!(scene.bodies.len(), placements.specs.len());
        let boxed = scene.body("box").unwrap();
        assert_eq!(boxed.kind, BodyKind::FreeBody);
        assert_eq!(boxed.position.z, BOX_SIZE);
        assert_eq!(boxed.position.truncate(), layout.position("box").unwrap());
        assert_eq!(
            boxed.orientation,
            layout.get("box").unwrap().orientation.unwrap()
        );
    }

    #[test]
    fn test_go_to_goal_has_no_box() {
        let task = TaskKind::GoToGoal.build().with_num_obstacles(0);
        let mut rng = episode_rng(2);
        let placements = task.setup_placements(&mut rng);
        let layout = sample_layout(&placements.specs, 3.0, &mut rng).unwrap();
        let scene = task.build_scene(&layout, &placements, 3.0);
        assert_eq!(scene.bodies.len(), 2);
        assert!(scene.body("box").is_none());
        assert_eq!(task.on_relayout(), &["goal"]);
    }

    fn scene_with(robot: Vec2, boxed: Vec2, goal: Vec2) -> SceneDescriptor {
        let mut layout = Layout::new();
        layout.insert("robot", crate::layout::Placement::at(robot));
        layout.insert("goal", crate::layout::Placement::at(goal));
        layout.insert("box", crate::layout::Placement::at(boxed));
        let task = TaskKind::PushBox.build().with_num_obstacles(0);
        task.build_scene(&layout, &Placements::default(), 3.0)
    }

    #[test]
    fn test_push_box_reward_gating() {
        let task = TaskKind::PushBox.build();

        // Far from the box: reach dominates
        let far = KinematicBridge::from_scene(
            KinematicConfig::default(),
            &scene_with(Vec2::new(-2.5, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)),
        );
        // At the box, box still away from goal
        let near = KinematicBridge::from_scene(
            KinematicConfig::default(),
            &scene_with(Vec2::new(0.6, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.5, 0.0)),
        );
        // At the box, box on the goal
        let done = KinematicBridge::from_scene(
            KinematicConfig::default(),
            &scene_with(Vec2::new(1.6, 0.0), Vec2::new(2.0, 0.0), Vec2::new(2.0, 0.0)),
        );

        let r_far = task.compute_reward(&far);
        let r_near = task.compute_reward(&near);
        let r_done = task.compute_reward(&done);

        assert!(r_far.reward < r_near.reward);
        assert!(r_near.reward >= 0.5 && r_near.reward < 1.0);
        assert_eq!(r_done.reward, 1.0);
        assert!(!r_near.goal_met);
        assert!(r_done.goal_met);
        assert_eq!(r_done.terms.len(), 2);
    }

    #[test]
    fn test_go_to_goal_reward() {
        let task = TaskKind::GoToGoal.build();
        let mut scene = scene_with(Vec2::ZERO, Vec2::new(0.0, 2.0), Vec2::new(1.5, 0.0));
        scene.bodies.retain(|b| b.name != "box");
        let mut bridge = KinematicBridge::from_scene(KinematicConfig::default(), &scene);

        let before = task.compute_reward(&bridge);
        assert!(!before.goal_met);
        // (1.5 - 0.3) / 3.0 of the way out along the margin
        assert!((before.reward - 0.6).abs() < 1e-5);

        bridge.reinitialize("robot", Vec3::new(1.4, 0.0, ROBOT_HEIGHT), Quat::IDENTITY);
        let after = task.compute_reward(&bridge);
        assert!(after.goal_met);
        assert_eq!(after.reward, 1.0);
    }
}
