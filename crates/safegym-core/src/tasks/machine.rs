//! Re-goaling task state machine
//!
//! `AwaitingLayout → Active → (sub-goal met) → Relayout → Active → …`
//!
//! Meeting a sub-goal never ends the episode. The relocated entities get a
//! fresh partial layout and are moved in place through the bridge while the
//! robot, velocities and step count carry on. Only an outside time limit
//! ends an episode.

use glam::Quat;
use rand::Rng;

use super::{Placements, Task};
use crate::bridge::{body_position, PhysicsBridge};
use crate::error::ResamplingError;
use crate::layout::Layout;
use crate::placement::{EntitySpec, PlacementSampler};
use crate::scene::SceneDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    /// No layout committed yet
    AwaitingLayout,
    Active,
    /// Transient while a sub-goal's entities are being moved
    Relayout,
}

/// Per-episode progress owned by the machine
#[derive(Debug, Clone, PartialEq)]
pub struct TaskProgress {
    /// Last committed layout
    pub layout: Layout,
    pub placements: Placements,
    /// Whether the most recent step met the sub-goal
    pub goal_met: bool,
    /// Steps taken this episode
    pub step: u64,
    /// Sub-goals met this episode
    pub goals_met: u32,
}

/// Extra information returned with each step
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepInfo {
    pub goal_met: bool,
    pub goals_met: u32,
    pub step: u64,
    /// Named sub-rewards behind the step reward
    pub terms: Vec<(&'static str, f32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub reward: f32,
    /// Always false; termination is decided by the caller's time limit
    pub episode_done: bool,
    pub info: StepInfo,
}

/// Drives one task through episodes against an injected bridge
pub struct TaskMachine {
    task: Task,
    sampler: PlacementSampler,
    arena_radius: f32,
    phase: TaskPhase,
    progress: Option<TaskProgress>,
}

impl TaskMachine {
    pub fn new(task: Task, sampler: PlacementSampler, arena_radius: f32) -> Self {
        Self {
            task,
            sampler,
            arena_radius,
            phase: TaskPhase::AwaitingLayout,
            progress: None,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    /// Radius the scene is built with on reset
    ///
    /// Relayouts sample inside the bridge's own radius, which is this value
    /// unless the bridge was restored to a state with a different arena.
    pub fn arena_radius(&self) -> f32 {
        self.arena_radius
    }

    pub fn progress(&self) -> Option<&TaskProgress> {
        self.progress.as_ref()
    }

    /// Draw this episode's entities and a full layout for them
    ///
    /// Has no side effects beyond consuming randomness.
    pub fn sample_layout<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(Placements, Layout), ResamplingError> {
        let placements = self.task.setup_placements(rng);
        let layout = self
            .sampler
            .sample(&placements.specs, self.arena_radius, rng)?;
        Ok((placements, layout))
    }

    /// Start an episode: sample a layout, build its scene and reset the bridge
    ///
    /// On [`ResamplingError`] the bridge and any previous progress are left
    /// untouched.
    pub fn reset<B, R>(&mut self, bridge: &mut B, rng: &mut R) -> Result<SceneDescriptor, ResamplingError>
    where
        B: PhysicsBridge,
        R: Rng + ?Sized,
    {
        let (placements, layout) = self.sample_layout(rng)?;
        let scene = self
            .task
            .build_scene(&layout, &placements, self.arena_radius);
        bridge.reset(&scene);

        log::debug!(
            "Episode reset for {} with {} entities",
            self.task.kind(),
            layout.len()
        );

        self.progress = Some(TaskProgress {
            layout,
            placements,
            goal_met: false,
            step: 0,
            goals_met: 0,
        });
        self.phase = TaskPhase::Active;
        Ok(scene)
    }

    /// Score the bridge's current state and re-goal if the sub-goal is met
    ///
    /// The bridge is expected to have been stepped by the caller. When the
    /// sub-goal is met, the relocation is fully applied to the bridge before
    /// this returns. A [`ResamplingError`] during relocation is passed on and
    /// leaves the bridge at the last committed layout. The failed step is not
    /// counted: step index and goal flag keep their previous values.
    ///
    /// # Panics
    /// If called before a successful [`TaskMachine::reset`].
    pub fn step<B, R>(&mut self, bridge: &mut B, rng: &mut R) -> Result<StepOutcome, ResamplingError>
    where
        B: PhysicsBridge,
        R: Rng + ?Sized,
    {
        assert!(
            self.phase == TaskPhase::Active,
            "step called in phase {:?}; reset the task first",
            self.phase
        );

        let breakdown = self.task.compute_reward(&*bridge);
        let goal_met = breakdown.goal_met;

        if goal_met {
            self.relayout(bridge, rng)?;
        }

        let progress = self.progress_mut();
        progress.step += 1;
        progress.goal_met = goal_met;
        if goal_met {
            log::info!(
                "Sub-goal {} met at step {}",
                progress.goals_met,
                progress.step
            );
        }
        Ok(StepOutcome {
            reward: breakdown.reward,
            episode_done: false,
            info: StepInfo {
                goal_met,
                goals_met: progress.goals_met,
                step: progress.step,
                terms: breakdown.terms,
            },
        })
    }

    fn progress_mut(&mut self) -> &mut TaskProgress {
        self.progress
            .as_mut()
            .unwrap_or_else(|| panic!("task has no progress; reset it first"))
    }

    /// Freeze live positions, resample the relocated entities, move them in the bridge
    fn relayout<B, R>(&mut self, bridge: &mut B, rng: &mut R) -> Result<(), ResamplingError>
    where
        B: PhysicsBridge,
        R: Rng + ?Sized,
    {
        self.phase = TaskPhase::Relayout;
        let relocated = self.task.on_relayout();
        let arena_radius = bridge.arena_radius();
        let progress = self
            .progress
            .as_ref()
            .unwrap_or_else(|| panic!("task has no progress; reset it first"));

        // Everything that stays put is pinned where it actually is now
        let mut frozen = progress.layout.clone();
        let specs: Vec<EntitySpec> = progress
            .placements
            .specs
            .iter()
            .map(|spec| {
                if relocated.contains(&spec.name.as_str()) {
                    return spec.clone();
                }
                let live = body_position(&*bridge, &spec.name).truncate();
                frozen.set_position(&spec.name, live);
                EntitySpec {
                    fixed: Some(live),
                    ..spec.clone()
                }
            })
            .collect();

        let sampled = match self.sampler.sample(&specs, arena_radius, rng) {
            Ok(layout) => layout,
            Err(err) => {
                log::warn!("Relayout for {} failed: {}", self.task.kind(), err);
                self.phase = TaskPhase::Active;
                return Err(err);
            }
        };

        let mut partial = Layout::new();
        for &name in relocated {
            let Some(placement) = sampled.get(name) else {
                panic!("relocated entity '{}' is not part of the task", name);
            };
            let z = body_position(&*bridge, name).z;
            bridge.reinitialize(
                name,
                placement.position.extend(z),
                placement.orientation.unwrap_or(Quat::IDENTITY),
            );
            partial.insert(name, *placement);
        }
        frozen.merge(partial);

        let progress = self.progress_mut();
        progress.layout = frozen;
        progress.goals_met += 1;
        log::debug!("Relocated {:?}", relocated);

        self.phase = TaskPhase::Active;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{KinematicBridge, KinematicConfig};
    use crate::placement::SamplerConfig;
    use crate::rng::episode_rng;
    use crate::tasks::{TaskKind, BOX_SIZE, GOAL_SIZE};
    use glam::{Vec2, Vec3};

    fn machine(kind: TaskKind) -> TaskMachine {
        TaskMachine::new(
            kind.build(),
            PlacementSampler::new(SamplerConfig::default()),
            3.0,
        )
    }

    #[test]
    fn test_starts_awaiting_layout() {
        let m = machine(TaskKind::PushBox);
        assert_eq!(m.phase(), TaskPhase::AwaitingLayout);
        assert!(m.progress().is_none());
    }

    #[test]
    #[should_panic(expected = "reset the task first")]
    fn test_step_before_reset_panics() {
        let mut m = machine(TaskKind::PushBox);
        let mut bridge = KinematicBridge::new(KinematicConfig::default());
        let _ = m.step(&mut bridge, &mut episode_rng(0));
    }

    #[test]
    fn test_reset_activates_and_builds_scene() {
        let mut m = machine(TaskKind::PushBox);
        let mut bridge = KinematicBridge::new(KinematicConfig::default());
        let mut rng = episode_rng(1);
        let scene = m.reset(&mut bridge, &mut rng).unwrap();

        assert_eq!(m.phase(), TaskPhase::Active);
        let progress = m.progress().unwrap();
        assert_eq!(progress.layout.len(), scene.bodies.len());
        let box_pos = bridge.position_of("box").unwrap().truncate();
        assert_eq!(Some(box_pos), progress.layout.position("box"));
    }

    #[test]
    fn test_step_without_goal_keeps_layout() {
        let mut m = machine(TaskKind::PushBox);
        let mut bridge = KinematicBridge::new(KinematicConfig::default());
        let mut rng = episode_rng(2);
        m.reset(&mut bridge, &mut rng).unwrap();
        let before = m.progress().unwrap().layout.clone();

        // Opposite sides of the arena, well past the completion distance
        let goal_z = bridge.position_of("goal").unwrap().z;
        let box_z = bridge.position_of("box").unwrap().z;
        bridge.reinitialize("goal", Vec3::new(2.0, 0.0, goal_z), Quat::IDENTITY);
        bridge.reinitialize("box", Vec3::new(-2.0, 0.0, box_z), Quat::IDENTITY);
        let outcome = m.step(&mut bridge, &mut rng).unwrap();

        assert!(!outcome.episode_done);
        assert!(!outcome.info.goal_met);
        assert_eq!(outcome.info.step, 1);
        assert_eq!(outcome.info.goals_met, 0);
        assert_eq!(m.progress().unwrap().layout, before);
        assert_eq!(
            bridge.position_of("goal").unwrap().truncate(),
            Vec2::new(2.0, 0.0)
        );
    }

    #[test]
    fn test_goal_met_relocates_box_and_goal_only() {
        let mut m = machine(TaskKind::PushBox);
        let mut bridge = KinematicBridge::new(KinematicConfig::default());
        let mut rng = episode_rng(3);
        m.reset(&mut bridge, &mut rng).unwrap();

        let goal = bridge.position_of("goal").unwrap();
        let box_z = bridge.position_of("box").unwrap().z;
        bridge.reinitialize(
            "box",
            Vec3::new(goal.x + GOAL_SIZE + BOX_SIZE - 0.01, goal.y, box_z),
            Quat::IDENTITY,
        );
        let robot_before = bridge.position_of("robot").unwrap();
        let box_before = bridge.position_of("box").unwrap();
        let steps_before = bridge.steps();

        let outcome = m.step(&mut bridge, &mut rng).unwrap();

        assert!(outcome.info.goal_met);
        assert!(!outcome.episode_done);
        assert_eq!(outcome.info.goals_met, 1);
        assert_eq!(m.phase(), TaskPhase::Active);
        assert_eq!(bridge.position_of("robot"), Some(robot_before));
        assert_eq!(bridge.steps(), steps_before);
        assert_ne!(bridge.position_of("box"), Some(box_before));
        assert_ne!(bridge.position_of("goal"), Some(goal));

        let layout = &m.progress().unwrap().layout;
        assert_eq!(
            layout.position("box"),
            Some(bridge.position_of("box").unwrap().truncate())
        );
        assert_eq!(
            layout.position("goal"),
            Some(bridge.position_of("goal").unwrap().truncate())
        );
        assert_eq!(layout.position("robot"), Some(robot_before.truncate()));
    }

    #[test]
    fn test_relayout_respects_frozen_robot() {
        let mut m = machine(TaskKind::GoToGoal);
        let mut bridge = KinematicBridge::new(KinematicConfig::default());
        let mut rng = episode_rng(4);
        m.reset(&mut bridge, &mut rng).unwrap();

        for _ in 0..50 {
            let goal = bridge.position_of("goal").unwrap();
            let robot_z = bridge.position_of("robot").unwrap().z;
            bridge.reinitialize("robot", Vec3::new(goal.x, goal.y, robot_z), Quat::IDENTITY);
            let outcome = m.step(&mut bridge, &mut rng).unwrap();
            assert!(outcome.info.goal_met);

            let robot = bridge.position_of("robot").unwrap().truncate();
            let new_goal = bridge.position_of("goal").unwrap().truncate();
            assert!(robot.distance(new_goal) >= crate::tasks::ROBOT_KEEPOUT);
        }
        assert_eq!(m.progress().unwrap().goals_met, 50);
    }

    #[test]
    fn test_relayout_failure_leaves_bridge_untouched() {
        let mut m = TaskMachine::new(
            TaskKind::GoToGoal.build().with_num_obstacles(0),
            PlacementSampler::new(SamplerConfig {
                entity_attempts: 5,
                layout_attempts: 2,
                ..Default::default()
            }),
            3.0,
        );
        let mut bridge = KinematicBridge::new(KinematicConfig::default());
        let mut rng = episode_rng(5);
        m.reset(&mut bridge, &mut rng).unwrap();

        // Shrink the arena so the robot's keepout covers all of it
        let mut state = bridge.save_state();
        state.arena_radius = 0.35;
        for body in &mut state.bodies {
            body.position.x = 0.0;
            body.position.y = 0.0;
        }
        bridge.restore_state(&state);
        let snapshot = bridge.save_state();
        let layout_before = m.progress().unwrap().layout.clone();

        let err = m.step(&mut bridge, &mut rng).unwrap_err();
        assert_eq!(err.stuck_on, "goal");
        assert_eq!(bridge.save_state(), snapshot);
        let progress = m.progress().unwrap();
        assert_eq!(progress.layout, layout_before);
        assert_eq!(progress.step, 0);
        assert!(!progress.goal_met);
        assert_eq!(progress.goals_met, 0);
        assert_eq!(m.phase(), TaskPhase::Active);
    }

    #[test]
    fn test_relayout_samples_inside_bridge_arena() {
        let mut m = machine(TaskKind::GoToGoal);
        let mut bridge = KinematicBridge::new(KinematicConfig::default());
        let mut rng = episode_rng(6);
        m.reset(&mut bridge, &mut rng).unwrap();

        // Restore into a smaller arena with everything clustered at the centre
        let mut state = bridge.save_state();
        state.arena_radius = 1.5;
        for body in &mut state.bodies {
            body.position.x = 0.0;
            body.position.y = 0.0;
        }
        bridge.restore_state(&state);
        assert_eq!(m.arena_radius(), 3.0);

        let outcome = m.step(&mut bridge, &mut rng).unwrap();
        assert!(outcome.info.goal_met);
        let goal = bridge.position_of("goal").unwrap().truncate();
        assert!(goal.length() <= 1.5 - crate::tasks::GOAL_KEEPOUT + 1e-5);
    }
}
