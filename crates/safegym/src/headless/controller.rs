//! Scripted robot controllers
//!
//! Simple hand-written policies so headless episodes exercise contacts and
//! re-goaling without a learned agent.

use glam::Vec2;

use safegym_core::bridge::{body_position, PhysicsBridge};
use safegym_core::tasks::{Task, BOX_SIZE, ROBOT_SIZE};

/// Extra standoff behind the box before committing to a push
const STAGING_GAP: f32 = 0.15;
/// How close to the staging point counts as lined up
const ALIGN_TOLERANCE: f32 = 0.12;
/// Gain pulling the robot back onto the push line
const LINE_GAIN: f32 = 2.0;

/// Greedy controller: drive at the goal, or line up and push the box
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedController;

impl ScriptedController {
    /// Desired planar robot velocity direction (unit length or zero)
    pub fn command(&self, task: &Task, bridge: &impl PhysicsBridge) -> Vec2 {
        let robot = body_position(bridge, "robot").truncate();
        let goal = body_position(bridge, "goal").truncate();

        match task {
            Task::GoToGoal(_) => (goal - robot).normalize_or_zero(),
            Task::PushBox(_) => {
                let boxed = body_position(bridge, "box").truncate();
                push_command(robot, boxed, goal)
            }
        }
    }
}

fn push_command(robot: Vec2, boxed: Vec2, goal: Vec2) -> Vec2 {
    let push_dir = (goal - boxed).normalize_or_zero();
    let contact = ROBOT_SIZE + BOX_SIZE;
    let behind = boxed - push_dir * contact;
    let staging = boxed - push_dir * (contact + STAGING_GAP);

    // In position: push while holding the line
    let lined_up = (robot - boxed).dot(-push_dir) > contact * 0.9
        && (behind - robot).reject_from_normalized(push_dir).length() < ALIGN_TOLERANCE;
    if lined_up {
        return (push_dir + (behind - robot) * LINE_GAIN).normalize_or_zero();
    }

    // Walk to the staging point, skirting the box
    let mut heading = (staging - robot).normalize_or_zero();
    let away = robot - boxed;
    if away.length() < contact + STAGING_GAP * 2.0 {
        heading += away.normalize_or_zero() * 0.8;
        heading += away.perp().normalize_or_zero() * 0.5 * away.perp_dot(push_dir).signum();
    }
    heading.normalize_or_zero()
}
