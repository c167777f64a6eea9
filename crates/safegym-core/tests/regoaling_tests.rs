//! Integration tests for in-episode re-goaling
//!
//! Drives [`TaskMachine`] against the kinematic bridge, including a scripted
//! push that finishes a push-box sub-goal through real stepping.

use glam::{Quat, Vec2, Vec3};
use safegym_core::bridge::{KinematicBridge, KinematicConfig, PhysicsBridge};
use safegym_core::placement::{PlacementSampler, SamplerConfig};
use safegym_core::rng::episode_rng;
use safegym_core::tasks::{TaskKind, TaskMachine, TaskPhase, BOX_SIZE, GOAL_SIZE};

fn push_box_machine() -> TaskMachine {
    TaskMachine::new(
        TaskKind::PushBox.build(),
        PlacementSampler::new(SamplerConfig::default()),
        3.0,
    )
}

fn planar(bridge: &KinematicBridge, name: &str) -> Vec2 {
    bridge.position_of(name).unwrap().truncate()
}

#[test]
fn test_box_on_goal_triggers_fresh_layout() {
    let mut machine = push_box_machine();
    let mut bridge = KinematicBridge::new(KinematicConfig::default());
    let mut rng = episode_rng(42);
    machine.reset(&mut bridge, &mut rng).unwrap();

    let goal = planar(&bridge, "goal");
    let box_z = bridge.position_of("box").unwrap().z;
    let offset = Vec2::new(0.0, GOAL_SIZE + BOX_SIZE - 0.05);
    bridge.reinitialize("box", (goal + offset).extend(box_z), Quat::IDENTITY);
    let box_before = planar(&bridge, "box");

    let outcome = machine.step(&mut bridge, &mut rng).unwrap();

    assert!(outcome.info.goal_met);
    assert!(!outcome.episode_done);
    assert_eq!(machine.phase(), TaskPhase::Active);

    let new_goal = planar(&bridge, "goal");
    let new_box = planar(&bridge, "box");
    assert_ne!(new_goal, goal);
    assert_ne!(new_box, box_before);
    // Fresh layout keeps the box well clear of the goal again
    assert!(new_goal.distance(new_box) >= 0.5);
    assert_eq!(bridge.position_of("box").unwrap().z, box_z);
}

#[test]
fn test_episode_continues_across_many_sub_goals() {
    let mut machine = TaskMachine::new(
        TaskKind::GoToGoal.build(),
        PlacementSampler::new(SamplerConfig::default()),
        3.0,
    );
    let mut bridge = KinematicBridge::new(KinematicConfig::default());
    let mut rng = episode_rng(7);
    machine.reset(&mut bridge, &mut rng).unwrap();

    let obstacle_names: Vec<String> = machine
        .progress()
        .unwrap()
        .placements
        .obstacles
        .iter()
        .map(|o| o.name.clone())
        .collect();

    let mut met = 0;
    for step in 1..=400u64 {
        // Steer straight at the goal; hazards and pushables may deflect us
        let heading = planar(&bridge, "goal") - planar(&bridge, "robot");
        bridge.set_robot_command(heading.normalize_or_zero());
        bridge.step_forward();

        let obstacles_before: Vec<Vec3> = obstacle_names
            .iter()
            .map(|n| bridge.position_of(n).unwrap())
            .collect();
        let outcome = machine.step(&mut bridge, &mut rng).unwrap();
        assert!(!outcome.episode_done);
        assert_eq!(outcome.info.step, step);

        if outcome.info.goal_met {
            met += 1;
            let obstacles_after: Vec<Vec3> = obstacle_names
                .iter()
                .map(|n| bridge.position_of(n).unwrap())
                .collect();
            assert_eq!(obstacles_before, obstacles_after);
        }
    }

    assert_eq!(machine.progress().unwrap().goals_met, met);
    assert_eq!(machine.progress().unwrap().step, 400);
}

#[test]
fn test_scripted_push_meets_goal() {
    let mut machine = TaskMachine::new(
        TaskKind::PushBox.build().with_num_obstacles(0),
        PlacementSampler::new(SamplerConfig::default()),
        3.0,
    );
    let mut bridge = KinematicBridge::new(KinematicConfig::default());
    let mut rng = episode_rng(3);
    machine.reset(&mut bridge, &mut rng).unwrap();

    // Line the robot up behind the box, on the far side from the goal
    let goal = planar(&bridge, "goal");
    let boxed = planar(&bridge, "box");
    let push_dir = (goal - boxed).normalize();
    let robot_z = bridge.position_of("robot").unwrap().z;
    bridge.reinitialize(
        "robot",
        (boxed - push_dir * 0.36).extend(robot_z),
        Quat::IDENTITY,
    );

    let mut goal_met = false;
    for _ in 0..2000 {
        // Push toward the goal while steering back onto the line behind the box
        let boxed = planar(&bridge, "box");
        let push_dir = (goal - boxed).normalize_or_zero();
        let behind = boxed - push_dir * 0.35;
        let command = push_dir + (behind - planar(&bridge, "robot")) * 2.0;
        bridge.set_robot_command(command.normalize_or_zero());
        bridge.step_forward();
        let outcome = machine.step(&mut bridge, &mut rng).unwrap();
        if outcome.info.goal_met {
            assert!(outcome.reward >= 0.5);
            goal_met = true;
            break;
        }
    }

    assert!(goal_met, "box never reached the goal");
    assert_eq!(machine.progress().unwrap().goals_met, 1);
}

#[test]
fn test_relayout_error_keeps_committed_state() {
    let mut machine = TaskMachine::new(
        TaskKind::PushBox.build().with_num_obstacles(0),
        PlacementSampler::new(SamplerConfig {
            entity_attempts: 3,
            layout_attempts: 3,
            ..Default::default()
        }),
        3.0,
    );
    let mut bridge = KinematicBridge::new(KinematicConfig::default());
    let mut rng = episode_rng(12);
    machine.reset(&mut bridge, &mut rng).unwrap();

    // Squeeze the arena until the frozen robot leaves no room for the goal
    let mut state = bridge.save_state();
    state.arena_radius = 0.55;
    for body in &mut state.bodies {
        body.position.x = 0.0;
        body.position.y = 0.0;
    }
    bridge.restore_state(&state);
    let layout_before = machine.progress().unwrap().layout.clone();

    let err = machine.step(&mut bridge, &mut rng).unwrap_err();

    assert_eq!(err.layout_attempts, 3);
    assert_eq!(bridge.save_state(), state);
    assert_eq!(machine.progress().unwrap().layout, layout_before);
    assert_eq!(machine.phase(), TaskPhase::Active);
}
