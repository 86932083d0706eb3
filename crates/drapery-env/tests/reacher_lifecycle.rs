//! Integration test: reacher episodes on the kinematic arm.
//!
//! Checks that seeded resets are reproducible, that actions are clamped
//! before they reach the joints, and that every way an episode can end is
//! reported through `StepResult`.

use nalgebra::Point3;

use drapery_core::prelude::*;
use drapery_env::prelude::*;
use drapery_physics::prelude::*;
use drapery_test_utils::{deterministic_action, reacher_world};

fn env(config: ReacherConfig) -> ReacherEnv<KinematicWorld> {
    ReacherEnv::new(reacher_world(), config).unwrap()
}

#[test]
fn seeded_reset_is_reproducible() {
    let mut a = env(ReacherConfig::default());
    let mut b = env(ReacherConfig::default());

    let ra = a.reset(Some(7)).unwrap();
    let rb = b.reset(Some(7)).unwrap();
    assert_eq!(ra.observation, rb.observation);
    assert_eq!(a.target(), b.target());

    let action = deterministic_action(5, 3);
    let sa = a.step(&action).unwrap();
    let sb = b.step(&action).unwrap();
    assert_eq!(sa.observation, sb.observation);
    assert_eq!(sa.reward.to_bits(), sb.reward.to_bits());
}

#[test]
fn different_seeds_move_the_target() {
    let mut e = env(ReacherConfig::default());
    e.reset(Some(1)).unwrap();
    let first = *e.target();
    e.reset(Some(2)).unwrap();
    assert_ne!(first, *e.target());
}

#[test]
fn observation_matches_space() {
    let mut e = env(ReacherConfig::default());
    let reset = e.reset(Some(0)).unwrap();
    assert_eq!(reset.observation.len(), e.observation_space().size());
    assert_eq!(reset.observation.len(), 21);
    assert!(reset.observation.is_finite());
    assert_eq!(e.action_space().size(), 5);
}

#[test]
fn actions_are_clamped_before_scaling() {
    let config = ReacherConfig {
        reset_noise: 0.0,
        ..ReacherConfig::default()
    };
    let mut e = env(config);
    e.reset(Some(0)).unwrap();
    e.set_target(Point3::new(1.0, 1.0, 0.0));

    e.step(&Action::new(vec![100.0, -100.0, 0.5, 0.0, 1.0])).unwrap();
    // four sub-steps of dq += tau * 0.01
    let dq = e.world().robot().velocities();
    let expected = [0.4, -0.4, 0.2, 0.0, 0.4];
    for (v, x) in dq.iter().zip(expected) {
        assert!((v - x).abs() < 1e-9, "{v} != {x}");
    }
}

#[test]
fn reward_is_table_total_while_running() {
    let mut e = env(ReacherConfig::default());
    e.reset(Some(4)).unwrap();
    e.set_target(Point3::new(1.0, 1.0, 0.0));
    for seed in 0..5 {
        let result = e.step(&deterministic_action(5, seed)).unwrap();
        assert!(!result.terminated);
        #[allow(clippy::cast_possible_truncation)]
        let total = e.rewards().total() as f32;
        assert!((result.reward - total).abs() < 1e-4);
        assert_eq!(result.info.aux.len(), 4);
        assert!((result.info.aux[3] - result.reward).abs() < 1e-4);
        assert_eq!(result.info.reward_terms.len(), 3);
    }
}

#[test]
fn non_finite_state_ends_with_penalty() {
    let mut e = env(ReacherConfig::default());
    e.reset(Some(0)).unwrap();
    e.set_target(Point3::new(1.0, 1.0, 0.0));
    e.world_mut()
        .robot_mut()
        .set_velocities(&[f64::NAN; 5])
        .unwrap();

    let result = e.step(&Action::zeros(5)).unwrap();
    assert!(result.terminated);
    assert!((result.reward + 2500.0).abs() < f32::EPSILON);
    assert_eq!(result.info.termination.as_deref(), Some("non_finite"));
    assert_eq!(e.last_termination(), Some(TerminationCause::NonFinite));
    assert!(e.episode().is_done());
}

#[test]
fn reaching_the_target_terminates() {
    let mut e = env(ReacherConfig::default());
    e.reset(Some(0)).unwrap();
    let tip = e.fingertip();
    e.set_target(tip);

    let result = e.step(&Action::zeros(5)).unwrap();
    assert!(result.terminated);
    assert_eq!(e.last_termination(), Some(TerminationCause::ReachedTarget));
}

#[test]
fn beyond_threshold_rule_ends_far_episodes() {
    let config = ReacherConfig {
        termination: DistanceTermination::BeyondThreshold,
        ..ReacherConfig::default()
    };
    let mut e = env(config);
    e.reset(Some(0)).unwrap();
    e.set_target(Point3::new(1.0, 1.0, 0.0));
    assert!(e.step(&Action::zeros(5)).unwrap().terminated);
}

#[test]
fn episode_truncates_at_step_limit() {
    let config = ReacherConfig {
        max_episode_steps: 3,
        ..ReacherConfig::default()
    };
    let mut e = env(config);
    e.reset(Some(0)).unwrap();
    e.set_target(Point3::new(1.0, 1.0, 0.0));

    let results: Vec<_> = (0..3).map(|_| e.step(&Action::zeros(5)).unwrap()).collect();
    assert!(results[..2].iter().all(|r| !r.done()));
    assert!(results[2].truncated);
    assert!(!results[2].terminated);
    assert_eq!(results[2].info.episode_length, 3);
}

#[test]
fn stats_collect_finished_episodes() {
    let mut e = env(ReacherConfig {
        max_episode_steps: 2,
        ..ReacherConfig::default()
    });
    let mut stats = EpisodeStats::new();
    for seed in 0..3 {
        e.reset(Some(seed)).unwrap();
        e.set_target(Point3::new(1.0, 1.0, 0.0));
        while !e.step(&Action::zeros(5)).unwrap().done() {}
        stats.record(e.episode(), e.last_termination());
    }
    assert_eq!(stats.episodes_completed, 3);
    assert!((stats.mean_episode_length().unwrap() - 2.0).abs() < f64::EPSILON);
}
