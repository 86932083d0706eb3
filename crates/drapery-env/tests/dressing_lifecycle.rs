//! Integration test: dressing episodes on the kinematic upper body.
//!
//! The garment is a synthetic grid whose collar vertices ring the neck at
//! the rest pose, so a motionless character keeps the collar on and any
//! large torso motion pulls it off.

use drapery_core::prelude::*;
use drapery_env::dressing::layout::{COLLAR, HEAD, NECK, REST_POSE};
use drapery_env::prelude::*;
use drapery_physics::prelude::*;
use drapery_physics::kinematic::BodySpec;
use drapery_test_utils::fixtures::{DT, GARMENT_COLS, GARMENT_ROWS, GARMENT_SENSORS};
use drapery_test_utils::{
    deterministic_action, dressing_world, grid_garment, temp_dir, write_reset_distribution,
};
use nalgebra::Vector3;

const DOFS: usize = 22;

fn world() -> KinematicClothWorld {
    dressing_world(&COLLAR, &REST_POSE, NECK, HEAD)
}

fn env(config: DressingConfig) -> DressingEnv<KinematicClothWorld> {
    DressingEnv::new(world(), config).unwrap()
}

fn distribution(tag: &str, size: usize, velocity_noise: f64) -> ResetConfig {
    let dir = temp_dir(tag);
    let manifest = write_reset_distribution(&world(), &dir, "state", 3);
    ResetConfig::Distribution {
        manifest,
        size,
        velocity_noise,
    }
}

// ---- lifecycle ----

#[test]
fn reset_then_idle_steps_keep_collar_on() {
    let mut e = env(DressingConfig::default());
    let reset = e.reset(Some(0)).unwrap();
    assert_eq!(reset.observation.len(), 163);
    assert!(reset.observation.is_finite());
    assert_eq!(reset.info.reset_state, None);

    for _ in 0..5 {
        let result = e.step(&Action::zeros(DOFS)).unwrap();
        assert!(!result.done(), "{:?}", result.info.termination);
        assert!(result.reward.is_finite());
        #[allow(clippy::cast_possible_truncation)]
        let total = e.rewards().table().total() as f32;
        assert!((result.reward - total).abs() < 1e-3);
    }
    assert!(e.collar().plane().is_some());
    assert_eq!(e.episode().step_count, 5);
}

#[test]
fn handle_holds_the_left_grip() {
    let mut e = env(DressingConfig::default());
    e.reset(Some(0)).unwrap();
    assert!(e.handle().is_some());
    let pinned: Vec<usize> = e.world().cloth().pinned().collect();
    assert_eq!(pinned.len(), 15);

    let no_cloth = env(DressingConfig {
        simulate_cloth: false,
        ..DressingConfig::default()
    });
    assert!(no_cloth.handle().is_none());
}

#[test]
fn torso_motion_pulls_the_collar_off() {
    let mut e = env(DressingConfig::default());
    e.reset(Some(0)).unwrap();
    let mut q = REST_POSE.to_vec();
    q[0] = 1.5;
    e.world_mut().robot_mut().set_positions(&q).unwrap();

    // the first step is inside the cooldown
    assert!(!e.step(&Action::zeros(DOFS)).unwrap().done());
    let result = e.step(&Action::zeros(DOFS)).unwrap();
    assert!(result.terminated);
    assert!((result.reward + 2500.0).abs() < f32::EPSILON);
    assert_eq!(e.last_termination(), Some(TerminationCause::CollarOff));
}

#[test]
fn collar_check_is_skipped_without_cloth() {
    let mut e = env(DressingConfig {
        simulate_cloth: false,
        ..DressingConfig::default()
    });
    e.reset(Some(0)).unwrap();
    let mut q = REST_POSE.to_vec();
    q[0] = 1.5;
    e.world_mut().robot_mut().set_positions(&q).unwrap();
    for _ in 0..3 {
        assert!(!e.step(&Action::zeros(DOFS)).unwrap().done());
    }
}

#[test]
fn non_finite_state_ends_with_penalty() {
    let mut e = env(DressingConfig::default());
    e.reset(Some(0)).unwrap();
    e.world_mut()
        .robot_mut()
        .set_velocities(&[f64::NAN; DOFS])
        .unwrap();

    let result = e.step(&Action::zeros(DOFS)).unwrap();
    assert!(result.terminated);
    assert!((result.reward + 2500.0).abs() < f32::EPSILON);
    assert_eq!(e.last_termination(), Some(TerminationCause::NonFinite));
}

#[test]
fn actions_are_clamped_before_scaling() {
    let mut e = env(DressingConfig::default());
    e.reset(Some(0)).unwrap();
    e.step(&Action::new(vec![100.0; DOFS])).unwrap();
    // four sub-steps of dq += 12 * 0.01
    for v in e.world().robot().velocities() {
        assert!((v - 0.48).abs() < 1e-9, "{v}");
    }
}

#[test]
fn wrong_action_length_is_rejected() {
    let mut e = env(DressingConfig::default());
    e.reset(Some(0)).unwrap();
    assert!(matches!(
        e.step(&Action::zeros(5)),
        Err(DraperyError::Validation(
            ValidationError::ActionDimMismatch { .. }
        ))
    ));
}

#[test]
fn step_limit_truncates() {
    let mut e = env(DressingConfig {
        max_episode_steps: 2,
        ..DressingConfig::default()
    });
    e.reset(Some(0)).unwrap();
    assert!(!e.step(&Action::zeros(DOFS)).unwrap().done());
    let last = e.step(&Action::zeros(DOFS)).unwrap();
    assert!(last.truncated);
    assert!(!last.terminated);
}

// ---- observation ----

#[test]
fn observation_length_follows_flags() {
    for bits in 0..16_u8 {
        let mut config = DressingConfig::default();
        config.observation.prev_action = bits & 1 != 0;
        config.observation.haptics = bits & 2 != 0;
        config.observation.contact_ids = bits & 4 != 0;
        let left = bits & 8 != 0;
        if left {
            config.reward = config.reward.with_term(RewardTermKind::LeftTarget);
        }

        let mut expected = 3 * DOFS + 9;
        if config.observation.prev_action {
            expected += DOFS;
        }
        if config.observation.haptics {
            expected += 3 * GARMENT_SENSORS;
        }
        if config.observation.contact_ids {
            expected += GARMENT_SENSORS;
        }
        if left {
            expected += 9;
        }

        let mut e = env(config);
        assert_eq!(e.observation_space().size(), expected, "flags {bits:04b}");
        let reset = e.reset(Some(1)).unwrap();
        assert_eq!(reset.observation.len(), expected);
        let step = e.step(&deterministic_action(DOFS, 1)).unwrap();
        assert_eq!(step.observation.len(), expected);
    }
}

#[test]
fn previous_action_is_observed_as_torque() {
    let mut config = DressingConfig::default();
    config.observation.prev_action = true;
    let mut e = env(config);
    let reset = e.reset(Some(0)).unwrap();
    assert!(reset.observation.as_slice()[3 * DOFS..4 * DOFS]
        .iter()
        .all(|v| v.abs() < f32::EPSILON));

    let step = e.step(&Action::new(vec![0.5; DOFS])).unwrap();
    assert!(step.observation.as_slice()[3 * DOFS..4 * DOFS]
        .iter()
        .all(|v| (v - 6.0).abs() < 1e-6));
}

// ---- reset distribution ----

#[test]
fn seeded_distribution_reset_is_reproducible() {
    let reset = distribution("dress-determinism", 3, 0.2);
    let config = DressingConfig {
        reset,
        ..DressingConfig::default()
    };
    let mut a = env(config.clone());
    let mut b = env(config);

    let ra = a.reset(Some(11)).unwrap();
    let rb = b.reset(Some(11)).unwrap();
    assert_eq!(ra.observation, rb.observation);
    assert_eq!(ra.info.reset_state, rb.info.reset_state);

    let action = deterministic_action(DOFS, 5);
    let sa = a.step(&action).unwrap();
    let sb = b.step(&action).unwrap();
    assert_eq!(sa.observation, sb.observation);
    assert_eq!(sa.reward.to_bits(), sb.reward.to_bits());
}

#[test]
fn distribution_reset_loads_sampled_state() {
    let mut e = env(DressingConfig {
        reset: distribution("dress-sample", 3, 0.0),
        ..DressingConfig::default()
    });
    for seed in 0..6 {
        let reset = e.reset(Some(seed)).unwrap();
        let index = reset.info.reset_state.unwrap();
        assert!(index < 3);
        #[allow(clippy::cast_precision_loss)]
        let expected = index as f64;
        for v in e.world().robot().velocities() {
            assert!((v - expected).abs() < 1e-12);
        }
    }
    assert_eq!(e.world().cloth().num_reset_states(), 3);
}

#[test]
fn distribution_larger_than_manifest_is_rejected() {
    let result = DressingEnv::new(
        world(),
        DressingConfig {
            reset: distribution("dress-too-big", 5, 0.0),
            ..DressingConfig::default()
        },
    );
    assert!(matches!(
        result,
        Err(DraperyError::Manifest(ManifestError::TooFewEntries {
            available: 3,
            requested: 5
        }))
    ));
}

#[test]
fn skeleton_without_neck_dofs_is_rejected() {
    // enough bodies for every layout index, but only ten dofs
    let bodies = (0usize..15)
        .map(|i| {
            let body = BodySpec::new(format!("b{i}"), i.checked_sub(1), Vector3::y() * 0.1);
            if i < 10 { body.with_axes(&[Vector3::x_axis()]) } else { body }
        })
        .collect();
    let cloth = MeshCloth::from_mesh(grid_garment(GARMENT_COLS, GARMENT_ROWS), GARMENT_SENSORS);
    let world = KinematicClothWorld::new(KinematicSkeleton::new(bodies), cloth, DT);
    let config = DressingConfig {
        action: ActionConfig::uniform(10, 1.0, 12.0),
        rest_pose: vec![0.0; 10],
        ..DressingConfig::default()
    };
    assert!(config.validate().is_ok());

    let result = DressingEnv::new(world, config);
    assert!(matches!(
        result,
        Err(DraperyError::Config(ConfigError::InvalidValue { ref field, .. })) if field == "skeleton"
    ));
}

// ---- state saving ----

#[test]
fn state_is_saved_after_the_first_episode() {
    let dir = temp_dir("dress-save");
    let path = dir.join("saved.toml");
    let save = SaveConfig {
        manifest: path.clone(),
        prefix: "saved".into(),
        at_step: 2,
    };
    let mut e = env(DressingConfig {
        save: Some(save),
        ..DressingConfig::default()
    });

    e.reset(Some(0)).unwrap();
    for _ in 0..4 {
        e.step(&Action::zeros(DOFS)).unwrap();
    }
    assert!(e.last_saved().is_none());

    e.reset(Some(1)).unwrap();
    for _ in 0..4 {
        e.step(&Action::zeros(DOFS)).unwrap();
    }
    let entry = e.last_saved().cloned().unwrap();
    assert_eq!(entry.index, 0);

    let manifest = ResetManifest::load(&path).unwrap();
    assert_eq!(manifest.len(), 1);
    assert!(manifest.mesh_path(&entry).is_file());
    let state = SkeletonState::load(manifest.character_path(&entry)).unwrap();
    assert_eq!(state.positions.len(), DOFS);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn state_is_saved_under_a_prefix_subdirectory() {
    let dir = temp_dir("dress-save-subdir");
    let path = dir.join("saved.toml");
    let save = SaveConfig {
        manifest: path.clone(),
        prefix: "saved_control_states/matchgrip_reduced".into(),
        at_step: 1,
    };
    let mut e = env(DressingConfig {
        save: Some(save),
        ..DressingConfig::default()
    });

    e.reset(Some(0)).unwrap();
    e.step(&Action::zeros(DOFS)).unwrap();
    e.reset(Some(1)).unwrap();
    e.step(&Action::zeros(DOFS)).unwrap();
    e.step(&Action::zeros(DOFS)).unwrap();

    let entry = e.last_saved().cloned().unwrap();
    assert_eq!(
        entry.mesh,
        std::path::PathBuf::from("saved_control_states/matchgrip_reduced00000.obj")
    );
    let manifest = ResetManifest::load(&path).unwrap();
    assert_eq!(manifest.len(), 1);
    assert!(manifest.mesh_path(&entry).is_file());
    assert!(manifest.character_path(&entry).is_file());
    let _ = std::fs::remove_dir_all(&dir);
}

// ---- render ----

#[test]
fn render_draws_targets_and_overlay() {
    let mut e = env(DressingConfig::default());
    e.reset(Some(0)).unwrap();
    e.step(&Action::zeros(DOFS)).unwrap();

    let cmds = e.extra_render();
    let kinds: Vec<&str> = cmds.iter().map(DrawCommand::kind).collect();
    assert!(kinds.contains(&"sphere"));
    assert!(kinds.contains(&"polygon"));
    assert!(kinds.contains(&"bars"));
    assert!(kinds.contains(&"dof_bars"));
    assert!((e.viewer_setup().translation[2] + 2.5).abs() < f64::EPSILON);

    let json = serde_json::to_value(&cmds).unwrap();
    assert_eq!(json[0]["kind"], "lines");
}
