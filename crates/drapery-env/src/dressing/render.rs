//! Debug draw list of the dressing task.

use nalgebra::Point3;

use drapery_core::render::{Bar, CameraSetup, Color, DrawCommand};
use drapery_core::traits::DebugRender;
use drapery_physics::backend::{PhysicsWorld, Skeleton};
use drapery_physics::cloth::ClothWorld;
use drapery_physics::feature::ClothFeature;

use super::DressingEnv;
use super::config::RewardTermKind;
use super::layout::{
    ARM_GUIDE, BICEP_CORE, BICEP_TOP, LEFT_HAND, LEFT_UPPER_ARM, PASSIVE_ELBOW, RIGHT_HAND,
    RIGHT_UPPER_ARM,
};
use super::pose;
use crate::to_array;

const TEXT_LINE: f64 = 0.03;

fn polygon(feature: &ClothFeature, color: Color) -> Option<DrawCommand> {
    let points = feature.polygon_world();
    (!points.is_empty()).then(|| DrawCommand::Polygon {
        points: points.iter().map(to_array).collect(),
        color,
    })
}

fn segments(pairs: &[[Point3<f64>; 2]], color: Color) -> DrawCommand {
    DrawCommand::Lines {
        segments: pairs.iter().map(|[a, b]| [to_array(a), to_array(b)]).collect(),
        color,
    }
}

impl<W: ClothWorld> DressingEnv<W> {
    fn target_commands(&self, target: &Point3<f64>, hand: usize, color: Color) -> Vec<DrawCommand> {
        let mut cmds = Vec::with_capacity(3);
        if self.config.reward.target_tiering {
            cmds.push(DrawCommand::Sphere {
                center: to_array(target),
                radius: 0.1,
                color,
                solid: false,
            });
        }
        cmds.push(DrawCommand::Sphere {
            center: to_array(target),
            radius: 0.02,
            color,
            solid: true,
        });
        cmds.push(DrawCommand::LineStrip {
            points: vec![to_array(target), to_array(&self.fingertip(hand))],
            color,
        });
        cmds
    }

    fn overlay_commands(&self) -> Vec<DrawCommand> {
        let bars = self
            .rewards
            .table()
            .normalized()
            .into_iter()
            .map(|(label, fraction)| Bar {
                label: label.to_string(),
                fraction,
                color: Color::BLUE,
            })
            .collect();
        let mut cmds = vec![DrawCommand::Bars {
            origin: [0.67, 0.02],
            size: [0.31, 0.96],
            bars,
        }];

        let lines = [
            format!("Steps = {}", self.episode.step_count),
            format!("Reward = {}", self.last_reward),
            format!("Cumulative Reward = {}", self.episode.total_reward),
        ];
        cmds.extend(lines.into_iter().zip(2_u32..).map(|(text, line)| DrawCommand::Text {
            position: [0.01, f64::from(line) * TEXT_LINE],
            text,
            color: Color::BLACK,
        }));

        if self.episode.step_count > 0 {
            let robot = self.world.robot();
            let fractions = robot
                .positions()
                .iter()
                .zip(robot.position_limits())
                .map(|(q, (lo, hi))| {
                    if hi > lo {
                        ((q - lo) / (hi - lo)).clamp(0.0, 1.0)
                    } else {
                        0.5
                    }
                })
                .collect();
            cmds.push(DrawCommand::DofBars {
                origin: [0.01, 0.2],
                size: [0.3, 0.25],
                fractions,
            });
        }

        cmds.push(DrawCommand::ProgressBar {
            origin: [0.47, 0.02],
            size: [0.05, 0.02],
            fraction: (-self.rewards.last_deformation()).clamp(0.0, 1.0),
            color: Color::RED,
        });
        cmds
    }
}

impl<W: ClothWorld> DebugRender for DressingEnv<W> {
    fn viewer_setup(&self) -> CameraSetup {
        CameraSetup {
            translation: [0.0, -0.2, -2.5],
            theta: 0.0,
            track_skeleton: None,
        }
    }

    fn extra_render(&self) -> Vec<DrawCommand> {
        let robot = self.world.robot();
        let mut cmds = vec![DrawCommand::Lines {
            segments: vec![[[0.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]],
            color: Color::BLACK,
        }];

        cmds.push(DrawCommand::LineStrip {
            points: pose::head_chain(robot).iter().map(to_array).collect(),
            color: Color::BLACK,
        });
        cmds.extend(polygon(&self.collar, Color::GREY));
        cmds.extend(polygon(&self.grip_left, Color::RED));
        cmds.extend(polygon(&self.grip_right, Color::GREEN));
        if let Some(plane) = self.grip_right.plane() {
            cmds.push(segments(
                &[[plane.centroid, plane.centroid + plane.normal * 0.1]],
                Color::GREEN,
            ));
        }

        let guides: Vec<[Point3<f64>; 2]> = [RIGHT_UPPER_ARM, LEFT_UPPER_ARM]
            .iter()
            .map(|body| ARM_GUIDE.map(|p| pose::body_point(robot, *body, p)))
            .collect();
        cmds.push(segments(&guides, Color::BLACK));

        if self.rewards.enabled(RewardTermKind::RestComs) {
            let drift: Vec<[Point3<f64>; 2]> = pose::body_coms(robot)
                .into_iter()
                .zip(&self.rest_coms)
                .map(|(com, rest)| [com, *rest])
                .collect();
            cmds.push(segments(&drift, Color::YELLOW));
        }
        if self.rewards.enabled(RewardTermKind::BicepIn) {
            let core = pose::body_point(robot, RIGHT_UPPER_ARM, BICEP_CORE);
            let top = pose::body_point(robot, RIGHT_UPPER_ARM, BICEP_TOP);
            let elbow = robot.body_com(PASSIVE_ELBOW);
            cmds.push(segments(&[[elbow, core], [core, top]], Color::BLACK));
        }
        if self.rewards.enabled(RewardTermKind::RestPose) {
            cmds.push(segments(&self.rest_links, Color::GREY));
        }

        if self.rewards.enabled(RewardTermKind::RightTarget) {
            cmds.extend(self.target_commands(&self.right_target, RIGHT_HAND, Color::RED));
        }
        if self.rewards.enabled(RewardTermKind::LeftTarget) {
            cmds.extend(self.target_commands(&self.left_target, LEFT_HAND, Color::GREEN));
        }

        cmds.extend(self.overlay_commands());
        cmds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_feature_draws_nothing() {
        let feature = ClothFeature::new(vec![0, 1, 2]);
        assert!(polygon(&feature, Color::RED).is_none());
    }

    #[test]
    fn segments_keep_pairs() {
        let cmd = segments(
            &[[Point3::origin(), Point3::new(1.0, 0.0, 0.0)]],
            Color::BLACK,
        );
        match cmd {
            DrawCommand::Lines { segments, .. } => {
                assert_eq!(segments.len(), 1);
                assert!((segments[0][1][0] - 1.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected {}", other.kind()),
        }
    }
}
