//! Skeleton-derived quantities shared by rewards, terminations and rendering.

use nalgebra::{Point3, Vector3};

use drapery_physics::backend::Skeleton;

use super::layout::{
    BICEP_CORE, BICEP_TOP, HEAD, HEAD_TOP, LEFT_UPPER_ARM, NECK, PASSIVE_ELBOW, RIGHT_FOREARM,
    RIGHT_UPPER_ARM, TORSO,
};

fn point(p: [f64; 3]) -> Point3<f64> {
    Point3::from(Vector3::from(p))
}

/// World position of a point given in a body frame.
pub fn body_point<S: Skeleton + ?Sized>(skeleton: &S, body: usize, local: [f64; 3]) -> Point3<f64> {
    skeleton.to_world(body, &point(local))
}

/// Neck base, head base and head top.
pub fn head_chain<S: Skeleton + ?Sized>(skeleton: &S) -> [Point3<f64>; 3] {
    [
        skeleton.to_world(NECK, &Point3::origin()),
        skeleton.to_world(HEAD, &Point3::origin()),
        body_point(skeleton, HEAD, HEAD_TOP),
    ]
}

/// Height of the right elbow above the higher shoulder, in the torso frame.
///
/// Zero while the elbow is below both shoulders.
pub fn elbow_elevation<S: Skeleton + ?Sized>(skeleton: &S) -> f64 {
    let in_torso = |body: usize| {
        let world = skeleton.to_world(body, &Point3::origin());
        skeleton.to_local(TORSO, &world).y
    };
    let shoulder_r = in_torso(RIGHT_UPPER_ARM);
    let shoulder_l = in_torso(LEFT_UPPER_ARM);
    let elbow = in_torso(RIGHT_FOREARM);
    if elbow > shoulder_l || elbow > shoulder_r {
        (elbow - shoulder_l).max(elbow - shoulder_r)
    } else {
        0.0
    }
}

/// Bicep "up" direction and the direction toward the passive elbow, both
/// from the bicep centre. `None` when either is degenerate.
pub fn bicep_directions<S: Skeleton + ?Sized>(
    skeleton: &S,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let core = body_point(skeleton, RIGHT_UPPER_ARM, BICEP_CORE);
    let up = (body_point(skeleton, RIGHT_UPPER_ARM, BICEP_TOP) - core).try_normalize(f64::EPSILON)?;
    let toward = (skeleton.body_com(PASSIVE_ELBOW) - core).try_normalize(f64::EPSILON)?;
    Some((up, toward))
}

/// Alignment of the bicep with the passive elbow, in `[-1, 1]`.
pub fn bicep_alignment<S: Skeleton + ?Sized>(skeleton: &S) -> f64 {
    bicep_directions(skeleton).map_or(0.0, |(up, toward)| up.dot(&toward))
}

/// Centres of mass of every body.
pub fn body_coms<S: Skeleton + ?Sized>(skeleton: &S) -> Vec<Point3<f64>> {
    (0..skeleton.num_bodies()).map(|b| skeleton.body_com(b)).collect()
}

/// Parent-to-child segments between body origins.
pub fn links<S: Skeleton + ?Sized>(skeleton: &S) -> Vec<[Point3<f64>; 2]> {
    (0..skeleton.num_bodies())
        .filter_map(|b| {
            skeleton.parent(b).map(|p| {
                [
                    skeleton.to_world(p, &Point3::origin()),
                    skeleton.to_world(b, &Point3::origin()),
                ]
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use drapery_physics::kinematic::presets::upper_body;

    #[test]
    fn head_chain_rises() {
        let body = upper_body();
        let [neck, head, top] = head_chain(&body);
        assert!(neck.y < head.y && head.y < top.y);
    }

    #[test]
    fn elbow_below_shoulders_is_zero() {
        let body = upper_body();
        assert!(elbow_elevation(&body).abs() < f64::EPSILON);
    }

    #[test]
    fn raised_elbow_is_positive() {
        let mut body = upper_body();
        let mut q = vec![0.0; body.ndofs()];
        // right shoulder about z lifts the arm sideways past horizontal
        q[4] = -2.5;
        body.set_positions(&q).unwrap();
        assert!(elbow_elevation(&body) > 0.1);
    }

    #[test]
    fn bicep_alignment_is_bounded() {
        let body = upper_body();
        let value = bicep_alignment(&body);
        assert!((-1.0..=1.0).contains(&value));
    }

    #[test]
    fn links_skip_the_root() {
        let body = upper_body();
        assert_eq!(links(&body).len(), body.num_bodies() - 1);
        assert_eq!(body_coms(&body).len(), 15);
    }
}
