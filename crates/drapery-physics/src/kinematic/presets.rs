//! Reference skeletons for the bundled environments.

use nalgebra::Vector3;

use super::skeleton::{BodySpec, KinematicSkeleton};

/// Three-link arm with 2 + 2 + 1 dofs. The last link is 0.25 long along -y.
#[must_use]
pub fn reacher_arm() -> KinematicSkeleton {
    let (x, z) = (Vector3::x_axis(), Vector3::z_axis());
    let link_com = Vector3::new(0.0, -0.125, 0.0);
    KinematicSkeleton::new(vec![
        BodySpec::new("link1", None, Vector3::zeros())
            .with_axes(&[z, x])
            .with_com(link_com),
        BodySpec::new("link2", Some(0), Vector3::new(0.0, -0.25, 0.0))
            .with_axes(&[z, x])
            .with_com(link_com),
        BodySpec::new("link3", Some(1), Vector3::new(0.0, -0.25, 0.0))
            .with_axes(&[z])
            .with_com(link_com),
    ])
}

/// Fifteen-body humanoid upper body with 22 dofs.
///
/// | body | name | dofs |
/// |---|---|---|
/// | 0 | pelvis | 0, 1 |
/// | 1 | torso | 2 |
/// | 2 | spine | - |
/// | 3 | right shoulder | 3, 4 |
/// | 4 | right upper arm | 5, 6, 7 |
/// | 5 | right forearm | 8 |
/// | 6 | right wrist | 9 |
/// | 7 | right hand | 10 |
/// | 8 | left shoulder | 11, 12 |
/// | 9 | left upper arm | 13, 14, 15 |
/// | 10 | left forearm | 16 |
/// | 11 | left wrist | 17 |
/// | 12 | left hand | 18 |
/// | 13 | neck | 19, 20 |
/// | 14 | head | 21 |
#[must_use]
pub fn upper_body() -> KinematicSkeleton {
    let (x, y, z) = (Vector3::x_axis(), Vector3::y_axis(), Vector3::z_axis());
    let down = |len: f64| Vector3::new(0.0, -len, 0.0);
    KinematicSkeleton::new(vec![
        BodySpec::new("pelvis", None, Vector3::zeros()).with_axes(&[x, z]),
        BodySpec::new("torso", Some(0), Vector3::new(0.0, 0.1, 0.0))
            .with_axes(&[y])
            .with_com(Vector3::new(0.0, 0.15, 0.0)),
        BodySpec::new("spine", Some(1), Vector3::new(0.0, 0.3, 0.0)),
        BodySpec::new("r_shoulder", Some(2), Vector3::new(-0.08, 0.0, 0.0))
            .with_axes(&[y, z])
            .with_com(Vector3::new(-0.05, 0.0, 0.0)),
        BodySpec::new("r_upper_arm", Some(3), Vector3::new(-0.1, 0.0, 0.0))
            .with_axes(&[z, x, y])
            .with_com(down(0.15)),
        BodySpec::new("r_forearm", Some(4), down(0.3))
            .with_axes(&[x])
            .with_com(down(0.125)),
        BodySpec::new("r_wrist", Some(5), down(0.25)).with_axes(&[y]),
        BodySpec::new("r_hand", Some(6), down(0.02))
            .with_axes(&[x])
            .with_com(down(0.05)),
        BodySpec::new("l_shoulder", Some(1), Vector3::new(0.08, 0.3, 0.0))
            .with_axes(&[y, z])
            .with_com(Vector3::new(0.05, 0.0, 0.0)),
        BodySpec::new("l_upper_arm", Some(8), Vector3::new(0.1, 0.0, 0.0))
            .with_axes(&[z, x, y])
            .with_com(down(0.15)),
        BodySpec::new("l_forearm", Some(9), down(0.3))
            .with_axes(&[x])
            .with_com(down(0.125)),
        BodySpec::new("l_wrist", Some(10), down(0.25)).with_axes(&[y]),
        BodySpec::new("l_hand", Some(11), down(0.02))
            .with_axes(&[x])
            .with_com(down(0.05)),
        BodySpec::new("neck", Some(1), Vector3::new(0.0, 0.35, 0.0))
            .with_axes(&[x, z])
            .with_com(Vector3::new(0.0, 0.05, 0.0)),
        BodySpec::new("head", Some(13), Vector3::new(0.0, 0.1, 0.0))
            .with_axes(&[y])
            .with_com(Vector3::new(0.0, 0.12, 0.0)),
    ])
}
