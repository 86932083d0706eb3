//! Body indices of the upper-body skeleton and vertex indices of the garment.

// ---------------------------------------------------------------------------
// Skeleton
// ---------------------------------------------------------------------------

pub const TORSO: usize = 1;
pub const RIGHT_SHOULDER: usize = 3;
pub const RIGHT_UPPER_ARM: usize = 4;
/// The right elbow joint sits at this body's origin.
pub const RIGHT_FOREARM: usize = 5;
pub const RIGHT_HAND: usize = 7;
pub const LEFT_SHOULDER: usize = 8;
pub const LEFT_UPPER_ARM: usize = 9;
/// The COM of this body stands in for the passive (left) elbow.
pub const PASSIVE_ELBOW: usize = 10;
/// Drives the handle node holding the left grip.
pub const LEFT_HAND: usize = 12;
pub const NECK: usize = 13;
pub const HEAD: usize = 14;

/// Top of the head in the head frame.
pub const HEAD_TOP: [f64; 3] = [0.0, 0.25, 0.0];

/// Bicep surface point and its centre, in the upper-arm frame.
pub const BICEP_TOP: [f64; 3] = [0.0, -0.15, -0.075];
pub const BICEP_CORE: [f64; 3] = [0.0, -0.15, 0.0];

/// Upper-arm guide line drawn in the debug overlay, in the upper-arm frame.
pub const ARM_GUIDE: [[f64; 3]; 2] = [[0.0, 0.0, -0.075], [0.0, -0.3, -0.075]];

/// Pelvis tilt dofs.
pub const UPRIGHT_DOFS: [usize; 2] = [0, 1];
/// Neck dofs.
pub const HEAD_DOFS: [usize; 2] = [19, 20];

/// Default rest pose of the 22-dof upper body.
pub const REST_POSE: [f64; 22] = [
    -0.210_940_942_604,
    -0.060_243_624_185_8,
    0.785_540_563_981,
    0.132_571_030_392,
    -0.25,
    -0.580_739_841_458,
    -0.803_858_324_899,
    -1.472,
    1.273_013_941_96,
    -0.295_286_198_863,
    0.611_311_245_326,
    0.245_333_463_513,
    0.225_511_476_131,
    1.200_630_536_43,
    -0.050_179_492_142_6,
    1.191_225_096_95,
    1.975_197_221_98,
    -0.573_360_432_341,
    0.321_222_466_527,
    0.580_323_061_076,
    -0.422_112_755_785,
    -0.997_819_593_165,
];

// ---------------------------------------------------------------------------
// Garment
// ---------------------------------------------------------------------------

/// Collar loop of the t-shirt mesh.
pub const COLLAR: [usize; 11] = [117, 115, 113, 900, 108, 197, 194, 8, 188, 5, 120];

/// Patch held by the left hand.
pub const GRIP_LEFT: [usize; 15] = [
    46, 437, 955, 1185, 47, 285, 711, 677, 48, 905, 1041, 49, 741, 889, 45,
];
pub const GRIP_LEFT_SPANS: ([usize; 2], [usize; 2]) = ([889, 1041], [47, 677]);

/// Patch the right hand reaches for.
pub const GRIP_RIGHT: [usize; 16] = [
    905, 1041, 49, 435, 50, 570, 992, 1056, 51, 676, 283, 52, 489, 892, 362, 53,
];
pub const GRIP_RIGHT_SPANS: ([usize; 2], [usize; 2]) = ([362, 889], [51, 992]);

/// Initial handle-node origin before it snaps to the grip centroid.
pub const HANDLE_ORIGIN: [f64; 3] = [0.05, 0.034, -0.975];

/// Offset of the right target along the grip's average normal.
pub const TARGET_NORMAL_OFFSET: f64 = 0.03;

/// Smallest dof count the upright and head terms can read.
#[must_use]
pub fn required_dofs() -> usize {
    UPRIGHT_DOFS
        .iter()
        .chain(&HEAD_DOFS)
        .max()
        .map_or(0, |d| d + 1)
}

/// Smallest vertex count a garment needs to carry every feature above.
#[must_use]
pub fn required_vertices() -> usize {
    COLLAR
        .iter()
        .chain(&GRIP_LEFT)
        .chain(&GRIP_RIGHT)
        .chain(&[GRIP_LEFT_SPANS.0, GRIP_LEFT_SPANS.1].concat())
        .chain(&[GRIP_RIGHT_SPANS.0, GRIP_RIGHT_SPANS.1].concat())
        .max()
        .map_or(0, |v| v + 1)
}
