//! Worlds, garments and on-disk reset states for environment tests.

use std::path::{Path, PathBuf};

use nalgebra::{Point3, Vector3};

use drapery_core::manifest::ResetManifest;
use drapery_physics::backend::{PhysicsWorld, Skeleton};
use drapery_physics::cloth::{ClothScene, ClothWorld};
use drapery_physics::kinematic::{KinematicClothWorld, KinematicWorld, MeshCloth, presets};
use drapery_physics::mesh::ObjMesh;

/// Sub-step of every fixture world.
pub const DT: f64 = 0.01;

pub const GARMENT_COLS: usize = 40;
pub const GARMENT_ROWS: usize = 30;
pub const GARMENT_SENSORS: usize = 22;

const GARMENT_SPACING: f64 = 0.02;
const GARMENT_DEPTH: f64 = -0.4;
const COLLAR_RADIUS: f64 = 0.12;

/// Five-dof reacher arm with its tip at `(0, -0.75, 0)`.
#[must_use]
pub fn reacher_world() -> KinematicWorld {
    KinematicWorld::new(presets::reacher_arm(), DT)
}

/// Flat triangulated grid of `cols * rows` vertices in front of the body.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn grid_garment(cols: usize, rows: usize) -> ObjMesh {
    let at = |c: usize, r: usize| {
        let (x, y) = (c as f64, r as f64);
        Point3::new(
            (x - 0.5 * (cols as f64 - 1.0)) * GARMENT_SPACING,
            y * GARMENT_SPACING,
            GARMENT_DEPTH,
        )
    };
    let positions = (0..rows)
        .flat_map(|r| (0..cols).map(move |c| (c, r)))
        .map(|(c, r)| at(c, r))
        .collect();

    let mut faces = Vec::with_capacity(2 * cols.saturating_sub(1) * rows.saturating_sub(1));
    for r in 1..rows {
        for c in 1..cols {
            let (a, b) = ((r - 1) * cols + c - 1, (r - 1) * cols + c);
            let (d, e) = (r * cols + c - 1, r * cols + c);
            faces.push([a, b, e]);
            faces.push([a, e, d]);
        }
    }
    ObjMesh { positions, faces }
}

/// Upper body wearing a grid garment whose `collar` vertices form a ring
/// around the neck-to-head segment of `rest_pose`.
///
/// # Panics
///
/// Panics if `rest_pose` does not match the upper body's dof count or a
/// collar index is outside the garment.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn dressing_world(
    collar: &[usize],
    rest_pose: &[f64],
    neck: usize,
    head: usize,
) -> KinematicClothWorld {
    let mut posed = presets::upper_body();
    posed
        .set_positions(rest_pose)
        .expect("rest pose must cover every dof");
    let neck = posed.to_world(neck, &Point3::origin());
    let head = posed.to_world(head, &Point3::origin());

    let axis = (head - neck).normalize();
    let u = axis
        .cross(&Vector3::x())
        .try_normalize(1e-6)
        .unwrap_or_else(|| axis.cross(&Vector3::z()).normalize());
    let v = axis.cross(&u);
    let center = neck + (head - neck) * 0.5;

    let mut mesh = grid_garment(GARMENT_COLS, GARMENT_ROWS);
    let n = collar.len() as f64;
    for (i, vertex) in collar.iter().enumerate() {
        let angle = std::f64::consts::TAU * i as f64 / n;
        mesh.positions[*vertex] =
            center + (u * angle.cos() + v * angle.sin()) * COLLAR_RADIUS;
    }

    KinematicClothWorld::new(
        presets::upper_body(),
        MeshCloth::from_mesh(mesh, GARMENT_SENSORS),
        DT,
    )
}

/// Fresh, empty scratch directory unique to this process.
///
/// # Panics
///
/// Panics if the directory cannot be created.
#[must_use]
pub fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("drapery-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch directory");
    dir
}

/// Record `count` copies of the world's current cloth and character state
/// under `dir` and return the manifest path.
///
/// Entry `i` has every joint velocity set to `i`, which makes the sampled
/// entry visible in the reset state.
///
/// # Panics
///
/// Panics on any I/O failure.
pub fn write_reset_distribution<W: ClothWorld>(
    world: &W,
    dir: &Path,
    prefix: &str,
    count: u32,
) -> PathBuf {
    let mut manifest = ResetManifest::new(dir, prefix);
    for i in 0..count {
        let entry = manifest.allocate();
        world
            .cloth()
            .save_obj_state(&manifest.mesh_path(&entry))
            .expect("write cloth state");
        let mut state = world.robot().state();
        state.velocities.fill(f64::from(i));
        state
            .save(manifest.character_path(&entry))
            .expect("write character state");
    }
    let path = dir.join("manifest.toml");
    manifest.save(&path).expect("write manifest");
    path
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
