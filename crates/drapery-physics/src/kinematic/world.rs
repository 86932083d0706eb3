use nalgebra::Point3;

use drapery_core::error::SimError;

use super::cloth::MeshCloth;
use super::skeleton::KinematicSkeleton;
use crate::backend::{PhysicsWorld, Skeleton, SkeletonState};
use crate::cloth::ClothWorld;

// ---------------------------------------------------------------------------
// KinematicWorld
// ---------------------------------------------------------------------------

/// A kinematic skeleton plus a target marker.
#[derive(Debug, Clone)]
pub struct KinematicWorld {
    skeleton: KinematicSkeleton,
    initial: SkeletonState,
    dt: f64,
    marker: Point3<f64>,
}

impl KinematicWorld {
    /// The skeleton's current state becomes the reset state.
    #[must_use]
    pub fn new(skeleton: KinematicSkeleton, dt: f64) -> Self {
        Self {
            initial: skeleton.state(),
            skeleton,
            dt,
            marker: Point3::origin(),
        }
    }

    pub const fn marker(&self) -> &Point3<f64> {
        &self.marker
    }
}

impl PhysicsWorld for KinematicWorld {
    type Robot = KinematicSkeleton;

    fn robot(&self) -> &KinematicSkeleton {
        &self.skeleton
    }

    fn robot_mut(&mut self) -> &mut KinematicSkeleton {
        &mut self.skeleton
    }

    fn reset(&mut self) -> Result<(), SimError> {
        self.marker = Point3::origin();
        self.skeleton.set_state(&self.initial)
    }

    fn step(&mut self, tau: &[f64]) -> Result<(), SimError> {
        self.skeleton.integrate(tau, self.dt)
    }

    fn time_step(&self) -> f64 {
        self.dt
    }

    fn set_marker(&mut self, position: &Point3<f64>) {
        self.marker = *position;
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "kinematic"
    }
}

// ---------------------------------------------------------------------------
// KinematicClothWorld
// ---------------------------------------------------------------------------

/// A kinematic skeleton dressed in a static, pin-driven mesh garment.
#[derive(Debug, Clone)]
pub struct KinematicClothWorld {
    skeleton: KinematicSkeleton,
    initial: SkeletonState,
    cloth: MeshCloth,
    dt: f64,
}

impl KinematicClothWorld {
    #[must_use]
    pub fn new(skeleton: KinematicSkeleton, cloth: MeshCloth, dt: f64) -> Self {
        Self {
            initial: skeleton.state(),
            skeleton,
            cloth,
            dt,
        }
    }
}

impl PhysicsWorld for KinematicClothWorld {
    type Robot = KinematicSkeleton;

    fn robot(&self) -> &KinematicSkeleton {
        &self.skeleton
    }

    fn robot_mut(&mut self) -> &mut KinematicSkeleton {
        &mut self.skeleton
    }

    fn reset(&mut self) -> Result<(), SimError> {
        self.cloth.restore_initial();
        self.skeleton.set_state(&self.initial)
    }

    fn step(&mut self, tau: &[f64]) -> Result<(), SimError> {
        self.skeleton.integrate(tau, self.dt)?;
        self.cloth.apply_pins();
        Ok(())
    }

    fn time_step(&self) -> f64 {
        self.dt
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "kinematic-cloth"
    }
}

impl ClothWorld for KinematicClothWorld {
    type Cloth = MeshCloth;

    fn cloth(&self) -> &MeshCloth {
        &self.cloth
    }

    fn cloth_mut(&mut self) -> &mut MeshCloth {
        &mut self.cloth
    }
}
