//! Kinematic reference backend.
//!
//! A joint-space integrator and a pin-driven static mesh standing in for a
//! real rigid-body/cloth engine. Enough to run the environments end to end;
//! not a physics simulator.

pub mod cloth;
pub mod presets;
pub mod skeleton;
pub mod world;

pub use cloth::MeshCloth;
pub use skeleton::{BodySpec, KinematicSkeleton};
pub use world::{KinematicClothWorld, KinematicWorld};
