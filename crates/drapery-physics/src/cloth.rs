//! Cloth scene traits.
//!
//! The cloth simulator is engine-owned. Environments read vertex geometry,
//! deformation and haptic sensors through [`ClothScene`] and write only vertex
//! pins (through [`crate::handle::HandleNode`]) and reset-state selection.

use std::path::Path;

use nalgebra::{Point3, Vector3};

use drapery_core::error::SimError;

use crate::backend::PhysicsWorld;

/// Engine-side garment access.
pub trait ClothScene {
    fn num_vertices(&self) -> usize;

    fn vertex_position(&self, vertex: usize) -> Point3<f64>;

    /// Unit vertex normal.
    fn vertex_normal(&self, vertex: usize) -> Vector3<f64>;

    /// Largest edge stretch of the garment, in percent of rest length.
    fn max_deformation_ratio(&self) -> f64;

    fn num_haptic_sensors(&self) -> usize;

    /// Three force components per haptic sensor.
    fn haptic_sensor_obs(&self) -> Vec<f64>;

    /// One contact id per haptic sensor.
    fn haptic_contact_ids(&self) -> Vec<f64>;

    /// Register a mesh file as a selectable reset state.
    fn add_reset_state(&mut self, mesh: &Path) -> Result<(), SimError>;

    fn num_reset_states(&self) -> usize;

    /// Make a registered state the garment's current configuration.
    fn set_reset_state(&mut self, index: usize) -> Result<(), SimError>;

    /// Write the current garment configuration as an OBJ file.
    fn save_obj_state(&self, path: &Path) -> Result<(), SimError>;

    /// Constrain a vertex to a world position.
    fn pin_vertex(&mut self, vertex: usize, position: Point3<f64>);

    fn unpin_vertex(&mut self, vertex: usize);
}

/// A world that also simulates a garment.
pub trait ClothWorld: PhysicsWorld {
    type Cloth: ClothScene;

    fn cloth(&self) -> &Self::Cloth;

    fn cloth_mut(&mut self) -> &mut Self::Cloth;
}

/// Mean position of a vertex set. Origin for an empty set.
#[allow(clippy::cast_precision_loss)]
pub fn vertex_centroid<C: ClothScene + ?Sized>(cloth: &C, vertices: &[usize]) -> Point3<f64> {
    if vertices.is_empty() {
        return Point3::origin();
    }
    let sum = vertices
        .iter()
        .fold(Vector3::zeros(), |acc, v| acc + cloth.vertex_position(*v).coords);
    Point3::from(sum / vertices.len() as f64)
}

/// Normalized mean of vertex normals. Zero when the normals cancel out.
pub fn vertex_average_normal<C: ClothScene + ?Sized>(cloth: &C, vertices: &[usize]) -> Vector3<f64> {
    let sum = vertices
        .iter()
        .fold(Vector3::zeros(), |acc, v| acc + cloth.vertex_normal(*v));
    sum.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
}
