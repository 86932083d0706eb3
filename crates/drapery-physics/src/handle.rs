//! Rigid handle that drags a set of pinned cloth vertices.

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

use crate::cloth::{ClothScene, vertex_centroid};

/// A rigid frame carrying pinned garment vertices.
///
/// Offsets are stored in the handle frame, so moving the frame with
/// [`set_transform`](Self::set_transform) and calling [`step`](Self::step)
/// drags the vertices along rigidly.
#[derive(Debug, Clone)]
pub struct HandleNode {
    origin: Point3<f64>,
    orientation: UnitQuaternion<f64>,
    vertices: Vec<usize>,
    offsets: Vec<Vector3<f64>>,
}

impl HandleNode {
    #[must_use]
    pub fn new(origin: Point3<f64>) -> Self {
        Self {
            origin,
            orientation: UnitQuaternion::identity(),
            vertices: Vec::new(),
            offsets: Vec::new(),
        }
    }

    pub const fn origin(&self) -> &Point3<f64> {
        &self.origin
    }

    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    pub fn transform(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.origin.coords), self.orientation)
    }

    /// Release every pinned vertex.
    pub fn clear<C: ClothScene + ?Sized>(&mut self, cloth: &mut C) {
        for v in self.vertices.drain(..) {
            cloth.unpin_vertex(v);
        }
        self.offsets.clear();
    }

    /// Grab vertices at their current positions.
    pub fn add_vertices<C: ClothScene + ?Sized>(&mut self, cloth: &mut C, vertices: &[usize]) {
        for v in vertices {
            if !self.vertices.contains(v) {
                self.vertices.push(*v);
                let position = cloth.vertex_position(*v);
                cloth.pin_vertex(*v, position);
            }
        }
        self.recompute_offsets(cloth);
    }

    /// Move the origin to the centroid of the held vertices.
    pub fn set_origin_to_centroid<C: ClothScene + ?Sized>(&mut self, cloth: &C) {
        self.origin = vertex_centroid(cloth, &self.vertices);
    }

    pub fn set_transform(&mut self, transform: &Isometry3<f64>) {
        self.origin = Point3::from(transform.translation.vector);
        self.orientation = transform.rotation;
    }

    /// Re-express held vertices relative to the current frame.
    pub fn recompute_offsets<C: ClothScene + ?Sized>(&mut self, cloth: &C) {
        let inverse = self.orientation.inverse();
        self.offsets = self
            .vertices
            .iter()
            .map(|v| inverse * (cloth.vertex_position(*v) - self.origin))
            .collect();
    }

    /// Pin every held vertex to its frame-relative target.
    pub fn step<C: ClothScene + ?Sized>(&self, cloth: &mut C) {
        for (v, offset) in self.vertices.iter().zip(&self.offsets) {
            cloth.pin_vertex(*v, self.origin + self.orientation * offset);
        }
    }
}
