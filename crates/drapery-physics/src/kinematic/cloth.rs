use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use nalgebra::{Point3, Vector3};
use tracing::debug;

use drapery_core::error::SimError;

use crate::cloth::ClothScene;
use crate::mesh::ObjMesh;

/// Static triangle-mesh garment.
///
/// Vertices only move when pinned; deformation is measured as edge stretch
/// against the mesh it was built from. Haptic sensors exist but always read
/// zero.
#[derive(Debug, Clone)]
pub struct MeshCloth {
    positions: Vec<Point3<f64>>,
    initial: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
    vertex_faces: Vec<Vec<usize>>,
    /// `(a, b, rest_length)` per unique edge.
    edges: Vec<(usize, usize, f64)>,
    reset_states: Vec<Vec<Point3<f64>>>,
    pins: BTreeMap<usize, Point3<f64>>,
    haptic_sensors: usize,
}

impl MeshCloth {
    #[must_use]
    pub fn from_mesh(mesh: ObjMesh, haptic_sensors: usize) -> Self {
        let mut vertex_faces = vec![Vec::new(); mesh.positions.len()];
        let mut edge_set = BTreeSet::new();
        for (fi, face) in mesh.faces.iter().enumerate() {
            for k in 0..3 {
                vertex_faces[face[k]].push(fi);
                let (a, b) = (face[k], face[(k + 1) % 3]);
                edge_set.insert((a.min(b), a.max(b)));
            }
        }
        let edges = edge_set
            .into_iter()
            .map(|(a, b)| (a, b, (mesh.positions[a] - mesh.positions[b]).norm()))
            .collect();

        Self {
            initial: mesh.positions.clone(),
            positions: mesh.positions,
            faces: mesh.faces,
            vertex_faces,
            edges,
            reset_states: Vec::new(),
            pins: BTreeMap::new(),
            haptic_sensors,
        }
    }

    pub fn load(path: impl AsRef<Path>, haptic_sensors: usize) -> Result<Self, SimError> {
        Ok(Self::from_mesh(ObjMesh::read(path)?, haptic_sensors))
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn pinned(&self) -> impl Iterator<Item = usize> + '_ {
        self.pins.keys().copied()
    }

    /// Return to the mesh the cloth was built from and drop every pin.
    pub fn restore_initial(&mut self) {
        self.positions.clone_from(&self.initial);
        self.pins.clear();
    }

    /// Write pin targets into vertex positions.
    pub fn apply_pins(&mut self) {
        for (v, p) in &self.pins {
            if let Some(slot) = self.positions.get_mut(*v) {
                *slot = *p;
            }
        }
    }

    fn face_normal(&self, face: usize) -> Vector3<f64> {
        let [a, b, c] = self.faces[face];
        let (pa, pb, pc) = (self.positions[a], self.positions[b], self.positions[c]);
        (pb - pa).cross(&(pc - pa))
    }
}

impl ClothScene for MeshCloth {
    fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    fn vertex_position(&self, vertex: usize) -> Point3<f64> {
        self.positions[vertex]
    }

    fn vertex_normal(&self, vertex: usize) -> Vector3<f64> {
        self.vertex_faces[vertex]
            .iter()
            .fold(Vector3::zeros(), |acc, f| acc + self.face_normal(*f))
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::z)
    }

    fn max_deformation_ratio(&self) -> f64 {
        self.edges
            .iter()
            .filter(|(_, _, rest)| *rest > f64::EPSILON)
            .map(|(a, b, rest)| ((self.positions[*a] - self.positions[*b]).norm() / rest - 1.0) * 100.0)
            .fold(0.0, f64::max)
    }

    fn num_haptic_sensors(&self) -> usize {
        self.haptic_sensors
    }

    fn haptic_sensor_obs(&self) -> Vec<f64> {
        vec![0.0; self.haptic_sensors * 3]
    }

    fn haptic_contact_ids(&self) -> Vec<f64> {
        vec![0.0; self.haptic_sensors]
    }

    fn add_reset_state(&mut self, mesh: &Path) -> Result<(), SimError> {
        let state = ObjMesh::read(mesh)?;
        if state.positions.len() != self.positions.len() {
            return Err(SimError::malformed(
                mesh,
                format!(
                    "{} vertices, garment has {}",
                    state.positions.len(),
                    self.positions.len()
                ),
            ));
        }
        debug!(path = %mesh.display(), index = self.reset_states.len(), "registered cloth reset state");
        self.reset_states.push(state.positions);
        Ok(())
    }

    fn num_reset_states(&self) -> usize {
        self.reset_states.len()
    }

    fn set_reset_state(&mut self, index: usize) -> Result<(), SimError> {
        let state = self
            .reset_states
            .get(index)
            .ok_or(SimError::UnknownResetState {
                index,
                available: self.reset_states.len(),
            })?;
        self.positions.clone_from(state);
        self.apply_pins();
        Ok(())
    }

    fn save_obj_state(&self, path: &Path) -> Result<(), SimError> {
        ObjMesh {
            positions: self.positions.clone(),
            faces: self.faces.clone(),
        }
        .write(path)
    }

    fn pin_vertex(&mut self, vertex: usize, position: Point3<f64>) {
        if let Some(slot) = self.positions.get_mut(vertex) {
            *slot = position;
            self.pins.insert(vertex, position);
        }
    }

    fn unpin_vertex(&mut self, vertex: usize) {
        self.pins.remove(&vertex);
    }
}
