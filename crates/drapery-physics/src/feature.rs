//! Planar cloth features.
//!
//! A [`ClothFeature`] is an ordered loop of garment vertices (a collar, a
//! sleeve opening, a grip patch). Each step the loop is fitted with a
//! least-squares plane and projected into it, giving a 2D polygon that can be
//! tested against line segments such as the neck or a limb.

use nalgebra::{Matrix3, Point2, Point3, SymmetricEigen, Vector3};

use crate::cloth::{ClothScene, vertex_centroid};

/// Fitted plane with an in-plane basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeaturePlane {
    pub centroid: Point3<f64>,
    pub normal: Vector3<f64>,
    pub basis1: Vector3<f64>,
    pub basis2: Vector3<f64>,
}

impl FeaturePlane {
    /// Plane coordinates of a world point.
    #[must_use]
    pub fn project(&self, p: &Point3<f64>) -> Point2<f64> {
        let d = p - self.centroid;
        Point2::new(d.dot(&self.basis1), d.dot(&self.basis2))
    }

    /// World point of plane coordinates.
    #[must_use]
    pub fn lift(&self, q: &Point2<f64>) -> Point3<f64> {
        self.centroid + self.basis1 * q.x + self.basis2 * q.y
    }
}

#[derive(Debug, Clone)]
pub struct ClothFeature {
    vertices: Vec<usize>,
    basis1_span: Option<[usize; 2]>,
    basis2_span: Option<[usize; 2]>,
    plane: Option<FeaturePlane>,
    polygon: Vec<Point2<f64>>,
}

impl ClothFeature {
    #[must_use]
    pub fn new(vertices: Vec<usize>) -> Self {
        Self {
            vertices,
            basis1_span: None,
            basis2_span: None,
            plane: None,
            polygon: Vec::new(),
        }
    }

    /// Orient the in-plane basis along the given vertex pairs.
    #[must_use]
    pub const fn with_basis_spans(mut self, basis1: [usize; 2], basis2: [usize; 2]) -> Self {
        self.basis1_span = Some(basis1);
        self.basis2_span = Some(basis2);
        self
    }

    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Plane from the last fit, if any.
    pub const fn plane(&self) -> Option<&FeaturePlane> {
        self.plane.as_ref()
    }

    /// Projected loop from the last fit.
    pub fn polygon(&self) -> &[Point2<f64>] {
        &self.polygon
    }

    /// Projected loop lifted back into world space.
    pub fn polygon_world(&self) -> Vec<Point3<f64>> {
        self.plane
            .map(|plane| self.polygon.iter().map(|q| plane.lift(q)).collect())
            .unwrap_or_default()
    }

    /// Refit the plane to the current vertex positions.
    ///
    /// The normal is the direction of least variance. It is flipped to agree
    /// with `normal_hint` when given, otherwise with the loop's winding.
    pub fn fit_plane<C: ClothScene + ?Sized>(&mut self, cloth: &C, normal_hint: Option<Vector3<f64>>) {
        let points: Vec<Point3<f64>> = self
            .vertices
            .iter()
            .map(|v| cloth.vertex_position(*v))
            .collect();
        if points.len() < 3 {
            self.plane = None;
            self.polygon.clear();
            return;
        }
        let centroid = vertex_centroid(cloth, &self.vertices);

        let mut covariance = Matrix3::zeros();
        for p in &points {
            let d = p - centroid;
            covariance += d * d.transpose();
        }
        let eigen = SymmetricEigen::new(covariance);
        let mut normal: Vector3<f64> = eigen.eigenvectors.column(eigen.eigenvalues.imin()).into_owned();

        let reference = normal_hint.unwrap_or_else(|| winding_normal(&points));
        if normal.dot(&reference) < 0.0 {
            normal = -normal;
        }

        let in_plane = |v: Vector3<f64>| v - normal * v.dot(&normal);
        let span = |pair: Option<[usize; 2]>| {
            pair.map(|[a, b]| in_plane(cloth.vertex_position(b) - cloth.vertex_position(a)))
        };

        let basis1 = span(self.basis1_span)
            .and_then(|v| v.try_normalize(f64::EPSILON))
            .unwrap_or_else(|| any_perpendicular(&normal));
        let mut basis2 = normal.cross(&basis1);
        if span(self.basis2_span).is_some_and(|v| v.dot(&basis2) < 0.0) {
            basis2 = -basis2;
        }

        let plane = FeaturePlane {
            centroid,
            normal,
            basis1,
            basis2,
        };
        self.polygon = points.iter().map(|p| plane.project(p)).collect();
        self.plane = Some(plane);
    }

    /// Whether the segment `l0 → l1` passes through the projected loop.
    ///
    /// Returns the world intersection point with the plane when the segment
    /// crosses it, whether or not that point lies inside the loop.
    pub fn contains(&self, l0: &Point3<f64>, l1: &Point3<f64>) -> (bool, Option<Point3<f64>>) {
        let Some(plane) = self.plane else {
            return (false, None);
        };
        let dir = l1 - l0;
        let denom = plane.normal.dot(&dir);
        if denom.abs() < 1e-12 {
            return (false, None);
        }
        let t = plane.normal.dot(&(plane.centroid - l0)) / denom;
        if !(0.0..=1.0).contains(&t) {
            return (false, None);
        }
        let hit = l0 + dir * t;
        let inside = point_in_polygon(&plane.project(&hit), &self.polygon);
        (inside, Some(hit))
    }
}

/// Newell normal of an ordered loop.
fn winding_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut n = Vector3::zeros();
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

fn any_perpendicular(n: &Vector3<f64>) -> Vector3<f64> {
    let axis = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    (axis - n * axis.dot(n)).normalize()
}

/// Even-odd rule.
fn point_in_polygon(p: &Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + n - 1) % n];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }
    inside
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use drapery_core::error::SimError;

    /// Static point cloud with +z normals.
    struct Points(Vec<Point3<f64>>);

    impl ClothScene for Points {
        fn num_vertices(&self) -> usize {
            self.0.len()
        }
        fn vertex_position(&self, vertex: usize) -> Point3<f64> {
            self.0[vertex]
        }
        fn vertex_normal(&self, _vertex: usize) -> Vector3<f64> {
            Vector3::z()
        }
        fn max_deformation_ratio(&self) -> f64 {
            0.0
        }
        fn num_haptic_sensors(&self) -> usize {
            0
        }
        fn haptic_sensor_obs(&self) -> Vec<f64> {
            Vec::new()
        }
        fn haptic_contact_ids(&self) -> Vec<f64> {
            Vec::new()
        }
        fn add_reset_state(&mut self, _mesh: &Path) -> Result<(), SimError> {
            Ok(())
        }
        fn num_reset_states(&self) -> usize {
            0
        }
        fn set_reset_state(&mut self, index: usize) -> Result<(), SimError> {
            Err(SimError::UnknownResetState {
                index,
                available: 0,
            })
        }
        fn save_obj_state(&self, _path: &Path) -> Result<(), SimError> {
            Ok(())
        }
        fn pin_vertex(&mut self, _vertex: usize, _position: Point3<f64>) {}
        fn unpin_vertex(&mut self, _vertex: usize) {}
    }

    /// Horizontal ring of radius `r` at height `y`, counter-clockwise seen from +y.
    fn ring(r: f64, y: f64, n: usize) -> Points {
        #[allow(clippy::cast_precision_loss)]
        let pts = (0..n)
            .map(|i| {
                let a = std::f64::consts::TAU * i as f64 / n as f64;
                Point3::new(r * a.cos(), y, -r * a.sin())
            })
            .collect();
        Points(pts)
    }

    #[test]
    fn ring_plane_is_horizontal() {
        let cloth = ring(0.2, 1.0, 12);
        let mut feature = ClothFeature::new((0..12).collect());
        feature.fit_plane(&cloth, None);
        let plane = feature.plane().unwrap();
        assert!((plane.centroid.y - 1.0).abs() < 1e-12);
        assert!((plane.normal.y.abs() - 1.0).abs() < 1e-9);
        assert_eq!(feature.polygon().len(), 12);
    }

    #[test]
    fn normal_follows_hint() {
        let cloth = ring(0.2, 0.0, 8);
        let mut feature = ClothFeature::new((0..8).collect());
        feature.fit_plane(&cloth, Some(-Vector3::y()));
        assert!(feature.plane().unwrap().normal.y < 0.0);
        feature.fit_plane(&cloth, Some(Vector3::y()));
        assert!(feature.plane().unwrap().normal.y > 0.0);
    }

    #[test]
    fn basis_follows_span_vertices() {
        let cloth = ring(0.2, 0.0, 8);
        let mut feature = ClothFeature::new((0..8).collect()).with_basis_spans([4, 0], [6, 2]);
        feature.fit_plane(&cloth, Some(Vector3::y()));
        let plane = feature.plane().unwrap();
        // vertex 4 -> vertex 0 runs along +x
        assert!(plane.basis1.x > 0.99);
        // vertex 6 -> vertex 2 runs along -z
        assert!(plane.basis2.z < -0.99);
    }

    #[test]
    fn segment_through_ring_is_contained() {
        let cloth = ring(0.15, 1.0, 11);
        let mut feature = ClothFeature::new((0..11).collect());
        feature.fit_plane(&cloth, None);

        let (inside, hit) = feature.contains(&Point3::new(0.0, 0.8, 0.0), &Point3::new(0.0, 1.2, 0.0));
        assert!(inside);
        assert!((hit.unwrap().y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn segment_outside_ring_is_not_contained() {
        let cloth = ring(0.15, 1.0, 11);
        let mut feature = ClothFeature::new((0..11).collect());
        feature.fit_plane(&cloth, None);

        let (inside, hit) = feature.contains(&Point3::new(0.5, 0.8, 0.0), &Point3::new(0.5, 1.2, 0.0));
        assert!(!inside);
        assert!(hit.is_some());
    }

    #[test]
    fn segment_short_of_plane_misses() {
        let cloth = ring(0.15, 1.0, 11);
        let mut feature = ClothFeature::new((0..11).collect());
        feature.fit_plane(&cloth, None);

        let (inside, hit) = feature.contains(&Point3::new(0.0, 0.2, 0.0), &Point3::new(0.0, 0.9, 0.0));
        assert!(!inside);
        assert!(hit.is_none());
    }

    #[test]
    fn unfitted_feature_contains_nothing() {
        let feature = ClothFeature::new(vec![0, 1, 2]);
        assert_eq!(
            feature.contains(&Point3::origin(), &Point3::new(0.0, 1.0, 0.0)),
            (false, None)
        );
        assert!(feature.polygon_world().is_empty());
    }

    #[test]
    fn polygon_world_lies_on_ring() {
        let cloth = ring(0.2, 0.5, 6);
        let mut feature = ClothFeature::new((0..6).collect());
        feature.fit_plane(&cloth, None);
        for (lifted, original) in feature.polygon_world().iter().zip(&cloth.0) {
            assert!((lifted - original).norm() < 1e-9);
        }
    }
}
