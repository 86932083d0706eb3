//! Minimal Wavefront OBJ reader/writer for cloth states.
//!
//! Only `v` and `f` records matter; everything else is skipped. Faces with
//! more than three corners are fan-triangulated and `v/vt/vn` corner syntax is
//! reduced to the vertex index.

use std::fmt::Write as _;
use std::path::Path;

use nalgebra::Point3;

use drapery_core::error::SimError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMesh {
    pub positions: Vec<Point3<f64>>,
    /// Zero-based triangle corner indices.
    pub faces: Vec<[usize; 3]>,
}

impl ObjMesh {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| SimError::state_file(path, source))?;
        Self::parse(&content).map_err(|message| SimError::malformed(path, message))
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_obj_string())
            .map_err(|source| SimError::state_file(path, source))
    }

    /// Parse OBJ text. Errors carry the offending line number.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut mesh = Self::default();
        let mut polygons: Vec<(usize, Vec<usize>)> = Vec::new();

        for (lineno, line) in content.lines().enumerate() {
            let mut fields = line.split_whitespace();
            match fields.next() {
                Some("v") => {
                    let coords: Vec<f64> = fields
                        .take(3)
                        .map(str::parse::<f64>)
                        .collect::<Result<_, _>>()
                        .map_err(|e| format!("line {}: {e}", lineno + 1))?;
                    if coords.len() != 3 {
                        return Err(format!("line {}: vertex needs 3 coordinates", lineno + 1));
                    }
                    mesh.positions.push(Point3::new(coords[0], coords[1], coords[2]));
                }
                Some("f") => {
                    let corners = fields
                        .map(|corner| {
                            corner
                                .split('/')
                                .next()
                                .unwrap_or_default()
                                .parse::<usize>()
                                .map_err(|e| format!("line {}: {e}", lineno + 1))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    if corners.len() < 3 {
                        return Err(format!("line {}: face needs 3 corners", lineno + 1));
                    }
                    polygons.push((lineno + 1, corners));
                }
                _ => {}
            }
        }

        let n = mesh.positions.len();
        for (lineno, corners) in polygons {
            if let Some(bad) = corners.iter().find(|c| **c == 0 || **c > n) {
                return Err(format!("line {lineno}: vertex index {bad} out of range 1..={n}"));
            }
            for i in 1..corners.len() - 1 {
                mesh.faces
                    .push([corners[0] - 1, corners[i] - 1, corners[i + 1] - 1]);
            }
        }
        Ok(mesh)
    }

    #[must_use]
    pub fn to_obj_string(&self) -> String {
        let mut out = String::new();
        for p in &self.positions {
            let _ = writeln!(out, "v {} {} {}", p.x, p.y, p.z);
        }
        for f in &self.faces {
            let _ = writeln!(out, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quad_is_fan_triangulated() {
        let mesh = ObjMesh::parse(
            "# quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1 4/4/1\n",
        )
        .unwrap();
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn parse_rejects_out_of_range_index() {
        let err = ObjMesh::parse("v 0 0 0\nv 1 0 0\nf 1 2 3\n").unwrap_err();
        assert!(err.contains("out of range"));
    }

    #[test]
    fn parse_rejects_short_vertex() {
        let err = ObjMesh::parse("v 0 0\n").unwrap_err();
        assert!(err.starts_with("line 1"));
    }

    #[test]
    fn written_text_parses_back() {
        let mesh = ObjMesh {
            positions: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.5, 0.0, 0.0),
                Point3::new(0.0, 0.25, -1.0),
            ],
            faces: vec![[0, 1, 2]],
        };
        let parsed = ObjMesh::parse(&mesh.to_obj_string()).unwrap();
        assert_eq!(parsed, mesh);
    }

    #[test]
    fn read_missing_file_reports_path() {
        let err = ObjMesh::read("/no/such/mesh.obj").unwrap_err();
        assert!(err.to_string().contains("/no/such/mesh.obj"));
    }
}
