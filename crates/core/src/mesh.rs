//! Triangulated surface meshes

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A triangulated reference surface.
///
/// Vertex coordinates are in millimetres for folded (canonical) surfaces and
/// in unfolded-space units for the flat surfaces used by resampling; in the
/// latter case only the first two coordinates are meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMesh {
    vertices: Vec<[f64; 3]>,
    faces: Vec<[usize; 3]>,
}

impl SurfaceMesh {
    /// Create a mesh, validating that every face references existing vertices
    pub fn new(vertices: Vec<[f64; 3]>, faces: Vec<[usize; 3]>) -> Result<Self> {
        let mesh = Self { vertices, faces };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Check face indices and reject degenerate faces
    pub fn validate(&self) -> Result<()> {
        let n = self.vertices.len();
        for (f, face) in self.faces.iter().enumerate() {
            if face.iter().any(|&v| v >= n) {
                return Err(Error::Format(format!(
                    "face {} references a vertex outside 0..{}",
                    f, n
                )));
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(Error::Format(format!("face {} repeats a vertex", f)));
            }
        }
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Euclidean distance between two vertices
    pub fn edge_length(&self, a: usize, b: usize) -> f64 {
        let p = self.vertices[a];
        let q = self.vertices[b];
        ((p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2) + (p[2] - q[2]).powi(2)).sqrt()
    }

    /// Unique undirected edges as (low, high) vertex pairs, sorted
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .faces
            .iter()
            .flat_map(|f| [(f[0], f[1]), (f[1], f[2]), (f[2], f[0])])
            .map(|(a, b)| if a < b { (a, b) } else { (b, a) })
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Sorted 1-ring neighbours of every vertex
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.vertices.len()];
        for (a, b) in self.edges() {
            adj[a].push(b);
            adj[b].push(a);
        }
        for list in &mut adj {
            list.sort_unstable();
        }
        adj
    }

    /// Faces incident to every vertex
    pub fn vertex_faces(&self) -> Vec<Vec<usize>> {
        let mut incident = vec![Vec::new(); self.vertices.len()];
        for (f, face) in self.faces.iter().enumerate() {
            for &v in face {
                incident[v].push(f);
            }
        }
        incident
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> SurfaceMesh {
        SurfaceMesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_edges_dedup() {
        let mesh = square();
        assert_eq!(mesh.edges(), vec![(0, 1), (0, 2), (0, 3), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_adjacency() {
        let adj = square().adjacency();
        assert_eq!(adj[0], vec![1, 2, 3]);
        assert_eq!(adj[1], vec![0, 2]);
    }

    #[test]
    fn test_invalid_face() {
        assert!(SurfaceMesh::new(vec![[0.0; 3]; 2], vec![[0, 1, 2]]).is_err());
        assert!(SurfaceMesh::new(vec![[0.0; 3]; 3], vec![[0, 1, 1]]).is_err());
    }

    #[test]
    fn test_edge_length() {
        let mesh = square();
        assert!((mesh.edge_length(0, 2) - 2f64.sqrt()).abs() < 1e-12);
    }
}
