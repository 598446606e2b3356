//! Resampling between surface tessellations
//!
//! Vertices of every tessellation of a label share one flat unfolded
//! coordinate system, so a field moves between densities by locating each
//! target vertex on the source tessellation in that plane.

mod kdtree;

pub use kdtree::{Neighbor, VertexTree};

use crate::maybe_rayon::*;
use hippomaps_core::io::MeshLoader;
use hippomaps_core::{Density, Error, Label, Result, ScalarField, SurfaceMesh, SurfaceSpace};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How values are carried from source to target vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMethod {
    /// Value of the closest source vertex
    Nearest,
    /// Barycentric blend within the containing source triangle
    #[default]
    Linear,
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InterpolationMethod::Nearest => "nearest",
            InterpolationMethod::Linear => "linear",
        })
    }
}

impl FromStr for InterpolationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(InterpolationMethod::Nearest),
            "linear" => Ok(InterpolationMethod::Linear),
            other => Err(Error::InvalidParameter {
                name: "method",
                value: other.to_string(),
                reason: "expected 'nearest' or 'linear'".into(),
            }),
        }
    }
}

/// Maps a scalar field between two densities of the same label.
pub trait SurfaceResampler: Send + Sync {
    fn interpolate(
        &self,
        from: Density,
        to: Density,
        field: &ScalarField,
        label: Label,
        method: InterpolationMethod,
    ) -> Result<ScalarField>;
}

/// Unfolded surface with its spatial index
#[derive(Debug)]
struct IndexedSurface {
    mesh: SurfaceMesh,
    tree: VertexTree,
    vertex_faces: Vec<Vec<usize>>,
}

/// Candidate source vertices inspected when looking for a containing triangle
const SEARCH_NEIGHBORS: usize = 8;
const INSIDE_TOL: f64 = 1e-9;

impl IndexedSurface {
    fn new(mesh: SurfaceMesh) -> Self {
        let tree = VertexTree::build(mesh.vertices().iter().map(|v| [v[0], v[1]]).collect());
        let vertex_faces = mesh.vertex_faces();
        Self {
            mesh,
            tree,
            vertex_faces,
        }
    }

    fn nearest_value(&self, values: &[f64], q: [f64; 2]) -> f64 {
        self.tree
            .nearest(q)
            .map_or(f64::NAN, |hit| values[hit.vertex])
    }

    /// Face containing `q` and its barycentric weights
    fn locate(&self, q: [f64; 2]) -> Option<([usize; 3], [f64; 3])> {
        let faces = self.mesh.faces();
        let pos = |v: usize| {
            let p = self.mesh.vertices()[v];
            [p[0], p[1]]
        };
        self.tree
            .k_nearest(q, SEARCH_NEIGHBORS)
            .into_iter()
            .flat_map(|n| self.vertex_faces[n.vertex].iter().copied())
            .find_map(|f| {
                let face = faces[f];
                barycentric(q, pos(face[0]), pos(face[1]), pos(face[2]))
                    .filter(|w| w.iter().all(|&x| x >= -INSIDE_TOL))
                    .map(|w| (face, w))
            })
    }

    fn linear_value(&self, values: &[f64], q: [f64; 2]) -> f64 {
        match self.locate(q) {
            Some((face, w)) => {
                let v = w[0] * values[face[0]] + w[1] * values[face[1]] + w[2] * values[face[2]];
                if v.is_nan() {
                    self.nearest_value(values, q)
                } else {
                    v
                }
            }
            None => self.nearest_value(values, q),
        }
    }
}

fn barycentric(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Option<[f64; 3]> {
    let (v0, v1, v2) = (
        [b[0] - a[0], b[1] - a[1]],
        [c[0] - a[0], c[1] - a[1]],
        [p[0] - a[0], p[1] - a[1]],
    );
    let den = v0[0] * v1[1] - v1[0] * v0[1];
    if den.abs() < 1e-15 {
        return None;
    }
    let l1 = (v2[0] * v1[1] - v1[0] * v2[1]) / den;
    let l2 = (v0[0] * v2[1] - v2[0] * v0[1]) / den;
    Some([1.0 - l1 - l2, l1, l2])
}

/// Resampler over the unfolded reference surfaces.
///
/// Surfaces and their k-d trees are loaded once per (label, density).
pub struct UnfoldedResampler {
    loader: Arc<dyn MeshLoader>,
    surfaces: RwLock<HashMap<(Label, Density), Arc<IndexedSurface>>>,
}

impl UnfoldedResampler {
    pub fn new(loader: Arc<dyn MeshLoader>) -> Self {
        Self {
            loader,
            surfaces: RwLock::new(HashMap::new()),
        }
    }

    fn surface(&self, label: Label, density: Density) -> Result<Arc<IndexedSurface>> {
        if let Some(s) = self.surfaces.read().get(&(label, density)) {
            return Ok(Arc::clone(s));
        }
        let mesh = self.loader.load_surface(label, density, SurfaceSpace::Unfold)?;
        let surface = Arc::new(IndexedSurface::new(mesh));
        let mut surfaces = self.surfaces.write();
        Ok(Arc::clone(surfaces.entry((label, density)).or_insert(surface)))
    }
}

impl fmt::Debug for UnfoldedResampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnfoldedResampler")
            .field("cached", &self.surfaces.read().len())
            .finish()
    }
}

impl SurfaceResampler for UnfoldedResampler {
    fn interpolate(
        &self,
        from: Density,
        to: Density,
        field: &ScalarField,
        label: Label,
        method: InterpolationMethod,
    ) -> Result<ScalarField> {
        if from == to {
            return Ok(field.clone());
        }
        let source = self.surface(label, from)?;
        if field.len() != source.mesh.vertex_count() {
            return Err(Error::GeometryMismatch {
                expected: source.mesh.vertex_count(),
                actual: field.len(),
            });
        }
        let target = self.surface(label, to)?;
        tracing::debug!("resampling {} map {} -> {} ({})", label, from, to, method);

        let values = field.values();
        let out: Vec<f64> = target
            .mesh
            .vertices()
            .par_iter()
            .map(|v| {
                let q = [v[0], v[1]];
                match method {
                    InterpolationMethod::Nearest => source.nearest_value(values, q),
                    InterpolationMethod::Linear => source.linear_value(values, q),
                }
            })
            .collect();
        Ok(ScalarField::new(out))
    }
}
