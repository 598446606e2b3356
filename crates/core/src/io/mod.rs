//! I/O collaborators: map loading and reference surface loading

mod native;
mod surface;

pub use native::{read_field_text, read_grid_tiff, write_field_text, write_grid_tiff, FileMapLoader};
pub use surface::JsonSurfaceLoader;

use crate::config::SurfaceSpace;
use crate::error::Result;
use crate::field::ScalarField;
use crate::mesh::SurfaceMesh;
use crate::tessellation::{Density, Label};
use std::path::{Path, PathBuf};

/// Loads a scalar map from a file reference.
pub trait MapLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<ScalarField>;
}

/// Loads reference surfaces by tessellation.
pub trait MeshLoader: Send + Sync {
    fn load_surface(
        &self,
        label: Label,
        density: Density,
        space: SurfaceSpace,
    ) -> Result<SurfaceMesh>;
}

/// A map given either by location or already in memory.
#[derive(Debug, Clone)]
pub enum MapSource {
    Path(PathBuf),
    Field(ScalarField),
}

impl MapSource {
    /// Normalise to an in-memory field, loading through `loader` if needed
    pub fn resolve(self, loader: &dyn MapLoader) -> Result<ScalarField> {
        match self {
            MapSource::Path(path) => {
                tracing::debug!("loading map from {}", path.display());
                loader.load(&path)
            }
            MapSource::Field(field) => Ok(field),
        }
    }
}

impl From<ScalarField> for MapSource {
    fn from(field: ScalarField) -> Self {
        MapSource::Field(field)
    }
}

impl From<PathBuf> for MapSource {
    fn from(path: PathBuf) -> Self {
        MapSource::Path(path)
    }
}

impl From<&Path> for MapSource {
    fn from(path: &Path) -> Self {
        MapSource::Path(path.to_path_buf())
    }
}
