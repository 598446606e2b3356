//! Reference surfaces stored as JSON meshes

use crate::config::{ResourceConfig, SurfaceSpace};
use crate::error::Result;
use crate::io::MeshLoader;
use crate::mesh::SurfaceMesh;
use crate::tessellation::{Density, Label};
use std::fs::File;
use std::io::BufReader;

/// Reads `{"vertices": [[x, y, z], ...], "faces": [[a, b, c], ...]}` surfaces
/// from the resource tree.
#[derive(Debug, Clone)]
pub struct JsonSurfaceLoader {
    config: ResourceConfig,
}

impl JsonSurfaceLoader {
    pub fn new(config: ResourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }
}

impl MeshLoader for JsonSurfaceLoader {
    fn load_surface(
        &self,
        label: Label,
        density: Density,
        space: SurfaceSpace,
    ) -> Result<SurfaceMesh> {
        let path = self.config.surface_path(label, density, space);
        tracing::debug!("reading surface {}", path.display());
        let reader = BufReader::new(File::open(&path)?);
        let mesh: SurfaceMesh = serde_json::from_reader(reader)?;
        mesh.validate()?;
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;

    #[test]
    fn test_load_surface() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ResourceConfig::new(dir.path());
        let path = cfg.surface_path(Label::Hipp, Density::TwoMm, SurfaceSpace::Unfold);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"vertices": [[0,0,0],[1,0,0],[0,1,0]], "faces": [[0,1,2]]}"#,
        )
        .unwrap();

        let loader = JsonSurfaceLoader::new(cfg);
        let mesh = loader
            .load_surface(Label::Hipp, Density::TwoMm, SurfaceSpace::Unfold)
            .unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_invalid_surface() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ResourceConfig::new(dir.path());
        let path = cfg.surface_path(Label::Hipp, Density::TwoMm, SurfaceSpace::Canonical);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"vertices": [[0,0,0]], "faces": [[0,1,2]]}"#).unwrap();

        let loader = JsonSurfaceLoader::new(cfg);
        assert!(matches!(
            loader.load_surface(Label::Hipp, Density::TwoMm, SurfaceSpace::Canonical),
            Err(Error::Format(_))
        ));
    }
}
