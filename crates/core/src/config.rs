//! Location of packaged reference data

use crate::tessellation::{Density, Label};
use std::path::{Path, PathBuf};

/// Coordinate space of a reference surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceSpace {
    /// Folded average surface, used for geodesic weights
    Canonical,
    /// Flat unfolded surface, used for resampling between densities
    Unfold,
}

impl SurfaceSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceSpace::Canonical => "canonical",
            SurfaceSpace::Unfold => "unfold",
        }
    }
}

/// Root of the reference resource tree.
///
/// Layout:
/// ```text
/// <root>/canonical_surfs/tpl-avg_space-{space}_den-{den}_label-{label}_midthickness.surf.json
/// <root>/2Dcontextualize/initialHippoMaps.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    root: PathBuf,
}

impl ResourceConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the midthickness surface for a tessellation
    pub fn surface_path(&self, label: Label, density: Density, space: SurfaceSpace) -> PathBuf {
        self.root.join("canonical_surfs").join(format!(
            "tpl-avg_space-{}_den-{}_label-{}_midthickness.surf.json",
            space.as_str(),
            density,
            label
        ))
    }

    /// Path of the contextualisation feature catalog
    pub fn catalog_path(&self) -> PathBuf {
        self.root.join("2Dcontextualize").join("initialHippoMaps.json")
    }
}
