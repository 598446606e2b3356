//! Spectral null model over surface geometry
//!
//! A [`SpectralModel`] couples the geodesic weight graph of one reference
//! surface with its Moran eigenvector basis. Building it costs a dense
//! eigendecomposition, so models are memoised per tessellation in a
//! [`WeightCache`].

mod moran;
mod weights;

pub use moran::{MoranBasis, MoranParams, MoranRandomization, Spectrum};
pub use weights::WeightGraph;

use hippomaps_core::io::MeshLoader;
use hippomaps_core::{Density, Label, Result, SurfaceMesh, SurfaceSpace};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Construction settings for spectral models
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralConfig {
    /// Neighbourhood ring used for geodesic weights
    pub n_ring: usize,
    pub spectrum: Spectrum,
    /// Eigenvalues below this magnitude count as zero
    pub tol: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            n_ring: 1,
            spectrum: Spectrum::All,
            tol: 1e-6,
        }
    }
}

/// Weight graph and Moran basis of one surface
#[derive(Debug, Clone)]
pub struct SpectralModel {
    pub weights: WeightGraph,
    pub basis: MoranBasis,
}

impl SpectralModel {
    /// Inverse ring-distance weights on `mesh`, then their Moran basis
    pub fn build(mesh: &SurfaceMesh, config: &SpectralConfig) -> Result<Self> {
        let weights = WeightGraph::inverse_ring_distance(mesh, config.n_ring)?;
        let basis = MoranBasis::fit(&weights, config.spectrum, config.tol)?;
        Ok(Self { weights, basis })
    }

    pub fn vertex_count(&self) -> usize {
        self.weights.size()
    }
}

/// Spectral models memoised per (label, density).
///
/// Safe to share between threads; concurrent misses on the same key may
/// both build, and the first insert wins.
#[derive(Debug, Default)]
pub struct WeightCache {
    config: SpectralConfig,
    entries: RwLock<HashMap<(Label, Density), Arc<SpectralModel>>>,
}

impl WeightCache {
    pub fn new(config: SpectralConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }

    /// Cached model for a tessellation, built from its canonical surface on first use
    pub fn get_or_build(
        &self,
        label: Label,
        density: Density,
        loader: &dyn MeshLoader,
    ) -> Result<Arc<SpectralModel>> {
        if let Some(model) = self.entries.read().get(&(label, density)) {
            return Ok(Arc::clone(model));
        }

        tracing::info!("building spectral model for {} at {}", label, density);
        let mesh = loader.load_surface(label, density, SurfaceSpace::Canonical)?;
        let model = Arc::new(SpectralModel::build(&mesh, &self.config)?);

        let mut entries = self.entries.write();
        let entry = entries.entry((label, density)).or_insert(model);
        Ok(Arc::clone(entry))
    }

    /// Engine for a tessellation, sharing the cached model
    pub fn engine(
        &self,
        label: Label,
        density: Density,
        loader: &dyn MeshLoader,
    ) -> Result<MoranRandomization> {
        self.get_or_build(label, density, loader).map(MoranRandomization::new)
    }

    pub fn contains(&self, label: Label, density: Density) -> bool {
        self.entries.read().contains_key(&(label, density))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
