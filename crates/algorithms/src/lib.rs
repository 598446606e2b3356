//! # HippoMaps Algorithms
//!
//! Spatial statistics for hippocampal surface maps.
//!
//! ## Modules
//!
//! - **metrics**: Pearson, Spearman, adjusted Rand, adjusted mutual information
//! - **permutation**: spin (geometric) and Moran spectral null models
//! - **resample**: moving fields between surface densities
//! - **significance**: permutation p-values for map similarity
//! - **context**: ranking new maps against the reference catalog

mod maybe_rayon;

pub mod context;
pub mod metrics;
pub mod permutation;
pub mod resample;
pub mod significance;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::context::{ContextParams, ContextResult, Contextualizer, FeatureCatalog};
    pub use crate::metrics::{adjusted_mutual_info, adjusted_rand, pearson, spearman, Metric};
    pub use crate::permutation::{
        MoranParams, MoranRandomization, PermutationEngine, Permuted, SpectralConfig,
        SpectralModel, Spectrum, SpinParams, SpinPermutation, WeightCache, WeightGraph,
    };
    pub use crate::resample::{InterpolationMethod, SurfaceResampler, UnfoldedResampler};
    pub use crate::significance::{
        empirical_p_value, moran_test, spin_test, EvaluateParams, SignificanceEvaluator,
        SignificanceResult,
    };
    pub use hippomaps_core::prelude::*;
}
