//! Permutation significance testing between two maps
//!
//! The evaluator normalises both inputs to fields, brings them to the
//! representation the chosen null model works in, scores the observed pair,
//! scores the fixed map against every surrogate of the perturbed one, and
//! reports the empirical two-sided p-value.

use crate::maybe_rayon::*;
use crate::metrics::Metric;
use crate::permutation::{PermutationEngine, Permuted, SpinPermutation, WeightCache};
use crate::resample::{SurfaceResampler, UnfoldedResampler};
use hippomaps_core::io::{FileMapLoader, JsonSurfaceLoader, MapLoader, MapSource};
use hippomaps_core::{
    Density, Error, Label, ResourceConfig, Result, ScalarField, VertexCountRegistry,
};
use std::fmt;
use std::sync::Arc;

/// Parameters for [`SignificanceEvaluator::evaluate`]
#[derive(Debug, Clone)]
pub struct EvaluateParams {
    /// Number of permutations
    pub nperm: usize,
    pub metric: Metric,
    pub label: Label,
    /// Density of the input maps
    pub density: Density,
    /// Master seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for EvaluateParams {
    fn default() -> Self {
        Self {
            nperm: 1000,
            metric: Metric::Pearson,
            label: Label::Hipp,
            density: Density::HalfMm,
            seed: None,
        }
    }
}

/// Outcome of one significance test
#[derive(Debug, Clone)]
pub struct SignificanceResult {
    /// Metric between the fixed map and each surrogate, index-aligned with `permuted`
    pub null: Vec<f64>,
    /// Surrogates of the perturbed map
    pub permuted: Permuted,
    /// Fraction of `|null| >= |observed|`
    pub p_value: f64,
    pub observed: f64,
}

/// Two-sided empirical p-value: share of null statistics at least as extreme as `observed`.
///
/// NaN null entries never count as extreme.
pub fn empirical_p_value(null: &[f64], observed: f64) -> f64 {
    if null.is_empty() {
        return f64::NAN;
    }
    let threshold = observed.abs();
    let extreme = null.iter().filter(|v| v.abs() >= threshold).count();
    extreme as f64 / null.len() as f64
}

/// Runs permutation tests with injected loading and resampling collaborators.
pub struct SignificanceEvaluator {
    loader: Arc<dyn MapLoader>,
    resampler: Arc<dyn SurfaceResampler>,
    registry: VertexCountRegistry,
}

impl fmt::Debug for SignificanceEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignificanceEvaluator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl SignificanceEvaluator {
    pub fn new(
        loader: Arc<dyn MapLoader>,
        resampler: Arc<dyn SurfaceResampler>,
        registry: VertexCountRegistry,
    ) -> Self {
        Self {
            loader,
            resampler,
            registry,
        }
    }

    /// File maps, surfaces under `config`, and the published vertex counts
    pub fn from_config(config: &ResourceConfig) -> Self {
        let surfaces = Arc::new(JsonSurfaceLoader::new(config.clone()));
        Self::new(
            Arc::new(FileMapLoader),
            Arc::new(UnfoldedResampler::new(surfaces)),
            VertexCountRegistry::default(),
        )
    }

    pub fn loader(&self) -> &dyn MapLoader {
        self.loader.as_ref()
    }

    pub fn resampler(&self) -> &dyn SurfaceResampler {
        self.resampler.as_ref()
    }

    pub fn registry(&self) -> &VertexCountRegistry {
        &self.registry
    }

    /// Test whether `fixed` and `perturbed` are more similar than expected under
    /// the spatial null produced by `engine`.
    ///
    /// `perturbed` is the map that gets randomised; `fixed` is compared with
    /// each surrogate.
    pub fn evaluate(
        &self,
        fixed: impl Into<MapSource>,
        perturbed: impl Into<MapSource>,
        engine: &dyn PermutationEngine,
        params: &EvaluateParams,
    ) -> Result<SignificanceResult> {
        let fixed = fixed.into().resolve(self.loader())?;
        let perturbed = perturbed.into().resolve(self.loader())?;
        self.evaluate_fields(fixed, perturbed, engine, params)
    }

    /// [`evaluate`](Self::evaluate) for maps already in memory
    pub fn evaluate_fields(
        &self,
        fixed: ScalarField,
        perturbed: ScalarField,
        engine: &dyn PermutationEngine,
        params: &EvaluateParams,
    ) -> Result<SignificanceResult> {
        if params.nperm == 0 {
            return Err(Error::InvalidParameter {
                name: "nperm",
                value: "0".into(),
                reason: "at least one permutation is required".into(),
            });
        }
        self.registry.check(params.label, params.density, fixed.len())?;
        self.registry.check(params.label, params.density, perturbed.len())?;

        let (fixed, perturbed) = match engine.native_density() {
            Some(native) if native != params.density => {
                let method = engine.resample_method();
                tracing::debug!(
                    "{} null: resampling inputs {} -> {}",
                    engine.name(),
                    params.density,
                    native
                );
                let f = self
                    .resampler
                    .interpolate(params.density, native, &fixed, params.label, method)?;
                let p = self
                    .resampler
                    .interpolate(params.density, native, &perturbed, params.label, method)?;
                (f, p)
            }
            _ => (fixed, perturbed),
        };

        score(&fixed, &perturbed, engine, params)
    }
}

/// Observed statistic, null distribution and p-value on prepared inputs
pub(crate) fn score(
    fixed: &ScalarField,
    perturbed: &ScalarField,
    engine: &dyn PermutationEngine,
    params: &EvaluateParams,
) -> Result<SignificanceResult> {
    let observed = params.metric.compare(fixed.values(), perturbed.values())?;
    if observed.is_nan() {
        return Err(Error::UndefinedStatistic(format!(
            "observed {} is undefined (constant or empty input)",
            params.metric
        )));
    }

    let permuted = engine.generate(perturbed, params.nperm, params.seed)?;
    let target = fixed.values();
    let null = (0..permuted.len())
        .into_par_iter()
        .map(|i| match permuted.values(i) {
            Some(values) => params.metric.compare(target, &values),
            None => Ok(f64::NAN),
        })
        .collect::<Result<Vec<f64>>>()?;

    let p_value = empirical_p_value(&null, observed);
    tracing::debug!(
        engine = engine.name(),
        metric = %params.metric,
        nperm = null.len(),
        observed,
        p_value,
        "significance test"
    );

    Ok(SignificanceResult {
        null,
        permuted,
        p_value,
        observed,
    })
}

/// Geometric (spin) test with file maps and surfaces under `config`
pub fn spin_test(
    fixed: impl Into<MapSource>,
    perturbed: impl Into<MapSource>,
    params: &EvaluateParams,
    config: &ResourceConfig,
) -> Result<SignificanceResult> {
    SignificanceEvaluator::from_config(config)
        .evaluate(fixed, perturbed, &SpinPermutation, params)
}

/// Spectral (Moran) test with file maps and surfaces under `config`.
///
/// The spectral model for `params.label` / `params.density` comes from
/// `cache`, built from the canonical surface on first use.
pub fn moran_test(
    fixed: impl Into<MapSource>,
    perturbed: impl Into<MapSource>,
    params: &EvaluateParams,
    config: &ResourceConfig,
    cache: &WeightCache,
) -> Result<SignificanceResult> {
    let meshes = JsonSurfaceLoader::new(config.clone());
    let engine = cache.engine(params.label, params.density, &meshes)?;
    SignificanceEvaluator::from_config(config).evaluate(fixed, perturbed, &engine, params)
}
