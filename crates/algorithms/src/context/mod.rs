//! Placing new maps in the context of the reference catalog
//!
//! Every task map is compared with each catalog feature, the closest
//! features are ranked by absolute correlation, and the map is positioned on
//! two summary axes: correlation with the anterior-posterior coordinate and
//! the strongest correlation with any subfield.

mod catalog;

pub use catalog::FeatureCatalog;

use crate::maybe_rayon::*;
use crate::metrics::{pearson, spearman, Metric};
use crate::permutation::{PermutationEngine, SpinPermutation};
use crate::resample::InterpolationMethod;
use crate::significance::{score, EvaluateParams, SignificanceEvaluator};
use hippomaps_core::{
    Density, Error, Label, PointStyle, Renderer, ResourceConfig, Result, ScalarField, ScatterPlot,
};
use tracing::{debug, info, warn};

/// Parameters for [`Contextualizer::contextualize`]
#[derive(Debug, Clone)]
pub struct ContextParams {
    /// Closest features reported per map
    pub top_n: usize,
    /// Spin-test each pair instead of a plain Pearson correlation
    pub permutation_test: bool,
    pub nperm: usize,
    pub seed: Option<u64>,
    /// Build and render the context scatter plot
    pub plot: bool,
}

impl Default for ContextParams {
    fn default() -> Self {
        Self {
            top_n: 3,
            permutation_test: true,
            nperm: 1000,
            seed: None,
            plot: true,
        }
    }
}

/// Rankings and axis positions for `T` task maps
#[derive(Debug, Clone, PartialEq)]
pub struct ContextResult {
    /// T x top_n feature names, closest first
    pub top_features: Vec<Vec<String>>,
    /// Signed correlation of each ranked feature
    pub top_r: Vec<Vec<f64>>,
    /// Spin-test p-value of each ranked feature; NaN without a permutation test
    pub top_p: Vec<Vec<f64>>,
    /// |Spearman| with the AP axis, per map
    pub ap_corr: Vec<f64>,
    /// max |Spearman| with any subfield, per map
    pub subfield_corr: Vec<f64>,
    /// The plot handed to the renderer, if one was requested
    pub scatter: Option<ScatterPlot>,
}

/// Ranks task maps against a [`FeatureCatalog`].
#[derive(Debug)]
pub struct Contextualizer {
    catalog: FeatureCatalog,
    evaluator: SignificanceEvaluator,
    label: Label,
    density: Density,
}

impl Contextualizer {
    /// The catalog's density is looked up from its vertex count in the
    /// evaluator's registry.
    pub fn new(catalog: FeatureCatalog, evaluator: SignificanceEvaluator) -> Result<Self> {
        catalog.validate()?;
        let label = Label::Hipp;
        let density = evaluator
            .registry()
            .density_for(label, catalog.vertex_count())
            .ok_or_else(|| Error::UnknownTessellation {
                label: label.to_string(),
                density: format!("<{} vertices>", catalog.vertex_count()),
            })?;
        Ok(Self {
            catalog,
            evaluator,
            label,
            density,
        })
    }

    /// Catalog and reference surfaces from a resource tree
    pub fn from_config(config: &ResourceConfig) -> Result<Self> {
        let catalog = FeatureCatalog::load(config)?;
        Self::new(catalog, SignificanceEvaluator::from_config(config))
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    pub fn density(&self) -> Density {
        self.density
    }

    pub fn contextualize(
        &self,
        task_maps: &[ScalarField],
        params: &ContextParams,
        renderer: Option<&mut dyn Renderer>,
    ) -> Result<ContextResult> {
        let maps = task_maps
            .iter()
            .map(|m| self.to_catalog_density(m))
            .collect::<Result<Vec<_>>>()?;
        let n_features = self.catalog.feature_count();
        let top_n = params.top_n.min(n_features);
        info!(maps = maps.len(), features = n_features, top_n, "contextualizing");

        let (mut top_features, mut top_r, mut top_p) = (Vec::new(), Vec::new(), Vec::new());
        if top_n > 0 {
            let (r, p) = self.compare_all(&maps, params)?;
            for (r_row, p_row) in r.iter().zip(&p) {
                let order = rank_by_magnitude(r_row);
                let picked = &order[..top_n];
                top_features
                    .push(picked.iter().map(|&j| self.catalog.features[j].clone()).collect());
                top_r.push(picked.iter().map(|&j| r_row[j]).collect());
                top_p.push(picked.iter().map(|&j| p_row[j]).collect());
            }
        } else {
            top_features = vec![Vec::new(); maps.len()];
            top_r = vec![Vec::new(); maps.len()];
            top_p = vec![Vec::new(); maps.len()];
        }

        let ap_corr: Vec<f64> = maps
            .iter()
            .map(|m| spearman(m.values(), &self.catalog.ap).abs())
            .collect();
        let subfield_corr: Vec<f64> = maps
            .iter()
            .map(|m| {
                self.catalog
                    .subfields
                    .iter()
                    .map(|s| spearman(m.values(), s).abs())
                    .filter(|r| !r.is_nan())
                    .fold(f64::NAN, f64::max)
            })
            .collect();

        let scatter = params.plot.then(|| self.scatter(&ap_corr, &subfield_corr));
        if let (Some(plot), Some(renderer)) = (scatter.as_ref(), renderer) {
            if let Err(e) = renderer.render(plot) {
                warn!("context plot could not be rendered: {}", e);
            }
        }

        Ok(ContextResult {
            top_features,
            top_r,
            top_p,
            ap_corr,
            subfield_corr,
            scatter,
        })
    }

    fn to_catalog_density(&self, map: &ScalarField) -> Result<ScalarField> {
        let expected = self.catalog.vertex_count();
        if map.len() == expected {
            return Ok(map.clone());
        }
        let from = self
            .evaluator
            .registry()
            .density_for(self.label, map.len())
            .ok_or(Error::ShapeMismatch {
                expected,
                actual: map.len(),
            })?;
        debug!("task map at {} resampled to {}", from, self.density);
        self.evaluator
            .resampler()
            .interpolate(from, self.density, map, self.label, InterpolationMethod::Linear)
    }

    /// T x F correlation and p-value tables
    fn compare_all(
        &self,
        maps: &[ScalarField],
        params: &ContextParams,
    ) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
        let n_features = self.catalog.feature_count();
        let pairs: Vec<(f64, f64)> = if params.permutation_test {
            self.spin_all(maps, params)?
        } else {
            (0..maps.len() * n_features)
                .into_par_iter()
                .map(|k| {
                    let (t, j) = (k / n_features, k % n_features);
                    let r = pearson(maps[t].values(), &self.catalog.feature_data[j]);
                    if r.is_nan() {
                        warn!("map {} vs {}: correlation undefined", t, self.catalog.features[j]);
                    }
                    (r, f64::NAN)
                })
                .collect()
        };

        let r = pairs
            .chunks(n_features)
            .map(|row| row.iter().map(|&(r, _)| r).collect())
            .collect();
        let p = pairs
            .chunks(n_features)
            .map(|row| row.iter().map(|&(_, p)| p).collect())
            .collect();
        Ok((r, p))
    }

    /// Spin test for every (map, feature) pair on the unfolded grid
    fn spin_all(&self, maps: &[ScalarField], params: &ContextParams) -> Result<Vec<(f64, f64)>> {
        let engine = SpinPermutation;
        let native = engine.native_density().unwrap_or(Density::Unfoldiso);
        let method = engine.resample_method();
        let resampler = self.evaluator.resampler();
        let to_native =
            |f: &ScalarField| resampler.interpolate(self.density, native, f, self.label, method);

        // each input is resampled once, not once per pair
        let task_grids = maps.iter().map(|m| to_native(m)).collect::<Result<Vec<_>>>()?;
        let feature_grids = self
            .catalog
            .feature_data
            .iter()
            .map(|f| to_native(&ScalarField::new(f.clone())))
            .collect::<Result<Vec<_>>>()?;

        let n_features = feature_grids.len();
        (0..task_grids.len() * n_features)
            .into_par_iter()
            .map(|k| {
                let (t, j) = (k / n_features, k % n_features);
                let eval = EvaluateParams {
                    nperm: params.nperm,
                    metric: Metric::Pearson,
                    label: self.label,
                    density: native,
                    seed: params.seed.map(|s| s.wrapping_add(k as u64)),
                };
                // the task map stays fixed; the catalog feature is rotated
                match score(&task_grids[t], &feature_grids[j], &engine, &eval) {
                    Ok(res) => Ok((res.observed, res.p_value)),
                    Err(Error::UndefinedStatistic(msg)) => {
                        warn!("map {} vs {}: {}", t, self.catalog.features[j], msg);
                        Ok((f64::NAN, f64::NAN))
                    }
                    Err(e) => Err(e),
                }
            })
            .collect()
    }

    fn scatter(&self, ap_corr: &[f64], subfield_corr: &[f64]) -> ScatterPlot {
        let mut plot = ScatterPlot::new(
            "absolute AP correlation",
            "absolute subfield correlation (Spearman's R)",
        );
        for f in 0..self.catalog.feature_count() {
            plot.push(
                self.catalog.axis_corr_ap[f],
                self.catalog.subfields_max_corr[f],
                self.catalog.feature_n[f].to_string(),
                PointStyle::Palette(self.catalog.colors[f]),
            );
        }
        for (t, (&x, &y)) in ap_corr.iter().zip(subfield_corr).enumerate() {
            plot.push(x, y, t.to_string(), PointStyle::Highlight);
        }
        plot
    }
}

/// Feature indices by descending |r|, NaN last
fn rank_by_magnitude(r: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..r.len()).collect();
    order.sort_by(|&a, &b| match (r[a].is_nan(), r[b].is_nan()) {
        (false, false) => r[b].abs().total_cmp(&r[a].abs()),
        (x, y) => x.cmp(&y),
    });
    order
}
