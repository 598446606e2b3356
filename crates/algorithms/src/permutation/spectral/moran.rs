//! Moran spectral randomisation
//!
//! The eigenvectors of a doubly-centred spatial weight matrix (Moran
//! eigenvector maps) form an orthonormal basis of patterns ordered by their
//! spatial autocorrelation. A map is projected onto that basis and
//! surrogates are rebuilt with randomly flipped coefficient signs, which
//! preserves the map's autocorrelation spectrum.
//!
//! Reference:
//! Wagner, H. H., & Dray, S. (2015). Generating spatially constrained null
//! models for irregularly spaced data using Moran spectral randomization
//! methods. Methods in Ecology and Evolution, 6(10), 1169-1178.

use crate::maybe_rayon::*;
use hippomaps_core::{Algorithm, Density, Error, Result, ScalarField};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use rand::Rng;
use std::sync::Arc;

use super::weights::WeightGraph;
use super::SpectralModel;
use crate::permutation::{stream_rng, PermutationEngine, Permuted};
use crate::resample::InterpolationMethod;

/// Which eigenvectors of the weight matrix to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spectrum {
    /// Every eigenvector except the constant one
    #[default]
    All,
    /// Only eigenvectors whose eigenvalue exceeds the tolerance in magnitude
    NonZero,
}

impl std::str::FromStr for Spectrum {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Spectrum::All),
            "nonzero" | "non-zero" => Ok(Spectrum::NonZero),
            other => Err(Error::InvalidParameter {
                name: "spectrum",
                value: other.to_string(),
                reason: "expected 'all' or 'nonzero'".into(),
            }),
        }
    }
}

/// Moran eigenvector maps of a weight graph, ordered by decreasing eigenvalue
#[derive(Debug, Clone)]
pub struct MoranBasis {
    eigenvalues: Vec<f64>,
    /// n x k, one eigenvector per column
    vectors: DMatrix<f64>,
}

impl MoranBasis {
    /// Eigendecompose the symmetrised, doubly-centred weight matrix.
    pub fn fit(weights: &WeightGraph, spectrum: Spectrum, tol: f64) -> Result<Self> {
        let n = weights.size();
        if n < 3 {
            return Err(Error::Algorithm(format!(
                "Moran basis needs at least 3 vertices, got {}",
                n
            )));
        }

        let dense = weights.to_dense();
        let sym = (&dense + dense.transpose()) * 0.5;

        let row_means: Vec<f64> = (0..n).map(|i| sym.row(i).sum() / n as f64).collect();
        let col_means: Vec<f64> = (0..n).map(|j| sym.column(j).sum() / n as f64).collect();
        let grand = row_means.iter().sum::<f64>() / n as f64;
        let centred =
            DMatrix::from_fn(n, n, |i, j| sym[(i, j)] - row_means[i] - col_means[j] + grand);

        let eigen = SymmetricEigen::new(centred);

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        // the constant vector lies in the null space of the centred matrix
        let constant = (0..n)
            .max_by(|&a, &b| {
                let sa = eigen.eigenvectors.column(a).sum().abs();
                let sb = eigen.eigenvectors.column(b).sum().abs();
                sa.total_cmp(&sb)
            })
            .unwrap_or(0);

        let keep: Vec<usize> = order
            .into_iter()
            .filter(|&k| k != constant)
            .filter(|&k| match spectrum {
                Spectrum::All => true,
                Spectrum::NonZero => eigen.eigenvalues[k].abs() > tol,
            })
            .collect();

        if keep.is_empty() {
            return Err(Error::Algorithm(
                "weight matrix has no eigenvectors above tolerance".into(),
            ));
        }

        let vectors = DMatrix::from_fn(n, keep.len(), |i, c| eigen.eigenvectors[(i, keep[c])]);
        let eigenvalues = keep.iter().map(|&k| eigen.eigenvalues[k]).collect();

        tracing::debug!(vertices = n, components = keep.len(), "Moran basis");
        Ok(Self {
            eigenvalues,
            vectors,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn n_components(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    /// Eigenvector `k` as a plain vector
    pub fn vector(&self, k: usize) -> Option<Vec<f64>> {
        (k < self.n_components()).then(|| self.vectors.column(k).iter().copied().collect())
    }

    fn vectors(&self) -> &DMatrix<f64> {
        &self.vectors
    }
}

/// Parameters for Moran spectral randomisation
#[derive(Debug, Clone)]
pub struct MoranParams {
    /// Number of surrogates
    pub nperm: usize,
    /// Master seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for MoranParams {
    fn default() -> Self {
        Self {
            nperm: 1000,
            seed: None,
        }
    }
}

/// Spectral permutation engine bound to one surface's weight model
#[derive(Debug, Clone)]
pub struct MoranRandomization {
    model: Arc<SpectralModel>,
}

impl MoranRandomization {
    pub fn new(model: Arc<SpectralModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &SpectralModel {
        &self.model
    }

    /// Generate `nperm` surrogates of `field`.
    ///
    /// Missing vertices stay missing in every surrogate; the mean and
    /// standard deviation of the valid vertices are restored on output.
    pub fn randomize(
        &self,
        field: &ScalarField,
        nperm: usize,
        seed: Option<u64>,
    ) -> Result<Vec<ScalarField>> {
        let basis = &self.model.basis;
        let n = basis.vertex_count();
        if field.len() != n {
            return Err(Error::GeometryMismatch {
                expected: n,
                actual: field.len(),
            });
        }
        if nperm == 0 {
            return Err(Error::InvalidParameter {
                name: "nperm",
                value: "0".into(),
                reason: "at least one permutation is required".into(),
            });
        }

        let x = field.values();
        let valid: Vec<bool> = x.iter().map(|v| v.is_finite()).collect();
        let n_valid = valid.iter().filter(|&&v| v).count();
        if n_valid < 2 {
            return Err(Error::Algorithm(format!(
                "Moran randomisation needs at least 2 valid vertices, got {}",
                n_valid
            )));
        }

        let mean = field.valid_mean().unwrap_or(0.0);
        let dev: Vec<f64> = x
            .iter()
            .zip(&valid)
            .map(|(&v, &ok)| if ok { v - mean } else { 0.0 })
            .collect();
        let ss_dev: f64 = dev.iter().map(|d| d * d).sum();
        let sd = (ss_dev / (n_valid - 1) as f64).sqrt();
        let scale = sd * ((n_valid - 1) as f64).sqrt();

        let coefficients = correlations(basis.vectors(), &dev, &valid, ss_dev);

        let seed = seed.unwrap_or_else(rand::random);
        tracing::debug!(nperm, seed, components = coefficients.len(), "Moran randomisation");

        let vectors = basis.vectors();
        let surrogates = (0..nperm)
            .into_par_iter()
            .map(|i| {
                let mut rng = stream_rng(seed, i);
                let flipped = DVector::from_iterator(
                    coefficients.len(),
                    coefficients
                        .iter()
                        .map(|&r| if rng.gen::<bool>() { r } else { -r }),
                );
                let y = vectors * flipped;
                y.iter()
                    .zip(&valid)
                    .map(|(&v, &ok)| if ok { mean + scale * v } else { f64::NAN })
                    .collect::<ScalarField>()
            })
            .collect();
        Ok(surrogates)
    }
}

/// Pearson correlation of the centred map with each eigenvector over valid vertices
fn correlations(vectors: &DMatrix<f64>, dev: &[f64], valid: &[bool], ss_dev: f64) -> Vec<f64> {
    let n_valid = valid.iter().filter(|&&v| v).count() as f64;
    vectors
        .column_iter()
        .map(|v| {
            let vm = v
                .iter()
                .zip(valid)
                .filter_map(|(&x, &ok)| ok.then_some(x))
                .sum::<f64>()
                / n_valid;
            let (mut cov, mut ss_v) = (0.0, 0.0);
            for ((&vi, &d), &ok) in v.iter().zip(dev).zip(valid) {
                if ok {
                    cov += d * (vi - vm);
                    ss_v += (vi - vm) * (vi - vm);
                }
            }
            if ss_dev == 0.0 || ss_v == 0.0 {
                0.0
            } else {
                cov / (ss_dev.sqrt() * ss_v.sqrt())
            }
        })
        .collect()
}

impl Algorithm for MoranRandomization {
    type Input = ScalarField;
    type Output = Vec<ScalarField>;
    type Params = MoranParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Moran spectral randomization"
    }

    fn description(&self) -> &'static str {
        "Sign-flipped reconstructions from Moran eigenvector maps of a surface weight graph"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        self.randomize(&input, params.nperm, params.seed)
    }
}

impl PermutationEngine for MoranRandomization {
    fn name(&self) -> &'static str {
        "spectral"
    }

    fn native_density(&self) -> Option<Density> {
        None
    }

    fn resample_method(&self) -> InterpolationMethod {
        InterpolationMethod::Linear
    }

    fn generate(&self, field: &ScalarField, nperm: usize, seed: Option<u64>) -> Result<Permuted> {
        self.randomize(field, nperm, seed).map(Permuted::Fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::spectral::fixtures::{lattice, lattice_field};
    use crate::permutation::spectral::SpectralConfig;
    use approx::assert_relative_eq;

    fn engine(side: usize, spectrum: Spectrum) -> MoranRandomization {
        let config = SpectralConfig {
            spectrum,
            ..SpectralConfig::default()
        };
        let model = SpectralModel::build(&lattice(side), &config).unwrap();
        MoranRandomization::new(Arc::new(model))
    }

    fn variance(values: &[f64]) -> f64 {
        let m = values.iter().sum::<f64>() / values.len() as f64;
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64
    }

    #[test]
    fn test_basis_is_orthonormal_and_sorted() {
        let w = WeightGraph::inverse_ring_distance(&lattice(4), 1).unwrap();
        let basis = MoranBasis::fit(&w, Spectrum::All, 1e-6).unwrap();
        assert_eq!(basis.vertex_count(), 16);
        assert_eq!(basis.n_components(), 15);
        assert!(basis.eigenvalues().windows(2).all(|p| p[0] >= p[1]));

        let v0 = basis.vector(0).unwrap();
        let v1 = basis.vector(1).unwrap();
        let dot: f64 = v0.iter().zip(&v1).map(|(a, b)| a * b).sum();
        let norm: f64 = v0.iter().map(|a| a * a).sum();
        assert_relative_eq!(dot, 0.0, epsilon = 1e-9);
        assert_relative_eq!(norm, 1.0, epsilon = 1e-9);
        assert!(basis.vector(15).is_none());
    }

    #[test]
    fn test_nonzero_spectrum_drops_null_space() {
        let w = WeightGraph::inverse_ring_distance(&lattice(4), 1).unwrap();
        let basis = MoranBasis::fit(&w, Spectrum::NonZero, 1e-6).unwrap();
        assert!(basis.eigenvalues().iter().all(|e| e.abs() > 1e-6));
        // every kept vector is orthogonal to the constant
        for k in 0..basis.n_components() {
            let s: f64 = basis.vector(k).unwrap().iter().sum();
            assert!(s.abs() < 1e-8, "component {} sums to {}", k, s);
        }
    }

    #[test]
    fn test_surrogates_preserve_moments() {
        let engine = engine(5, Spectrum::NonZero);
        let field = lattice_field(5);
        let x_mean = field.valid_mean().unwrap();
        let x_var = variance(field.values());

        let out = engine.randomize(&field, 20, Some(7)).unwrap();
        assert_eq!(out.len(), 20);
        for s in &out {
            assert_eq!(s.len(), 25);
            assert_relative_eq!(s.valid_mean().unwrap(), x_mean, epsilon = 1e-9);
            assert!(variance(s.values()) <= x_var * (1.0 + 1e-9));
        }
    }

    #[test]
    fn test_full_spectrum_preserves_variance() {
        let engine = engine(5, Spectrum::All);
        let field = lattice_field(5);
        let x_var = variance(field.values());
        for s in engine.randomize(&field, 5, Some(1)).unwrap() {
            assert_relative_eq!(variance(s.values()), x_var, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_missing_vertices_stay_missing() {
        let engine = engine(5, Spectrum::All);
        let mut field = lattice_field(5);
        field.values_mut()[3] = f64::NAN;
        field.values_mut()[17] = f64::NAN;
        for s in engine.randomize(&field, 4, Some(2)).unwrap() {
            assert!(s.is_missing(3));
            assert!(s.is_missing(17));
            assert_eq!(s.valid_count(), 23);
        }
    }

    #[test]
    fn test_seeded_runs_reproduce() {
        let engine = engine(4, Spectrum::All);
        let field = lattice_field(4);
        let a = engine.randomize(&field, 6, Some(11)).unwrap();
        let b = engine.randomize(&field, 6, Some(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_map_yields_constant_surrogates() {
        let engine = engine(4, Spectrum::All);
        let field = ScalarField::filled(16, 2.5);
        for s in engine.randomize(&field, 3, Some(0)).unwrap() {
            assert!(s.values().iter().all(|&v| (v - 2.5).abs() < 1e-12));
        }
    }

    #[test]
    fn test_length_mismatch_is_geometry_error() {
        let engine = engine(4, Spectrum::All);
        let err = engine.randomize(&ScalarField::filled(10, 1.0), 3, Some(0)).unwrap_err();
        assert!(matches!(err, Error::GeometryMismatch { expected: 16, actual: 10 }));
    }

    #[test]
    fn test_zero_permutations_rejected() {
        let engine = engine(4, Spectrum::All);
        assert!(engine.randomize(&lattice_field(4), 0, Some(0)).is_err());
    }

    #[test]
    fn test_spectrum_from_str() {
        assert_eq!("all".parse::<Spectrum>().unwrap(), Spectrum::All);
        assert_eq!("NonZero".parse::<Spectrum>().unwrap(), Spectrum::NonZero);
        assert!("some".parse::<Spectrum>().is_err());
    }
}
