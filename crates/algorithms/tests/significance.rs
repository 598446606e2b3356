//! End-to-end significance tests for both null models.

use hippomaps_algorithms::metrics::Metric;
use hippomaps_algorithms::permutation::{Permuted, SpinPermutation, WeightCache};
use hippomaps_algorithms::resample::UnfoldedResampler;
use hippomaps_algorithms::significance::{spin_test, EvaluateParams, SignificanceEvaluator};
use hippomaps_core::io::{write_field_text, FileMapLoader, MapSource, MeshLoader};
use hippomaps_core::{
    Density, Error, Label, ResourceConfig, Result, ScalarField, SurfaceMesh, SurfaceSpace,
    VertexCountRegistry, UNFOLDED_COLS, UNFOLDED_ROWS,
};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn unfolded_map(phase: f64) -> ScalarField {
    (0..UNFOLDED_ROWS * UNFOLDED_COLS)
        .map(|i| {
            let (r, c) = ((i / UNFOLDED_COLS) as f64, (i % UNFOLDED_COLS) as f64);
            (r * 0.1 + phase).sin() + (c * 0.07).cos()
        })
        .collect()
}

/// Evaluator whose resource tree is empty; unfoldiso inputs never touch it
fn evaluator() -> SignificanceEvaluator {
    SignificanceEvaluator::from_config(&ResourceConfig::new(std::env::temp_dir()))
}

fn mean(values: &[f64]) -> f64 {
    let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    valid.iter().sum::<f64>() / valid.len() as f64
}

fn spin_params(nperm: usize) -> EvaluateParams {
    EvaluateParams {
        nperm,
        density: Density::Unfoldiso,
        seed: Some(42),
        ..EvaluateParams::default()
    }
}

fn lattice(side: usize) -> SurfaceMesh {
    let vertices = (0..side * side)
        .map(|i| [(i % side) as f64, (i / side) as f64, 0.0])
        .collect();
    let mut faces = Vec::new();
    for r in 0..side - 1 {
        for c in 0..side - 1 {
            let a = r * side + c;
            faces.push([a, a + 1, a + side + 1]);
            faces.push([a, a + side + 1, a + side]);
        }
    }
    SurfaceMesh::new(vertices, faces).unwrap()
}

struct LatticeMeshes(usize);

impl MeshLoader for LatticeMeshes {
    fn load_surface(&self, _: Label, _: Density, _: SurfaceSpace) -> Result<SurfaceMesh> {
        Ok(lattice(self.0))
    }
}

fn lattice_map(side: usize, phase: f64) -> ScalarField {
    (0..side * side)
        .map(|i| ((i / side) as f64 * 0.8 + phase).sin() + (i % side) as f64 * 0.2)
        .collect()
}

fn spectral_evaluator(count: usize, meshes: Arc<LatticeMeshes>) -> SignificanceEvaluator {
    let mut registry = VertexCountRegistry::default();
    registry.insert(Label::Hipp, Density::TwoMm, count);
    SignificanceEvaluator::new(
        Arc::new(FileMapLoader),
        Arc::new(UnfoldedResampler::new(meshes)),
        registry,
    )
}

fn spectral_params(nperm: usize) -> EvaluateParams {
    EvaluateParams {
        nperm,
        density: Density::TwoMm,
        seed: Some(3),
        ..EvaluateParams::default()
    }
}

// ---------------------------------------------------------------------------
// Geometric null
// ---------------------------------------------------------------------------

#[test]
fn spin_seeded_runs_are_identical() {
    let evaluator = evaluator();
    let x = unfolded_map(0.0);
    let y = unfolded_map(0.4);

    let a = evaluator
        .evaluate(x.clone(), y.clone(), &SpinPermutation, &spin_params(4))
        .unwrap();
    let b = evaluator.evaluate(x, y, &SpinPermutation, &spin_params(4)).unwrap();

    assert_eq!(a.null, b.null);
    assert_eq!(a.p_value, b.p_value);
    assert_eq!(a.observed, b.observed);
    assert!(matches!(a.permuted, Permuted::Grids(ref g) if g.len() == 4));
}

#[test]
fn spin_self_similarity_is_one() {
    let x = unfolded_map(0.2);
    let result = evaluator()
        .evaluate(x.clone(), x, &SpinPermutation, &spin_params(3))
        .unwrap();
    assert!((result.observed - 1.0).abs() < 1e-12);
    assert!((0.0..=1.0).contains(&result.p_value));
    assert_eq!(result.null.len(), 3);
}

#[test]
fn spin_single_permutation_p_is_binary() {
    let result = evaluator()
        .evaluate(unfolded_map(0.0), unfolded_map(1.0), &SpinPermutation, &spin_params(1))
        .unwrap();
    assert_eq!(result.null.len(), 1);
    assert!(result.p_value == 0.0 || result.p_value == 1.0);
}

#[test]
fn spin_constant_inputs_are_undefined() {
    let ones = ScalarField::filled(UNFOLDED_ROWS * UNFOLDED_COLS, 1.0);
    let err = evaluator()
        .evaluate(ones.clone(), ones, &SpinPermutation, &spin_params(2))
        .unwrap_err();
    assert!(matches!(err, Error::UndefinedStatistic(_)));
}

#[test]
fn spin_rejects_zero_permutations() {
    let x = unfolded_map(0.0);
    let err = evaluator()
        .evaluate(x.clone(), x, &SpinPermutation, &spin_params(0))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { name: "nperm", .. }));
}

#[test]
fn spin_rejects_wrong_length() {
    let short = ScalarField::filled(100, 0.5);
    let err = evaluator()
        .evaluate(short.clone(), short, &SpinPermutation, &spin_params(2))
        .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { expected: 32004, actual: 100 }));
}

#[test]
fn spin_loads_maps_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixed.txt");
    let x = unfolded_map(0.3);
    write_field_text(&x, &path).unwrap();

    let result = evaluator()
        .evaluate(MapSource::from(path.as_path()), x, &SpinPermutation, &spin_params(2))
        .unwrap();
    assert!((result.observed - 1.0).abs() < 1e-9);
}

#[test]
fn spin_rotates_the_perturbed_map() {
    let n = UNFOLDED_ROWS * UNFOLDED_COLS;
    let fixed: ScalarField = (0..n)
        .map(|i| 100.0 + ((i / UNFOLDED_COLS) as f64 * 0.1).sin())
        .collect();
    let perturbed: ScalarField = (0..n)
        .map(|i| ((i % UNFOLDED_COLS) as f64 * 0.07).cos())
        .collect();

    let result = evaluator()
        .evaluate(fixed.clone(), perturbed, &SpinPermutation, &spin_params(2))
        .unwrap();

    assert_eq!(result.permuted.len(), 2);
    for i in 0..2 {
        let surrogate = result.permuted.values(i).unwrap();
        // rotated copies of a map centred near 0, not of the one near 100
        assert!(mean(&surrogate).abs() < 5.0);
        let r = Metric::Pearson.compare(fixed.values(), &surrogate).unwrap();
        assert_eq!(result.null[i], r);
    }
}

#[test]
fn spin_test_reads_surfaces_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = ResourceConfig::new(dir.path());

    // unfoldiso needs no surfaces
    let x = unfolded_map(0.0);
    let result = spin_test(x.clone(), unfolded_map(0.7), &spin_params(2), &config).unwrap();
    assert_eq!(result.null.len(), 2);

    // other densities resample through the (empty) configured tree
    let params = EvaluateParams {
        density: Density::TwoMm,
        ..spin_params(2)
    };
    let small = ScalarField::filled(419, 1.0);
    let err = spin_test(small.clone(), small, &params, &config).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn spin_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = evaluator()
        .evaluate(
            dir.path().join("absent.txt"),
            unfolded_map(0.0),
            &SpinPermutation,
            &spin_params(2),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

// ---------------------------------------------------------------------------
// Spectral null
// ---------------------------------------------------------------------------

#[test]
fn moran_results_reproduce_and_bound_p() {
    let meshes = Arc::new(LatticeMeshes(6));
    let evaluator = spectral_evaluator(36, Arc::clone(&meshes));
    let cache = WeightCache::default();
    let engine = cache.engine(Label::Hipp, Density::TwoMm, meshes.as_ref()).unwrap();

    let x = lattice_map(6, 0.0);
    let y = lattice_map(6, 0.5);
    let a = evaluator
        .evaluate(x.clone(), y.clone(), &engine, &spectral_params(40))
        .unwrap();
    let b = evaluator.evaluate(x, y, &engine, &spectral_params(40)).unwrap();

    assert_eq!(a.null, b.null);
    assert!((0.0..=1.0).contains(&a.p_value));
    match &a.permuted {
        Permuted::Fields(f) => {
            assert_eq!(f.len(), 40);
            assert!(f.iter().all(|s| s.len() == 36));
        }
        Permuted::Grids(_) => panic!("spectral null should yield surface fields"),
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn moran_honours_selected_metric() {
    let meshes = Arc::new(LatticeMeshes(5));
    let evaluator = spectral_evaluator(25, Arc::clone(&meshes));
    let engine = WeightCache::default()
        .engine(Label::Hipp, Density::TwoMm, meshes.as_ref())
        .unwrap();

    let x = lattice_map(5, 0.0);
    let params = EvaluateParams {
        metric: Metric::Spearman,
        ..spectral_params(10)
    };
    let result = evaluator.evaluate(x.clone(), x, &engine, &params).unwrap();
    assert!((result.observed - 1.0).abs() < 1e-12);
    assert!(result.null.iter().all(|r| (-1.0..=1.0).contains(r)));
}

#[test]
fn moran_randomizes_the_perturbed_map() {
    let meshes = Arc::new(LatticeMeshes(6));
    let evaluator = spectral_evaluator(36, Arc::clone(&meshes));
    let engine = WeightCache::default()
        .engine(Label::Hipp, Density::TwoMm, meshes.as_ref())
        .unwrap();

    let fixed: ScalarField = lattice_map(6, 0.0).values().iter().map(|v| v + 100.0).collect();
    let mut perturbed = lattice_map(6, 0.9);
    perturbed.values_mut()[3] = f64::NAN;

    let result = evaluator
        .evaluate(fixed.clone(), perturbed, &engine, &spectral_params(8))
        .unwrap();

    let surrogates = match &result.permuted {
        Permuted::Fields(f) => f,
        Permuted::Grids(_) => panic!("spectral null should yield surface fields"),
    };
    for (i, s) in surrogates.iter().enumerate() {
        // the perturbed map's missing vertex and scale carry over
        assert!(s.is_missing(3));
        assert_eq!(s.valid_count(), 35);
        assert!(mean(s.values()).abs() < 50.0);
        let r = Metric::Pearson.compare(fixed.values(), s.values()).unwrap();
        assert_eq!(result.null[i], r);
    }
}

#[test]
fn moran_geometry_mismatch() {
    // registry says 36 vertices, but the weights come from a 25-vertex surface
    let evaluator = spectral_evaluator(36, Arc::new(LatticeMeshes(6)));
    let small = LatticeMeshes(5);
    let engine = WeightCache::default()
        .engine(Label::Hipp, Density::TwoMm, &small)
        .unwrap();

    let x = lattice_map(6, 0.0);
    let y = lattice_map(6, 1.0);
    let err = evaluator.evaluate(x, y, &engine, &spectral_params(5)).unwrap_err();
    assert!(matches!(err, Error::GeometryMismatch { expected: 25, actual: 36 }));
}
