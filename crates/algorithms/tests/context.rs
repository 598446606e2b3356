//! Contextualisation against a catalog read from a resource tree.

use hippomaps_algorithms::context::{ContextParams, Contextualizer, FeatureCatalog};
use hippomaps_core::{Density, ResourceConfig, ScalarField};

const V: usize = 7262;

fn ramp(scale: f64, offset: f64) -> Vec<f64> {
    (0..V).map(|i| scale * i as f64 / V as f64 + offset).collect()
}

fn wave(freq: f64) -> Vec<f64> {
    (0..V).map(|i| (i as f64 / V as f64 * freq).sin()).collect()
}

fn write_catalog(config: &ResourceConfig) -> FeatureCatalog {
    let catalog = FeatureCatalog {
        features: ["thickness", "gyrification", "T1w/T2w", "NDI", "ODI"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        feature_n: vec![1, 2, 3, 4, 5],
        feature_data: vec![ramp(1.0, 0.0), wave(3.0), wave(11.0), wave(29.0), ramp(-0.5, 2.0)],
        ap: ramp(1.0, 0.0),
        subfields: vec![
            (0..V).map(|i| if i < V / 3 { 1.0 } else { 0.0 }).collect(),
            (0..V).map(|i| if i >= V / 3 { 1.0 } else { 0.0 }).collect(),
        ],
        axis_corr_ap: vec![0.9, 0.3, 0.1, 0.05, 0.9],
        subfields_max_corr: vec![0.7, 0.4, 0.2, 0.1, 0.7],
        colors: vec![0, 1, 2, 3, 4],
    };
    let path = config.catalog_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    catalog.save(&path).unwrap();
    catalog
}

#[test]
fn top_three_of_five_features() {
    let dir = tempfile::tempdir().unwrap();
    let config = ResourceConfig::new(dir.path());
    write_catalog(&config);

    let ctx = Contextualizer::from_config(&config).unwrap();
    assert_eq!(ctx.density(), Density::HalfMm);

    let maps = vec![
        ScalarField::new(wave(3.0)),
        ScalarField::new(ramp(-3.0, 1.0)),
        ScalarField::new(wave(11.5)),
    ];
    let params = ContextParams {
        top_n: 3,
        permutation_test: false,
        plot: false,
        ..ContextParams::default()
    };
    let out = ctx.contextualize(&maps, &params, None).unwrap();

    assert_eq!(out.top_features.len(), 3);
    for t in 0..3 {
        assert_eq!(out.top_features[t].len(), 3);
        assert_eq!(out.top_r[t].len(), 3);
        assert!(out.top_r[t].windows(2).all(|w| w[0].abs() >= w[1].abs()));
    }
    assert_eq!(out.top_features[0][0], "gyrification");
    assert!((out.top_r[0][0] - 1.0).abs() < 1e-9);
    // descending ramp: perfectly anti-correlated with one ramp, correlated with the other
    assert!((out.top_r[1][0].abs() - 1.0).abs() < 1e-9);
    assert!((out.ap_corr[1] - 1.0).abs() < 1e-9);
    assert!(out.subfield_corr.iter().all(|r| (0.0..=1.0).contains(r)));
}

#[test]
fn catalog_round_trips_through_resources() {
    let dir = tempfile::tempdir().unwrap();
    let config = ResourceConfig::new(dir.path());
    let written = write_catalog(&config);
    let read = FeatureCatalog::load(&config).unwrap();
    assert_eq!(read.features, written.features);
    assert_eq!(read.vertex_count(), V);
}
