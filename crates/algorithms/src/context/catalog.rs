//! Reference catalog of published feature maps

use hippomaps_core::{Error, ResourceConfig, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Feature maps with their precomputed positions in the 2D context space.
///
/// Stored as JSON; missing values are written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCatalog {
    /// Feature names
    pub features: Vec<String>,
    /// Display numbers used as plot annotations
    pub feature_n: Vec<u32>,
    /// One map per feature, all of the same length
    #[serde(deserialize_with = "nullable_maps")]
    pub feature_data: Vec<Vec<f64>>,
    /// Anterior-posterior coordinate of every vertex
    #[serde(deserialize_with = "nullable_values")]
    pub ap: Vec<f64>,
    /// Subfield indicator maps
    #[serde(deserialize_with = "nullable_maps")]
    pub subfields: Vec<Vec<f64>>,
    /// |correlation| of each feature with the AP axis
    #[serde(deserialize_with = "nullable_values")]
    pub axis_corr_ap: Vec<f64>,
    /// max |Spearman| of each feature against the subfields
    #[serde(deserialize_with = "nullable_values")]
    pub subfields_max_corr: Vec<f64>,
    /// Qualitative palette index per feature
    pub colors: Vec<u8>,
}

fn nullable_values<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<f64>, D::Error> {
    let raw: Vec<Option<f64>> = Vec::deserialize(d)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn nullable_maps<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<Vec<f64>>, D::Error> {
    let raw: Vec<Vec<Option<f64>>> = Vec::deserialize(d)?;
    Ok(raw
        .into_iter()
        .map(|m| m.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        .collect())
}

impl FeatureCatalog {
    /// Read the catalog from its location under the resource root
    pub fn load(config: &ResourceConfig) -> Result<Self> {
        Self::from_path(&config.catalog_path())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        tracing::debug!("reading feature catalog {}", path.display());
        let reader = BufReader::new(File::open(path)?);
        let catalog: FeatureCatalog = serde_json::from_reader(reader)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Check that every per-feature table has one entry per feature and
    /// every map has one value per vertex.
    pub fn validate(&self) -> Result<()> {
        let f = self.features.len();
        if f == 0 {
            return Err(Error::Format("feature catalog is empty".into()));
        }
        let per_feature = [
            ("feature_n", self.feature_n.len()),
            ("feature_data", self.feature_data.len()),
            ("axis_corr_ap", self.axis_corr_ap.len()),
            ("subfields_max_corr", self.subfields_max_corr.len()),
            ("colors", self.colors.len()),
        ];
        for (name, len) in per_feature {
            if len != f {
                return Err(Error::Format(format!(
                    "catalog field '{}' has {} entries for {} features",
                    name, len, f
                )));
            }
        }

        let v = self.ap.len();
        if v == 0 {
            return Err(Error::Format("catalog AP axis is empty".into()));
        }
        let maps = self.feature_data.iter().chain(&self.subfields);
        if let Some(bad) = maps.map(Vec::len).find(|&len| len != v) {
            return Err(Error::Format(format!(
                "catalog map has {} values, expected {}",
                bad, v
            )));
        }
        Ok(())
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Vertices per map
    pub fn vertex_count(&self) -> usize {
        self.ap.len()
    }

    pub fn feature(&self, index: usize) -> Option<&[f64]> {
        self.feature_data.get(index).map(Vec::as_slice)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Five features over `v` vertices with distinct spatial patterns
    pub(crate) fn small_catalog(v: usize) -> FeatureCatalog {
        let x: Vec<f64> = (0..v).map(|i| i as f64 / v as f64).collect();
        let feature_data = vec![
            x.clone(),
            x.iter().map(|t| -2.0 * t + 1.0).collect(),
            x.iter().map(|t| (t * 9.0).sin()).collect(),
            x.iter().map(|t| (t - 0.5).powi(2)).collect(),
            x.iter().map(|t| (t * 23.0).cos()).collect(),
        ];
        FeatureCatalog {
            features: ["thickness", "curvature", "T1w", "FA", "MD"].map(String::from).to_vec(),
            feature_n: vec![1, 2, 3, 4, 5],
            feature_data,
            ap: x.clone(),
            subfields: vec![
                x.iter().map(|&t| if t < 0.5 { 1.0 } else { 0.0 }).collect(),
                x.iter().map(|&t| if t >= 0.5 { 1.0 } else { 0.0 }).collect(),
            ],
            axis_corr_ap: vec![1.0, 1.0, 0.2, 0.1, 0.05],
            subfields_max_corr: vec![0.8, 0.8, 0.3, 0.1, 0.1],
            colors: vec![0, 1, 2, 3, 4],
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResourceConfig::new(dir.path());
        let path = config.catalog_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        let mut catalog = small_catalog(20);
        catalog.feature_data[2][4] = f64::NAN;
        catalog.save(&path).unwrap();

        let loaded = FeatureCatalog::load(&config).unwrap();
        assert_eq!(loaded.feature_count(), 5);
        assert_eq!(loaded.vertex_count(), 20);
        assert!(loaded.feature(2).unwrap()[4].is_nan());
        assert_eq!(loaded.feature(0), catalog.feature(0));
        assert!(loaded.feature(5).is_none());
    }

    #[test]
    fn test_validate_rejects_ragged_maps() {
        let mut catalog = small_catalog(10);
        catalog.subfields[1].pop();
        assert!(matches!(catalog.validate(), Err(Error::Format(_))));
    }

    #[test]
    fn test_validate_rejects_missing_colors() {
        let mut catalog = small_catalog(10);
        catalog.colors.truncate(3);
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("colors"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FeatureCatalog::load(&ResourceConfig::new(dir.path())).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
