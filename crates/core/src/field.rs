//! Per-vertex scalar fields

use ndarray::{Array1, ArrayView1};

/// A scalar value per surface vertex.
///
/// Values are stored in vertex order. Missing vertices are encoded as NaN
/// and are excluded pairwise by the similarity metrics.
///
/// The field itself does not record its tessellation; callers pair it with a
/// (label, density) and [`crate::VertexCountRegistry`] checks the length.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    values: Vec<f64>,
}

impl ScalarField {
    /// Create a field from vertex values
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Create a field of `len` vertices all holding `value`
    pub fn filled(len: usize, value: f64) -> Self {
        Self {
            values: vec![value; len],
        }
    }

    /// Create a field from an ndarray vector
    pub fn from_array(values: Array1<f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the field has no vertices
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Vertex values as a slice
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable vertex values
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Borrow as an ndarray view
    pub fn view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(&self.values[..])
    }

    /// Consume the field and return the values
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Value at vertex `index`, if it exists
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Whether vertex `index` is missing (NaN or out of range)
    pub fn is_missing(&self, index: usize) -> bool {
        self.get(index).map_or(true, f64::is_nan)
    }

    /// Number of non-missing vertices
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// Mean over non-missing vertices, `None` if all are missing
    pub fn valid_mean(&self) -> Option<f64> {
        let (sum, count) = self
            .values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Calculate basic statistics over non-missing vertices
    pub fn statistics(&self) -> FieldStatistics {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut sum = 0.0;
        let mut count = 0usize;

        for &v in &self.values {
            if v.is_nan() {
                continue;
            }
            min = Some(min.map_or(v, |m| m.min(v)));
            max = Some(max.map_or(v, |m| m.max(v)));
            sum += v;
            count += 1;
        }

        FieldStatistics {
            min,
            max,
            mean: if count > 0 { Some(sum / count as f64) } else { None },
            valid_count: count,
            missing_count: self.len() - count,
        }
    }
}

impl From<Vec<f64>> for ScalarField {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<f64> for ScalarField {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Basic statistics for a scalar field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub missing_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_statistics() {
        let field = ScalarField::new(vec![1.0, f64::NAN, 3.0, 5.0]);
        let stats = field.statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(5.0));
        assert_eq!(stats.mean, Some(3.0));
        assert_eq!(stats.valid_count, 3);
        assert_eq!(stats.missing_count, 1);
    }

    #[test]
    fn test_missing() {
        let field = ScalarField::new(vec![0.0, f64::NAN]);
        assert!(!field.is_missing(0));
        assert!(field.is_missing(1));
        assert!(field.is_missing(2));
        assert_eq!(field.valid_mean(), Some(0.0));
        assert_eq!(ScalarField::filled(3, f64::NAN).valid_mean(), None);
    }
}
