//! Similarity metrics between two maps
//!
//! - **pearson**: linear correlation
//! - **spearman**: rank correlation
//! - **adjusted_rand**: clustering agreement (discretised maps)
//! - **adjusted_mutual_info**: information-theoretic agreement (discretised maps)
//!
//! All metrics exclude missing (non-finite) values pairwise.

mod clustering;
mod correlation;

pub use clustering::{adjusted_mutual_info, adjusted_rand};
pub use correlation::{pearson, rank_average, spearman};

use hippomaps_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Map comparison strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    #[default]
    Pearson,
    Spearman,
    AdjustedRand,
    AdjustedMutualInfo,
}

impl Metric {
    pub const ALL: &[Metric] = &[
        Metric::Pearson,
        Metric::Spearman,
        Metric::AdjustedRand,
        Metric::AdjustedMutualInfo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Pearson => "pearson",
            Metric::Spearman => "spearman",
            Metric::AdjustedRand => "adjusted_rand",
            Metric::AdjustedMutualInfo => "adjusted_mutual_info",
        }
    }

    /// Compare two equal-length maps.
    ///
    /// The result may be NaN for degenerate inputs (e.g. a constant map under
    /// a correlation metric); callers decide how to treat that.
    pub fn compare(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(Error::ShapeMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        Ok(match self {
            Metric::Pearson => pearson(a, b),
            Metric::Spearman => spearman(a, b),
            Metric::AdjustedRand => adjusted_rand(a, b),
            Metric::AdjustedMutualInfo => adjusted_mutual_info(a, b),
        })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "pearson" => Ok(Metric::Pearson),
            "spearman" => Ok(Metric::Spearman),
            "adjusted_rand" => Ok(Metric::AdjustedRand),
            "adjusted_mutual_info" => Ok(Metric::AdjustedMutualInfo),
            _ => Err(Error::UnsupportedMetric(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("pearson".parse::<Metric>().unwrap(), Metric::Pearson);
        assert_eq!("Spearman".parse::<Metric>().unwrap(), Metric::Spearman);
        assert_eq!("adjusted rand".parse::<Metric>().unwrap(), Metric::AdjustedRand);
        assert_eq!(
            "adjusted_mutual_info".parse::<Metric>().unwrap(),
            Metric::AdjustedMutualInfo
        );
        for m in Metric::ALL {
            assert_eq!(m.name().parse::<Metric>().unwrap(), *m);
        }
    }

    #[test]
    fn test_unknown_metric() {
        assert!(matches!(
            "kendall".parse::<Metric>(),
            Err(Error::UnsupportedMetric(name)) if name == "kendall"
        ));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            Metric::Pearson.compare(&[1.0, 2.0], &[1.0]),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_compare_dispatch() {
        let a = [1.0, 2.0, 3.0, 4.0];
        for m in Metric::ALL {
            let s = m.compare(&a, &a).unwrap();
            assert!((s - 1.0).abs() < 1e-9, "{} self-similarity = {}", m, s);
        }
    }
}
