//! Clustering agreement scores: adjusted Rand index and adjusted mutual information
//!
//! Each distinct value of an input is treated as a cluster label. These scores
//! are meant for discretised maps (parcellations, subfield labels); on
//! continuous maps nearly every vertex is its own cluster and the scores
//! degenerate.

use statrs::function::gamma::ln_gamma;
use std::collections::HashMap;

use super::correlation::paired_valid;

/// Contingency table between two labelings
struct Contingency {
    /// Non-zero cells as (row, col, n_ij)
    cells: Vec<(usize, usize, usize)>,
    /// Row marginals a_i
    rows: Vec<usize>,
    /// Column marginals b_j
    cols: Vec<usize>,
    n: usize,
}

fn label_key(v: f64) -> u64 {
    // -0.0 and 0.0 are the same label
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

fn encode(values: &[f64]) -> (Vec<usize>, usize) {
    let mut ids: HashMap<u64, usize> = HashMap::new();
    let codes = values
        .iter()
        .map(|&v| {
            let next = ids.len();
            *ids.entry(label_key(v)).or_insert(next)
        })
        .collect();
    (codes, ids.len())
}

impl Contingency {
    fn build(a: &[f64], b: &[f64]) -> Self {
        let (ca, na) = encode(a);
        let (cb, nb) = encode(b);

        let mut table: HashMap<(usize, usize), usize> = HashMap::new();
        let mut rows = vec![0usize; na];
        let mut cols = vec![0usize; nb];
        for (&i, &j) in ca.iter().zip(&cb) {
            *table.entry((i, j)).or_insert(0) += 1;
            rows[i] += 1;
            cols[j] += 1;
        }

        Self {
            cells: table.into_iter().map(|((i, j), c)| (i, j, c)).collect(),
            rows,
            cols,
            n: ca.len(),
        }
    }

    /// Both labelings describe the same partition under some renaming
    fn is_relabeling(&self) -> bool {
        self.cells.len() == self.rows.len() && self.cells.len() == self.cols.len()
    }

    fn mutual_info(&self) -> f64 {
        let nf = self.n as f64;
        self.cells
            .iter()
            .map(|&(i, j, c)| {
                let c = c as f64;
                let ai = self.rows[i] as f64;
                let bj = self.cols[j] as f64;
                c / nf * (nf * c / (ai * bj)).ln()
            })
            .sum()
    }
}

fn comb2(k: usize) -> f64 {
    let k = k as f64;
    k * (k - 1.0) / 2.0
}

/// Adjusted Rand index between two labelings.
///
/// 1.0 for identical partitions, around 0.0 for random agreement, and
/// possibly negative. Returns NaN if no valid pairs remain.
pub fn adjusted_rand(a: &[f64], b: &[f64]) -> f64 {
    let (x, y) = paired_valid(a, b);
    if x.is_empty() {
        return f64::NAN;
    }
    let table = Contingency::build(&x, &y);
    let (n_classes, n_clusters) = (table.rows.len(), table.cols.len());

    // Trivial partitions: both one cluster, or both all singletons
    if (n_classes == 1 && n_clusters == 1) || (n_classes == table.n && n_clusters == table.n) {
        return 1.0;
    }

    let sum_cells: f64 = table.cells.iter().map(|&(_, _, c)| comb2(c)).sum();
    let sum_rows: f64 = table.rows.iter().map(|&c| comb2(c)).sum();
    let sum_cols: f64 = table.cols.iter().map(|&c| comb2(c)).sum();
    let total = comb2(table.n);

    let expected = sum_rows * sum_cols / total;
    let max_index = (sum_rows + sum_cols) / 2.0;
    let denom = max_index - expected;
    if denom == 0.0 {
        return 1.0;
    }
    (sum_cells - expected) / denom
}

fn entropy(counts: &[usize], n: usize) -> f64 {
    let nf = n as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / nf;
            -p * p.ln()
        })
        .sum()
}

/// Expected mutual information under the hypergeometric model of randomness
fn expected_mutual_info(rows: &[usize], cols: &[usize], n: usize) -> f64 {
    let nf = n as f64;
    let ln_n_fact = ln_gamma(nf + 1.0);
    let mut emi = 0.0;

    for &ai in rows {
        let af = ai as f64;
        for &bj in cols {
            let bf = bj as f64;
            let lo = 1.max((ai + bj).saturating_sub(n));
            let hi = ai.min(bj);
            // terms independent of n_ij
            let fixed = ln_gamma(af + 1.0) + ln_gamma(bf + 1.0) + ln_gamma(nf - af + 1.0)
                + ln_gamma(nf - bf + 1.0)
                - ln_n_fact;
            for nij in lo..=hi {
                let k = nij as f64;
                let term = k / nf * (nf * k / (af * bf)).ln();
                let log_prob = fixed
                    - ln_gamma(k + 1.0)
                    - ln_gamma(af - k + 1.0)
                    - ln_gamma(bf - k + 1.0)
                    - ln_gamma(nf - af - bf + k + 1.0);
                emi += term * log_prob.exp();
            }
        }
    }
    emi
}

/// Adjusted mutual information with arithmetic-mean normalisation.
///
/// 1.0 for identical partitions, around 0.0 for independent ones.
/// Returns NaN if no valid pairs remain.
pub fn adjusted_mutual_info(a: &[f64], b: &[f64]) -> f64 {
    let (x, y) = paired_valid(a, b);
    if x.is_empty() {
        return f64::NAN;
    }
    let table = Contingency::build(&x, &y);
    if table.is_relabeling() {
        return 1.0;
    }

    let mi = table.mutual_info();
    let emi = expected_mutual_info(&table.rows, &table.cols, table.n);
    let normalizer = (entropy(&table.rows, table.n) + entropy(&table.cols, table.n)) / 2.0;

    let mut denom = normalizer - emi;
    // keep the sign of the denominator but stay away from zero
    if denom < 0.0 {
        denom = denom.min(-f64::EPSILON);
    } else {
        denom = denom.max(f64::EPSILON);
    }
    (mi - emi) / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ari_identical_up_to_relabel() {
        let a = [0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let b = [5.0, 5.0, 3.0, 3.0, 9.0, 9.0];
        assert_abs_diff_eq!(adjusted_rand(&a, &b), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ari_known_value() {
        // sklearn: adjusted_rand_score([0, 0, 1, 1], [0, 0, 1, 2]) == 0.5714285714
        let a = [0.0, 0.0, 1.0, 1.0];
        let b = [0.0, 0.0, 1.0, 2.0];
        assert_abs_diff_eq!(adjusted_rand(&a, &b), 4.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ari_single_cluster() {
        let a = [1.0; 5];
        assert_eq!(adjusted_rand(&a, &a), 1.0);
    }

    #[test]
    fn test_ari_disagreement_is_low() {
        // sklearn: adjusted_rand_score([0, 0, 0, 0], [0, 1, 2, 3]) == 0.0
        let a = [0.0, 0.0, 0.0, 0.0];
        let b = [0.0, 1.0, 2.0, 3.0];
        assert_abs_diff_eq!(adjusted_rand(&a, &b), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ami_identical() {
        let a = [0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 2.0];
        let b = [7.0, 7.0, 4.0, 4.0, 1.0, 1.0, 1.0];
        assert_abs_diff_eq!(adjusted_mutual_info(&a, &b), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ami_bounded() {
        let a = [0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let b = [0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0];
        let ami = adjusted_mutual_info(&a, &b);
        assert!(ami <= 1.0);
        assert!(ami.abs() < 0.5, "independent labelings should score near 0, got {}", ami);
    }

    #[test]
    fn test_empty_is_nan() {
        let a = [f64::NAN, 1.0];
        let b = [1.0, f64::NAN];
        assert!(adjusted_rand(&a, &b).is_nan());
        assert!(adjusted_mutual_info(&a, &b).is_nan());
    }
}
