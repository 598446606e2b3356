//! Sparse geodesic weight graphs over surface vertices

use crate::maybe_rayon::*;
use hippomaps_core::{Error, Result, SurfaceMesh};
use nalgebra::DMatrix;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

/// Symmetric sparse matrix over vertices in compressed-row form.
///
/// Entry (i, j) is non-zero only for vertices within the neighbourhood ring;
/// the diagonal is never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightGraph {
    n: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl WeightGraph {
    /// Build from per-row (column, value) lists; columns are sorted per row
    pub fn from_rows(rows: Vec<Vec<(usize, f64)>>) -> Self {
        let n = rows.len();
        let mut indptr = Vec::with_capacity(n + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for mut row in rows {
            row.sort_by_key(|&(j, _)| j);
            for (j, v) in row {
                indices.push(j);
                data.push(v);
            }
            indptr.push(indices.len());
        }
        Self {
            n,
            indptr,
            indices,
            data,
        }
    }

    /// Shortest-path distances along mesh edges to every vertex within
    /// `n_ring` hops; with `n_ring == 1` these are the edge lengths.
    pub fn ring_distance(mesh: &SurfaceMesh, n_ring: usize) -> Result<Self> {
        if n_ring == 0 {
            return Err(Error::InvalidParameter {
                name: "n_ring",
                value: "0".into(),
                reason: "neighbourhood ring must be at least 1".into(),
            });
        }
        let adjacency = mesh.adjacency();
        let rows: Vec<Vec<(usize, f64)>> = (0..mesh.vertex_count())
            .into_par_iter()
            .map(|src| {
                if n_ring == 1 {
                    adjacency[src]
                        .iter()
                        .map(|&dst| (dst, mesh.edge_length(src, dst)))
                        .collect()
                } else {
                    ring_dijkstra(mesh, &adjacency, src, n_ring)
                }
            })
            .collect();
        Ok(Self::from_rows(rows))
    }

    /// Inverse ring distance: affinity 1/d for every stored pair
    pub fn inverse_ring_distance(mesh: &SurfaceMesh, n_ring: usize) -> Result<Self> {
        Self::ring_distance(mesh, n_ring)?.reciprocal()
    }

    /// Replace every stored value by its reciprocal
    pub fn reciprocal(mut self) -> Result<Self> {
        for row in 0..self.n {
            for k in self.indptr[row]..self.indptr[row + 1] {
                let d = self.data[k];
                if d <= 0.0 || !d.is_finite() {
                    return Err(Error::Format(format!(
                        "vertices {} and {} are {} apart; distances must be positive",
                        row, self.indices[k], d
                    )));
                }
                self.data[k] = 1.0 / d;
            }
        }
        Ok(self)
    }

    /// Number of vertices
    pub fn size(&self) -> usize {
        self.n
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Entry (i, j), zero when not stored
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i >= self.n {
            return 0.0;
        }
        let cols = &self.indices[self.indptr[i]..self.indptr[i + 1]];
        match cols.binary_search(&j) {
            Ok(k) => self.data[self.indptr[i] + k],
            Err(_) => 0.0,
        }
    }

    /// Stored (column, value) entries of row `i`
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.indptr[i]..self.indptr[i + 1];
        self.indices[range.clone()]
            .iter()
            .copied()
            .zip(self.data[range].iter().copied())
    }

    /// Whether W == W^T within `tol`
    pub fn is_symmetric(&self, tol: f64) -> bool {
        (0..self.n).all(|i| self.row(i).all(|(j, v)| (self.get(j, i) - v).abs() <= tol))
    }

    /// Dense copy of the matrix
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(self.n, self.n);
        for i in 0..self.n {
            for (j, v) in self.row(i) {
                m[(i, j)] = v;
            }
        }
        m
    }
}

#[derive(Debug, PartialEq)]
struct Visit {
    dist: f64,
    vertex: usize,
}

impl Eq for Visit {}

impl Ord for Visit {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on distance
        other.dist.total_cmp(&self.dist)
    }
}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Distances from `src` to its `n_ring` neighbourhood, travelling only
/// through vertices of that neighbourhood
fn ring_dijkstra(
    mesh: &SurfaceMesh,
    adjacency: &[Vec<usize>],
    src: usize,
    n_ring: usize,
) -> Vec<(usize, f64)> {
    let mut hops: HashMap<usize, usize> = HashMap::new();
    hops.insert(src, 0);
    let mut queue = VecDeque::from([src]);
    while let Some(v) = queue.pop_front() {
        let h = hops[&v];
        if h == n_ring {
            continue;
        }
        for &u in &adjacency[v] {
            if !hops.contains_key(&u) {
                hops.insert(u, h + 1);
                queue.push_back(u);
            }
        }
    }

    let mut dist: HashMap<usize, f64> = HashMap::new();
    let mut heap = BinaryHeap::new();
    dist.insert(src, 0.0);
    heap.push(Visit { dist: 0.0, vertex: src });

    while let Some(Visit { dist: d, vertex: v }) = heap.pop() {
        if d > dist[&v] {
            continue;
        }
        for &u in &adjacency[v] {
            if !hops.contains_key(&u) {
                continue;
            }
            let nd = d + mesh.edge_length(v, u);
            if dist.get(&u).map_or(true, |&old| nd < old) {
                dist.insert(u, nd);
                heap.push(Visit { dist: nd, vertex: u });
            }
        }
    }

    dist.into_iter().filter(|&(v, _)| v != src).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::spectral::fixtures::lattice;

    #[test]
    fn test_one_ring_edge_lengths() {
        let mesh = lattice(3);
        let w = WeightGraph::ring_distance(&mesh, 1).unwrap();
        assert_eq!(w.size(), 9);
        assert_eq!(w.get(0, 1), 1.0);
        assert!((w.get(0, 4) - 2f64.sqrt()).abs() < 1e-12);
        // not connected in the 1-ring
        assert_eq!(w.get(0, 2), 0.0);
        assert_eq!(w.get(0, 8), 0.0);
        // no self-loops
        assert!((0..9).all(|i| w.get(i, i) == 0.0));
    }

    #[test]
    fn test_inverse_weights_positive_and_symmetric() {
        let mesh = lattice(4);
        let w = WeightGraph::inverse_ring_distance(&mesh, 1).unwrap();
        assert!(w.is_symmetric(1e-12));
        for i in 0..w.size() {
            for (j, v) in w.row(i) {
                assert!(v.is_finite() && v > 0.0, "w[{},{}] = {}", i, j, v);
            }
        }
        assert_eq!(w.get(0, 1), 1.0);
        assert!((w.get(0, 5) - 1.0 / 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_two_ring_paths() {
        let mesh = lattice(3);
        let w = WeightGraph::ring_distance(&mesh, 2).unwrap();
        assert_eq!(w.get(0, 2), 2.0);
        // corner to corner through the diagonal
        assert!((w.get(0, 8) - 2.0 * 2f64.sqrt()).abs() < 1e-12);
        assert!(w.is_symmetric(1e-12));
    }

    #[test]
    fn test_zero_ring_rejected() {
        assert!(WeightGraph::ring_distance(&lattice(3), 0).is_err());
    }

    #[test]
    fn test_coincident_vertices_rejected() {
        let mesh = SurfaceMesh::new(
            vec![[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            vec![[0, 1, 2]],
        )
        .unwrap();
        assert!(matches!(
            WeightGraph::inverse_ring_distance(&mesh, 1),
            Err(Error::Format(_))
        ));
    }
}
