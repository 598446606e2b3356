//! 2D k-d tree over unfolded vertex positions
//!
//! Nearest and k-nearest queries for mapping vertices of one tessellation
//! onto another.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

/// A 2D k-d tree storing vertex indices.
#[derive(Debug)]
pub struct VertexTree {
    nodes: Vec<Node>,
    points: Vec<[f64; 2]>,
}

#[derive(Debug)]
struct Node {
    /// Vertex index into `points`
    vertex: usize,
    /// Split axis: 0 = x, 1 = y
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// A vertex returned by a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub vertex: usize,
    pub distance_sq: f64,
}

fn dist_sq(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

impl VertexTree {
    /// Build from vertex positions; the vertex index is the position in `points`.
    pub fn build(points: Vec<[f64; 2]>) -> Self {
        let mut nodes = Vec::with_capacity(points.len());
        let mut order: Vec<usize> = (0..points.len()).collect();
        if !order.is_empty() {
            build_node(&points, &mut order, 0, &mut nodes);
        }
        Self { nodes, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, vertex: usize) -> Option<[f64; 2]> {
        self.points.get(vertex).copied()
    }

    /// Closest vertex to `q`
    pub fn nearest(&self, q: [f64; 2]) -> Option<Neighbor> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best = Neighbor {
            vertex: 0,
            distance_sq: f64::INFINITY,
        };
        self.search_nearest(0, q, &mut best);
        Some(best)
    }

    /// Up to `k` closest vertices, nearest first
    pub fn k_nearest(&self, q: [f64; 2], k: usize) -> Vec<Neighbor> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }
        // ascending by distance, at most k long
        let mut found: Vec<Neighbor> = Vec::with_capacity(k + 1);
        self.search_k(0, q, k, &mut found);
        found
    }

    fn search_nearest(&self, idx: usize, q: [f64; 2], best: &mut Neighbor) {
        let node = &self.nodes[idx];
        let p = self.points[node.vertex];
        let d = dist_sq(q, p);
        if d < best.distance_sq {
            *best = Neighbor {
                vertex: node.vertex,
                distance_sq: d,
            };
        }

        let diff = q[node.axis] - p[node.axis];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(child) = near {
            self.search_nearest(child, q, best);
        }
        if diff * diff < best.distance_sq {
            if let Some(child) = far {
                self.search_nearest(child, q, best);
            }
        }
    }

    fn search_k(&self, idx: usize, q: [f64; 2], k: usize, found: &mut Vec<Neighbor>) {
        let node = &self.nodes[idx];
        let p = self.points[node.vertex];
        let d = dist_sq(q, p);

        if d < kth_distance(found, k) {
            let pos = found.partition_point(|n| n.distance_sq <= d);
            found.insert(
                pos,
                Neighbor {
                    vertex: node.vertex,
                    distance_sq: d,
                },
            );
            found.truncate(k);
        }

        let diff = q[node.axis] - p[node.axis];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(child) = near {
            self.search_k(child, q, k, found);
        }
        if diff * diff < kth_distance(found, k) {
            if let Some(child) = far {
                self.search_k(child, q, k, found);
            }
        }
    }
}

fn kth_distance(found: &[Neighbor], k: usize) -> f64 {
    if found.len() < k {
        f64::INFINITY
    } else {
        found[k - 1].distance_sq
    }
}

/// Median split on alternating axes; returns the index of the created node.
fn build_node(
    points: &[[f64; 2]],
    order: &mut [usize],
    depth: usize,
    nodes: &mut Vec<Node>,
) -> usize {
    let axis = depth % 2;
    let median = order.len() / 2;
    order.select_nth_unstable_by(median, |&a, &b| points[a][axis].total_cmp(&points[b][axis]));

    let idx = nodes.len();
    nodes.push(Node {
        vertex: order[median],
        axis,
        left: None,
        right: None,
    });

    let (lower, rest) = order.split_at_mut(median);
    let upper = &mut rest[1..];
    if !lower.is_empty() {
        let child = build_node(points, lower, depth + 1, nodes);
        nodes[idx].left = Some(child);
    }
    if !upper.is_empty() {
        let child = build_node(points, upper, depth + 1, nodes);
        nodes[idx].right = Some(child);
    }
    idx
}
