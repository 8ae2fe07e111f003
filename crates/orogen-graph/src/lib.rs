//! Terrain-aware shortest-path graph for road placement.
//!
//! [`TerrainGraph`] flattens a heightfield's lattice into an 8-connected
//! weighted adjacency list (edge weight grows with the elevation change along
//! the edge) and answers point-to-point queries with a binary-heap Dijkstra.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::DVec3;
use orogen_field::HeightField;
use tracing::debug;

/// Errors from shortest-path queries.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The target was never settled: no path exists from the source.
    Unreachable {
        /// Flattened source vertex id.
        source: usize,
        /// Flattened target vertex id.
        target: usize,
    },
    /// A vertex id outside the graph.
    VertexOutOfRange(usize, usize),
}

// Implemented by hand rather than via `thiserror::Error`: that derive treats
// any field named `source` as the error's source, which requires it to be an
// `Error` itself, and `Unreachable::source` is a plain vertex id.
impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::Unreachable { source, target } => {
                write!(f, "vertex {target} unreachable from {source}")
            }
            GraphError::VertexOutOfRange(v, n) => {
                write!(f, "vertex {v} out of range for graph of {n} vertices")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// A path through the graph: settled vertex ids from source to target and
/// its total edge weight.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    /// Vertex ids, source first, target last.
    pub vertices: Vec<usize>,
    /// Sum of traversed edge weights.
    pub total_weight: f64,
}

/// Weighted 8-connected adjacency over a heightfield's lattice.
///
/// Vertex `i * nx + j` corresponds to lattice cell `(i, j)`, matching the
/// field's own row-major indexing. Each vertex connects to its in-range 4-
/// and diagonal neighbours with weight
/// `|‖world(neighbour) - world(v)‖ * (1 + Δheight)|`; the absolute value
/// keeps weights non-negative (a requirement for Dijkstra) while still
/// penalizing climbs and rewarding nothing.
pub struct TerrainGraph {
    nx: usize,
    ny: usize,
    // adjacency[v] = (neighbour, weight) pairs.
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl TerrainGraph {
    /// Build the adjacency list from a heightfield.
    pub fn from_field(field: &HeightField) -> Self {
        let (nx, ny) = (field.nx(), field.ny());
        let vertex = |i: usize, j: usize| -> DVec3 { field.vertex(i, j) };

        let mut adjacency = vec![Vec::with_capacity(8); nx * ny];
        for i in 0..ny {
            for j in 0..nx {
                let from = vertex(i, j);
                let edges = &mut adjacency[i * nx + j];
                for di in -1i64..=1 {
                    for dj in -1i64..=1 {
                        if di == 0 && dj == 0 {
                            continue;
                        }
                        let (ni, nj) = (i as i64 + di, j as i64 + dj);
                        if ni < 0 || ni >= ny as i64 || nj < 0 || nj >= nx as i64 {
                            continue;
                        }
                        let (ni, nj) = (ni as usize, nj as usize);
                        let to = vertex(ni, nj);
                        let dh = to.y - from.y;
                        let weight = ((to - from).length() * (1.0 + dh)).abs();
                        edges.push((ni * nx + nj, weight));
                    }
                }
            }
        }
        debug!(vertices = nx * ny, "terrain graph built");
        Self { nx, ny, adjacency }
    }

    /// Number of vertices (`nx * ny`).
    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Lattice dimensions `(nx, ny)` of the underlying field.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Flattened vertex id for lattice cell `(i, j)`.
    pub fn vertex_id(&self, i: usize, j: usize) -> usize {
        i * self.nx + j
    }

    /// Lattice cell for a flattened vertex id.
    pub fn cell(&self, v: usize) -> (usize, usize) {
        (v / self.nx, v % self.nx)
    }

    /// World-space waypoints for a path, read back from the field the graph
    /// was built over.
    pub fn waypoints(&self, field: &HeightField, path: &Path) -> Vec<DVec3> {
        path.vertices
            .iter()
            .map(|&v| {
                let (i, j) = self.cell(v);
                field.vertex(i, j)
            })
            .collect()
    }

    /// Shortest path between two vertices by Dijkstra relaxation.
    ///
    /// The frontier is a binary heap keyed by `(distance, vertex)`, so ties
    /// in distance settle the lower vertex id first and results are
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexOutOfRange`] for an invalid endpoint, or
    /// [`GraphError::Unreachable`] if the target's predecessor is still
    /// unset when the frontier empties.
    pub fn shortest_path(&self, source: usize, target: usize) -> Result<Path, GraphError> {
        let n = self.vertex_count();
        for v in [source, target] {
            if v >= n {
                return Err(GraphError::VertexOutOfRange(v, n));
            }
        }

        let mut distance = vec![f64::INFINITY; n];
        let mut predecessor: Vec<Option<usize>> = vec![None; n];
        let mut heap = BinaryHeap::new();

        distance[source] = 0.0;
        heap.push(FrontierEntry {
            distance: 0.0,
            vertex: source,
        });

        while let Some(FrontierEntry { distance: d, vertex }) = heap.pop() {
            if vertex == target {
                break;
            }
            if d > distance[vertex] {
                continue; // Stale heap entry.
            }
            for &(next, weight) in &self.adjacency[vertex] {
                let candidate = d + weight;
                if candidate < distance[next] {
                    distance[next] = candidate;
                    predecessor[next] = Some(vertex);
                    heap.push(FrontierEntry {
                        distance: candidate,
                        vertex: next,
                    });
                }
            }
        }

        if target != source && predecessor[target].is_none() {
            return Err(GraphError::Unreachable { source, target });
        }

        let mut vertices = vec![target];
        let mut v = target;
        while let Some(p) = predecessor[v] {
            vertices.push(p);
            v = p;
        }
        vertices.reverse();

        Ok(Path {
            vertices,
            total_weight: distance[target],
        })
    }
}

/// Heap entry ordered as a min-heap on `(distance, vertex)`.
#[derive(Clone, Copy, Debug)]
struct FrontierEntry {
    distance: f64,
    vertex: usize,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the std max-heap pops the smallest distance; ties
        // break toward the smaller vertex id.
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
