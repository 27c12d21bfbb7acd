use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Vertex connectivity of an element or one of its edges.
pub trait Connectivity: Clone {
    fn vertex_indices(&self) -> &[usize];

    /// Number of edges, zero for connectivities without edges.
    fn num_edges(&self) -> usize;

    /// The local edge with the given index, running from local vertex `index` to the next one in
    /// counter-clockwise order.
    fn get_edge_connectivity(&self, index: usize) -> Option<Segment2d2Connectivity>;
}

/// A line segment connecting two vertices.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment2d2Connectivity(pub [usize; 2]);

impl Segment2d2Connectivity {
    /// The vertex indices in ascending order, used as a key for the edge independent of its
    /// orientation.
    pub fn sorted(&self) -> [usize; 2] {
        let Self([a, b]) = *self;
        if a <= b {
            [a, b]
        } else {
            [b, a]
        }
    }
}

impl Connectivity for Segment2d2Connectivity {
    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }

    fn num_edges(&self) -> usize {
        0
    }

    fn get_edge_connectivity(&self, _index: usize) -> Option<Segment2d2Connectivity> {
        None
    }
}

fn cyclic_edge(indices: &[usize], index: usize) -> Option<Segment2d2Connectivity> {
    let n = indices.len();
    (index < n).then(|| Segment2d2Connectivity([indices[index], indices[(index + 1) % n]]))
}

/// Connectivity for a linear triangle, vertices in counter-clockwise order.
///
/// ```text
/// 2
/// |\
/// | \
/// |  \
/// 0---1
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tri3d2Connectivity(pub [usize; 3]);

impl Connectivity for Tri3d2Connectivity {
    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }

    fn num_edges(&self) -> usize {
        3
    }

    fn get_edge_connectivity(&self, index: usize) -> Option<Segment2d2Connectivity> {
        cyclic_edge(&self.0, index)
    }
}

impl Deref for Tri3d2Connectivity {
    type Target = [usize; 3];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Connectivity for a bilinear quadrilateral, vertices in counter-clockwise order.
///
/// ```text
/// 3____2
/// |    |
/// |    |
/// 0____1
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad4d2Connectivity(pub [usize; 4]);

impl Connectivity for Quad4d2Connectivity {
    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }

    fn num_edges(&self) -> usize {
        4
    }

    fn get_edge_connectivity(&self, index: usize) -> Option<Segment2d2Connectivity> {
        cyclic_edge(&self.0, index)
    }
}

impl Deref for Quad4d2Connectivity {
    type Target = [usize; 4];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Connectivity of an element in a mixed triangle/quadrilateral mesh.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementConnectivity {
    Tri(Tri3d2Connectivity),
    Quad(Quad4d2Connectivity),
}

impl Connectivity for ElementConnectivity {
    fn vertex_indices(&self) -> &[usize] {
        match self {
            Self::Tri(tri) => tri.vertex_indices(),
            Self::Quad(quad) => quad.vertex_indices(),
        }
    }

    fn num_edges(&self) -> usize {
        match self {
            Self::Tri(tri) => tri.num_edges(),
            Self::Quad(quad) => quad.num_edges(),
        }
    }

    fn get_edge_connectivity(&self, index: usize) -> Option<Segment2d2Connectivity> {
        match self {
            Self::Tri(tri) => tri.get_edge_connectivity(index),
            Self::Quad(quad) => quad.get_edge_connectivity(index),
        }
    }
}

impl From<Tri3d2Connectivity> for ElementConnectivity {
    fn from(tri: Tri3d2Connectivity) -> Self {
        Self::Tri(tri)
    }
}

impl From<Quad4d2Connectivity> for ElementConnectivity {
    fn from(quad: Quad4d2Connectivity) -> Self {
        Self::Quad(quad)
    }
}
