//! Uniform refinement of meshes.
//!
//! Every triangle is split into four by its edge midpoints, every quadrilateral into four by its
//! edge midpoints and its centroid. Existing vertices keep their indices, new vertices are
//! appended in the order in which they are first encountered.
use crate::connectivity::{Connectivity, ElementConnectivity, Quad4d2Connectivity, Tri3d2Connectivity};
use crate::error::GeometryError;
use crate::mesh::{Mesh, MeshElement};
use crate::nalgebra::Point2;
use rustc_hash::FxHashMap;

/// Globally consistent label of a vertex in the refined mesh, independent of the final index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum VertexLabel {
    Existing(usize),
    /// Midpoint of the edge with the given sorted vertex pair
    EdgeMidpoint([usize; 2]),
    /// Centroid of the quadrilateral with the given element index
    Centroid(usize),
}

impl VertexLabel {
    fn edge_midpoint(a: usize, b: usize) -> Self {
        if a <= b {
            Self::EdgeMidpoint([a, b])
        } else {
            Self::EdgeMidpoint([b, a])
        }
    }

    fn construct_vertex(&self, mesh: &Mesh) -> Point2<f64> {
        let vertices = mesh.vertices();
        match *self {
            Self::Existing(idx) => vertices[idx],
            Self::EdgeMidpoint([a, b]) => Point2::from((vertices[a].coords + vertices[b].coords) / 2.0),
            Self::Centroid(element_idx) => {
                let conn = &mesh.elements()[element_idx].connectivity;
                let indices = conn.vertex_indices();
                let sum = indices
                    .iter()
                    .fold(Point2::origin().coords, |acc, &v| acc + vertices[v].coords);
                Point2::from(sum / indices.len() as f64)
            }
        }
    }
}

/// Assigns indices to vertex labels, with the existing vertices occupying the first indices.
struct VertexNumbering {
    label_to_idx_map: FxHashMap<VertexLabel, usize>,
    labels: Vec<VertexLabel>,
}

impl VertexNumbering {
    fn new(num_existing: usize) -> Self {
        let labels: Vec<_> = (0..num_existing).map(VertexLabel::Existing).collect();
        let label_to_idx_map = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (*label, idx))
            .collect();
        Self {
            label_to_idx_map,
            labels,
        }
    }

    fn index_of(&mut self, label: VertexLabel) -> usize {
        let labels = &mut self.labels;
        *self.label_to_idx_map.entry(label).or_insert_with(|| {
            labels.push(label);
            labels.len() - 1
        })
    }
}

fn refine_triangle(vertices: [usize; 3], numbering: &mut VertexNumbering) -> [Tri3d2Connectivity; 4] {
    let [a, b, c] = vertices;
    let d = numbering.index_of(VertexLabel::edge_midpoint(a, b));
    let e = numbering.index_of(VertexLabel::edge_midpoint(b, c));
    let f = numbering.index_of(VertexLabel::edge_midpoint(c, a));
    [
        Tri3d2Connectivity([a, d, f]),
        Tri3d2Connectivity([d, b, e]),
        Tri3d2Connectivity([f, e, c]),
        Tri3d2Connectivity([d, e, f]),
    ]
}

fn refine_quad(element_idx: usize, vertices: [usize; 4], numbering: &mut VertexNumbering) -> [Quad4d2Connectivity; 4] {
    let [a, b, c, d] = vertices;
    let e = numbering.index_of(VertexLabel::edge_midpoint(a, b));
    let f = numbering.index_of(VertexLabel::edge_midpoint(b, c));
    let g = numbering.index_of(VertexLabel::edge_midpoint(c, d));
    let h = numbering.index_of(VertexLabel::edge_midpoint(d, a));
    let m = numbering.index_of(VertexLabel::Centroid(element_idx));
    [
        Quad4d2Connectivity([a, e, m, h]),
        Quad4d2Connectivity([e, b, f, m]),
        Quad4d2Connectivity([m, f, c, g]),
        Quad4d2Connectivity([h, m, g, d]),
    ]
}

impl Mesh {
    /// Splits every element into four children.
    ///
    /// Children inherit the marker of their parent element, and both halves of a boundary edge
    /// inherit the marker of the edge. Fails if any element is degenerate, in which case the mesh
    /// is left unchanged.
    pub fn refine_all_elements(&mut self) -> Result<(), GeometryError> {
        self.validate_geometry()?;

        let mut numbering = VertexNumbering::new(self.num_vertices());
        let mut new_elements = Vec::with_capacity(4 * self.num_elements());
        for (element_idx, element) in self.elements().iter().enumerate() {
            let marker = element.marker;
            match element.connectivity {
                ElementConnectivity::Tri(tri) => new_elements.extend(
                    refine_triangle(tri.0, &mut numbering)
                        .into_iter()
                        .map(|child| MeshElement::new(child, marker)),
                ),
                ElementConnectivity::Quad(quad) => new_elements.extend(
                    refine_quad(element_idx, quad.0, &mut numbering)
                        .into_iter()
                        .map(|child| MeshElement::new(child, marker)),
                ),
            }
        }

        let mut new_boundary_edges = Vec::with_capacity(2 * self.num_boundary_edges());
        for ([a, b], marker) in self.boundary_edges() {
            let midpoint = numbering.index_of(VertexLabel::edge_midpoint(a, b));
            new_boundary_edges.push(([a, midpoint], marker));
            new_boundary_edges.push(([midpoint, b], marker));
        }

        let new_vertices = numbering
            .labels
            .iter()
            .map(|label| label.construct_vertex(self))
            .collect();

        *self = Mesh::from_vertices_and_elements(new_vertices, new_elements, new_boundary_edges)?;
        Ok(())
    }

    /// Applies [`refine_all_elements`](Self::refine_all_elements) the given number of times.
    ///
    /// Refinement of a valid mesh produces a valid mesh, so errors can only occur in the first
    /// round, leaving the mesh unchanged.
    pub fn refine_uniformly(&mut self, repeat_times: usize) -> Result<(), GeometryError> {
        for _ in 0..repeat_times {
            self.refine_all_elements()?;
        }
        Ok(())
    }
}
