use crate::connectivity::{Connectivity, ElementConnectivity};
use crate::element::{ElementGeometry, FiniteElement};
use crate::error::GeometryError;
use crate::nalgebra::Point2;
use rstar::primitives::GeomWithData;
use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub mod procedural;
pub mod refinement;

/// Integer tag attached to elements (material markers) and boundary edges (boundary markers).
pub type Marker = i32;

/// Reference coordinates within this tolerance outside of the reference element are still
/// considered inside by point location.
const LOCATE_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshElement {
    pub connectivity: ElementConnectivity,
    pub marker: Marker,
}

impl MeshElement {
    pub fn new(connectivity: impl Into<ElementConnectivity>, marker: Marker) -> Self {
        Self {
            connectivity: connectivity.into(),
            marker,
        }
    }
}

/// Index-based conforming mesh of triangles and quadrilaterals with marked boundary edges.
///
/// Besides vertices and elements, the mesh stores the edge topology (every edge once, with the
/// element edges referring into it) and a bounding box hierarchy for point location. Every edge
/// that belongs to exactly one element must carry a boundary marker.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Point2<f64>>,
    elements: Vec<MeshElement>,
    /// Boundary markers keyed by the sorted vertex pair of the edge
    boundary_markers: BTreeMap<[usize; 2], Marker>,
    /// Sorted vertex pairs of all edges
    edges: Vec<[usize; 2]>,
    edge_lookup: FxHashMap<[usize; 2], usize>,
    /// For each element, the global edge index of each local edge
    element_edges: Vec<Vec<usize>>,
    tree: RTree<GeomWithData<ElementBounds, usize>>,
}

impl Mesh {
    /// Constructs a mesh from vertices, elements and boundary edge markers.
    ///
    /// Boundary edges may be given in either orientation. Fails if an element references a
    /// non-existent vertex, a marked edge is not a boundary edge, a boundary edge is unmarked or
    /// an edge is shared by more than two elements.
    ///
    /// The element geometry is not validated here, see [`Mesh::validate_geometry`].
    pub fn from_vertices_and_elements(
        vertices: Vec<Point2<f64>>,
        elements: Vec<MeshElement>,
        boundary_edges: impl IntoIterator<Item = ([usize; 2], Marker)>,
    ) -> Result<Self, GeometryError> {
        for (element_idx, element) in elements.iter().enumerate() {
            for &vertex in element.connectivity.vertex_indices() {
                if vertex >= vertices.len() {
                    return Err(GeometryError::InvalidVertexIndex {
                        element: element_idx,
                        vertex,
                    });
                }
            }
        }

        let boundary_markers = boundary_edges
            .into_iter()
            .map(|([a, b], marker)| (sorted_pair(a, b), marker))
            .collect();

        let mut mesh = Self {
            vertices,
            elements,
            boundary_markers,
            edges: Vec::new(),
            edge_lookup: FxHashMap::default(),
            element_edges: Vec::new(),
            tree: RTree::new(),
        };
        mesh.build_topology()?;
        mesh.build_tree();
        Ok(mesh)
    }

    fn build_topology(&mut self) -> Result<(), GeometryError> {
        let mut edges = Vec::new();
        let mut edge_lookup = FxHashMap::default();
        let mut edge_element_count = Vec::new();
        let mut element_edges = Vec::with_capacity(self.elements.len());

        for element in &self.elements {
            let conn = &element.connectivity;
            let mut local_edges = Vec::with_capacity(conn.num_edges());
            for k in 0..conn.num_edges() {
                let key = match conn.get_edge_connectivity(k) {
                    Some(edge) => edge.sorted(),
                    None => continue,
                };
                let edge_idx = *edge_lookup.entry(key).or_insert_with(|| {
                    edges.push(key);
                    edge_element_count.push(0);
                    edges.len() - 1
                });
                edge_element_count[edge_idx] += 1;
                local_edges.push(edge_idx);
            }
            element_edges.push(local_edges);
        }

        for (edge, &count) in edges.iter().zip(&edge_element_count) {
            if count > 2 {
                return Err(GeometryError::NonManifoldEdge { edge: *edge });
            }
            if count == 1 && !self.boundary_markers.contains_key(edge) {
                return Err(GeometryError::UnmarkedBoundaryEdge { edge: *edge });
            }
        }

        for edge in self.boundary_markers.keys() {
            let is_boundary = edge_lookup
                .get(edge)
                .map(|&idx| edge_element_count[idx] == 1)
                .unwrap_or(false);
            if !is_boundary {
                return Err(GeometryError::NotABoundaryEdge { edge: *edge });
            }
        }

        self.edges = edges;
        self.edge_lookup = edge_lookup;
        self.element_edges = element_edges;
        Ok(())
    }

    fn build_tree(&mut self) {
        let bounds = (0..self.elements.len())
            .map(|idx| {
                let conn = self.elements[idx].connectivity;
                let vertices = conn.vertex_indices().iter().map(|&v| self.vertices[v]);
                GeomWithData::new(ElementBounds::from_points(vertices), idx)
            })
            .collect();
        self.tree = RTree::bulk_load(bounds);
    }

    pub fn vertices(&self) -> &[Point2<f64>] {
        &self.vertices
    }

    pub fn elements(&self) -> &[MeshElement] {
        &self.elements
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Sorted vertex pairs of all edges, indexed by global edge index.
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// Global edge indices of the local edges of the given element.
    pub fn element_edges(&self, element_idx: usize) -> &[usize] {
        &self.element_edges[element_idx]
    }

    /// Global index of the edge connecting the two vertices, in either orientation.
    pub fn find_edge(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_lookup.get(&sorted_pair(a, b)).copied()
    }

    pub fn edge_marker(&self, edge_idx: usize) -> Option<Marker> {
        self.edges
            .get(edge_idx)
            .and_then(|edge| self.boundary_markers.get(edge))
            .copied()
    }

    /// Iterates over all boundary edges (as sorted vertex pairs) and their markers, in ascending
    /// order of the vertex pairs.
    pub fn boundary_edges(&self) -> impl '_ + Iterator<Item = ([usize; 2], Marker)> {
        self.boundary_markers
            .iter()
            .map(|(edge, marker)| (*edge, *marker))
    }

    pub fn num_boundary_edges(&self) -> usize {
        self.boundary_markers.len()
    }

    /// The set of distinct boundary markers in the mesh.
    pub fn boundary_marker_set(&self) -> BTreeSet<Marker> {
        self.boundary_markers.values().copied().collect()
    }

    pub fn element_geometry(&self, element_idx: usize) -> Option<ElementGeometry> {
        let element = self.elements.get(element_idx)?;
        ElementGeometry::from_connectivity(&element.connectivity, &self.vertices)
    }

    /// Checks that every element has positive area and that quadrilaterals are convex.
    pub fn validate_geometry(&self) -> Result<(), GeometryError> {
        for element_idx in 0..self.num_elements() {
            let geometry = self
                .element_geometry(element_idx)
                .ok_or(GeometryError::DegenerateElement {
                    element: element_idx,
                    reason: "element references non-existent vertices",
                })?;
            geometry
                .check_non_degenerate()
                .map_err(|reason| GeometryError::DegenerateElement {
                    element: element_idx,
                    reason,
                })?;
        }
        Ok(())
    }

    /// Finds an element containing the given point along with the reference coordinates of the
    /// point in that element.
    ///
    /// Points on an edge shared by several elements are attributed to the element with the
    /// lowest index. Returns `None` if the point lies outside of the mesh.
    pub fn locate_point(&self, point: &Point2<f64>) -> Option<(usize, Point2<f64>)> {
        let mut candidates: Vec<usize> = self
            .tree
            .locate_all_at_point(&[point.x, point.y])
            .map(|geom| geom.data)
            .collect();
        candidates.sort_unstable();

        candidates.into_iter().find_map(|element_idx| {
            let geometry = self.element_geometry(element_idx)?;
            let xi = geometry.map_physical_coords(point)?;
            geometry
                .kind()
                .contains_reference_point(&xi, LOCATE_TOLERANCE)
                .then(|| (element_idx, xi))
        })
    }

    /// Moves vertices, keeping the topology.
    ///
    /// The bounding volume hierarchy is rebuilt afterwards.
    pub fn transform_vertices(&mut self, mut transformation: impl FnMut(&mut Point2<f64>)) {
        for v in &mut self.vertices {
            transformation(v);
        }
        self.build_tree();
    }
}

fn sorted_pair(a: usize, b: usize) -> [usize; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

/// Axis-aligned bounding box of an element, slightly enlarged to accommodate floating point
/// errors in point location.
#[derive(Debug, Clone, PartialEq)]
struct ElementBounds(AABB<[f64; 2]>);

impl ElementBounds {
    fn from_points(points: impl Iterator<Item = Point2<f64>>) -> Self {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in points {
            for i in 0..2 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        let padding = 1e-8 * ((max[0] - min[0]).max(max[1] - min[1])).max(f64::MIN_POSITIVE);
        let min = [min[0] - padding, min[1] - padding];
        let max = [max[0] + padding, max[1] + padding];
        Self(AABB::from_corners(min, max))
    }
}

impl RTreeObject for ElementBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.0
    }
}

impl PointDistance for ElementBounds {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.0.distance_2(point)
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.0.contains_point(point)
    }
}
