//! Continuous Lagrange function spaces and their degree-of-freedom enumeration.
use crate::connectivity::Connectivity;
use crate::element::{ElementKind, FiniteElement, LagrangeBasis};
use crate::error::SpaceError;
use crate::mesh::{Marker, Mesh};
use crate::nalgebra::Point2;
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The type of boundary condition imposed on a boundary marker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BcType {
    /// Prescribed values (Dirichlet). The corresponding degrees of freedom are not solved for.
    Essential,
    /// Conditions entering the weak form through boundary integrals (Neumann).
    Natural,
}

/// Maps boundary markers to boundary condition types.
///
/// Markers without an explicit entry are classified by the default, if one is configured.
/// Function space construction fails if a boundary marker of the mesh can not be classified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryClassifier {
    markers: BTreeMap<Marker, BcType>,
    default: Option<BcType>,
}

impl BoundaryClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies the given markers as essential and everything else as natural.
    pub fn essential_markers(markers: impl IntoIterator<Item = Marker>) -> Self {
        markers
            .into_iter()
            .fold(Self::new(), |classifier, marker| classifier.with_marker(marker, BcType::Essential))
            .with_default(BcType::Natural)
    }

    pub fn with_marker(mut self, marker: Marker, bc_type: BcType) -> Self {
        self.markers.insert(marker, bc_type);
        self
    }

    pub fn with_default(mut self, bc_type: BcType) -> Self {
        self.default = Some(bc_type);
        self
    }

    pub fn default_type(&self) -> Option<BcType> {
        self.default
    }

    pub fn classify(&self, marker: Marker) -> Option<BcType> {
        self.markers.get(&marker).copied().or(self.default)
    }
}

/// Values prescribed on essential boundaries, as a function of the boundary marker and the
/// physical coordinates.
pub trait EssentialBoundaryValues: Send + Sync {
    fn evaluate(&self, marker: Marker, x: f64, y: f64) -> f64;
}

impl<F> EssentialBoundaryValues for F
where
    F: Fn(Marker, f64, f64) -> f64 + Send + Sync,
{
    fn evaluate(&self, marker: Marker, x: f64, y: f64) -> f64 {
        self(marker, x, y)
    }
}

/// Geometric entity owning a set of basis functions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum Entity {
    Vertex(usize),
    /// The `j`-th node on the given global edge, counted from the vertex with the smaller index
    Edge(usize, usize),
    /// The `i`-th interior node of the given element
    Interior(usize, usize),
}

/// A continuous Lagrange finite element space over a shared mesh.
///
/// Global degrees of freedom are numbered such that the free degrees of freedom come first,
/// `[0, num_free_dofs)`, followed by the essential ones, `[num_free_dofs, num_dofs)`. Within each
/// group, degrees of freedom are numbered in the order in which they are first encountered when
/// traversing the elements and their local basis functions.
#[derive(Debug, Clone)]
pub struct FunctionSpace {
    mesh: Arc<Mesh>,
    degree: usize,
    classifier: BoundaryClassifier,
    triangle_basis: LagrangeBasis,
    quadrilateral_basis: LagrangeBasis,
    element_dofs: Vec<Vec<usize>>,
    dof_positions: Vec<Point2<f64>>,
    num_free_dofs: usize,
    /// Prescribed values of the essential degrees of freedom, offset by `num_free_dofs`
    essential_values: Vec<f64>,
}

impl FunctionSpace {
    /// Builds the degree-of-freedom enumeration for the given mesh.
    ///
    /// A vertex or edge node is essential if it lies on a boundary edge classified as
    /// [`BcType::Essential`], also when the vertex is shared with a natural boundary edge. Its
    /// prescribed value is the essential value function evaluated at the node with the marker of
    /// the owning edge, taking the smallest marker for vertices shared by several essential edges.
    pub fn new(
        mesh: Arc<Mesh>,
        classifier: BoundaryClassifier,
        essential_values: impl EssentialBoundaryValues,
        degree: usize,
    ) -> Result<Self, SpaceError> {
        let triangle_basis = LagrangeBasis::new(ElementKind::Triangle, degree)?;
        let quadrilateral_basis = LagrangeBasis::new(ElementKind::Quadrilateral, degree)?;

        let mut marker_types = BTreeMap::new();
        for marker in mesh.boundary_marker_set() {
            let bc_type = classifier
                .classify(marker)
                .ok_or(SpaceError::InconsistentMarker { marker })?;
            marker_types.insert(marker, bc_type);
        }

        // Essential marker of each edge and vertex, if any
        let mut edge_essential_marker = vec![None; mesh.num_edges()];
        let mut vertex_essential_marker: Vec<Option<Marker>> = vec![None; mesh.num_vertices()];
        for ([a, b], marker) in mesh.boundary_edges() {
            if marker_types.get(&marker) != Some(&BcType::Essential) {
                continue;
            }
            if let Some(edge_idx) = mesh.find_edge(a, b) {
                edge_essential_marker[edge_idx] = Some(marker);
            }
            for v in [a, b] {
                let current = &mut vertex_essential_marker[v];
                *current = Some(current.map_or(marker, |m| m.min(marker)));
            }
        }

        // Collect entities in order of first appearance
        let p = degree;
        let mut entity_ids = FxHashMap::default();
        let mut entities = Vec::new();
        let mut entity_positions = Vec::new();
        let mut element_entities = Vec::with_capacity(mesh.num_elements());

        for (element_idx, element) in mesh.elements().iter().enumerate() {
            let geometry = mesh
                .element_geometry(element_idx)
                .ok_or(SpaceError::InvalidElement { element: element_idx })?;
            let basis = match geometry.kind() {
                ElementKind::Triangle => &triangle_basis,
                ElementKind::Quadrilateral => &quadrilateral_basis,
            };
            let vertices = element.connectivity.vertex_indices();
            let num_vertices = vertices.len();
            let mut local_entities = Vec::with_capacity(basis.num_nodes());

            for local_node in 0..basis.num_nodes() {
                let entity = if local_node < num_vertices {
                    Entity::Vertex(vertices[local_node])
                } else if local_node < num_vertices * p {
                    let k = (local_node - num_vertices) / (p - 1);
                    let m = (local_node - num_vertices) % (p - 1);
                    let edge_idx = mesh.element_edges(element_idx)[k];
                    let j = if vertices[k] < vertices[(k + 1) % num_vertices] {
                        m
                    } else {
                        p - 2 - m
                    };
                    Entity::Edge(edge_idx, j)
                } else {
                    Entity::Interior(element_idx, local_node - num_vertices * p)
                };

                let id = *entity_ids.entry(entity).or_insert_with(|| {
                    let position = match entity {
                        Entity::Vertex(v) => mesh.vertices()[v],
                        Entity::Edge(edge_idx, j) => {
                            let [lo, hi] = mesh.edges()[edge_idx];
                            let s = (j + 1) as f64 / p as f64;
                            let [lo, hi] = [mesh.vertices()[lo], mesh.vertices()[hi]];
                            lo + (hi - lo) * s
                        }
                        Entity::Interior(..) => geometry.map_reference_coords(&basis.nodes()[local_node]),
                    };
                    entities.push(entity);
                    entity_positions.push(position);
                    entities.len() - 1
                });
                local_entities.push(id);
            }
            element_entities.push(local_entities);
        }

        let entity_marker = |entity: &Entity| match *entity {
            Entity::Vertex(v) => vertex_essential_marker[v],
            Entity::Edge(edge_idx, _) => edge_essential_marker[edge_idx],
            Entity::Interior(..) => None,
        };

        // Free entities first, then essential entities, each in order of first appearance
        let mut entity_to_dof = vec![0; entities.len()];
        let mut dof_positions = Vec::with_capacity(entities.len());
        let mut essential = Vec::new();
        for (id, entity) in entities.iter().enumerate() {
            match entity_marker(entity) {
                None => {
                    entity_to_dof[id] = dof_positions.len();
                    dof_positions.push(entity_positions[id]);
                }
                Some(marker) => essential.push((id, marker)),
            }
        }
        let num_free_dofs = dof_positions.len();
        let mut essential_values_vec = Vec::with_capacity(essential.len());
        for (id, marker) in essential {
            let position = entity_positions[id];
            entity_to_dof[id] = dof_positions.len();
            dof_positions.push(position);
            essential_values_vec.push(essential_values.evaluate(marker, position.x, position.y));
        }

        let element_dofs = element_entities
            .into_iter()
            .map(|local| local.into_iter().map(|id| entity_to_dof[id]).collect())
            .collect();

        debug!(
            "Function space of degree {}: {} free and {} essential degrees of freedom",
            degree,
            num_free_dofs,
            essential_values_vec.len()
        );

        Ok(Self {
            mesh,
            degree,
            classifier,
            triangle_basis,
            quadrilateral_basis,
            element_dofs,
            dof_positions,
            num_free_dofs,
            essential_values: essential_values_vec,
        })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// The shared handle to the mesh.
    pub fn shared_mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn classifier(&self) -> &BoundaryClassifier {
        &self.classifier
    }

    /// Classifies the boundary marker with the classifier of this space.
    pub fn bc_type(&self, marker: Marker) -> Option<BcType> {
        self.classifier.classify(marker)
    }

    pub fn num_dofs(&self) -> usize {
        self.dof_positions.len()
    }

    /// The number of unknowns of the linear system assembled on this space.
    pub fn num_free_dofs(&self) -> usize {
        self.num_free_dofs
    }

    pub fn num_essential_dofs(&self) -> usize {
        self.essential_values.len()
    }

    /// Global degrees of freedom of the given element, indexed by local basis function.
    pub fn element_dofs(&self, element_idx: usize) -> &[usize] {
        &self.element_dofs[element_idx]
    }

    pub fn is_essential(&self, dof: usize) -> bool {
        dof >= self.num_free_dofs && dof < self.num_dofs()
    }

    /// The prescribed value of an essential degree of freedom, or `None` if the degree of freedom
    /// is free or does not exist.
    pub fn essential_value(&self, dof: usize) -> Option<f64> {
        dof.checked_sub(self.num_free_dofs)
            .and_then(|idx| self.essential_values.get(idx))
            .copied()
    }

    /// Prescribed values of all essential degrees of freedom, in global order.
    pub fn essential_values(&self) -> &[f64] {
        &self.essential_values
    }

    /// The physical position of the node associated with the degree of freedom.
    pub fn dof_position(&self, dof: usize) -> Option<Point2<f64>> {
        self.dof_positions.get(dof).copied()
    }

    pub fn basis(&self, kind: ElementKind) -> &LagrangeBasis {
        match kind {
            ElementKind::Triangle => &self.triangle_basis,
            ElementKind::Quadrilateral => &self.quadrilateral_basis,
        }
    }
}
