//! Basic procedural mesh generation routines.
//!
//! The generated meshes cover axis-aligned rectangles. Boundary edges are marked by side:
//! [`BOTTOM`] (1), [`RIGHT`] (2), [`TOP`] (3) and [`LEFT`] (4). All elements carry marker 0.
use crate::connectivity::{Quad4d2Connectivity, Tri3d2Connectivity};
use crate::error::GeometryError;
use crate::mesh::{Marker, Mesh, MeshElement};
use crate::nalgebra::{Point2, Vector2};

pub const BOTTOM: Marker = 1;
pub const RIGHT: Marker = 2;
pub const TOP: Marker = 3;
pub const LEFT: Marker = 4;

pub fn create_unit_square_uniform_quad_mesh_2d(cells_per_dim: usize) -> Result<Mesh, GeometryError> {
    create_rectangular_uniform_quad_mesh_2d(1.0, 1, 1, cells_per_dim, &Vector2::zeros())
}

pub fn create_unit_square_uniform_tri_mesh_2d(cells_per_dim: usize) -> Result<Mesh, GeometryError> {
    create_rectangular_uniform_tri_mesh_2d(1.0, 1, 1, cells_per_dim, &Vector2::zeros())
}

/// Vertex grid shared by the quad and triangle generators.
struct Grid {
    num_cells_x: usize,
    num_cells_y: usize,
    vertices: Vec<Point2<f64>>,
}

impl Grid {
    fn new(unit_length: f64, units_x: usize, units_y: usize, cells_per_unit: usize, bottom_left: &Vector2<f64>) -> Self {
        let cell_size = unit_length / cells_per_unit as f64;
        let num_cells_x = units_x * cells_per_unit;
        let num_cells_y = units_y * cells_per_unit;

        let mut vertices = Vec::with_capacity((num_cells_x + 1) * (num_cells_y + 1));
        for j in 0..=num_cells_y {
            for i in 0..=num_cells_x {
                let v = bottom_left + Vector2::new(i as f64, j as f64) * cell_size;
                vertices.push(Point2::from(v));
            }
        }

        Self {
            num_cells_x,
            num_cells_y,
            vertices,
        }
    }

    fn vertex_index(&self, i: usize, j: usize) -> usize {
        (self.num_cells_x + 1) * j + i
    }

    /// Counter-clockwise corners of cell `(i, j)`, starting at the bottom left.
    fn cell_corners(&self, i: usize, j: usize) -> [usize; 4] {
        [
            self.vertex_index(i, j),
            self.vertex_index(i + 1, j),
            self.vertex_index(i + 1, j + 1),
            self.vertex_index(i, j + 1),
        ]
    }

    fn boundary_edges(&self) -> Vec<([usize; 2], Marker)> {
        let (nx, ny) = (self.num_cells_x, self.num_cells_y);
        let mut edges = Vec::with_capacity(2 * (nx + ny));
        for i in 0..nx {
            edges.push(([self.vertex_index(i, 0), self.vertex_index(i + 1, 0)], BOTTOM));
            edges.push(([self.vertex_index(i + 1, ny), self.vertex_index(i, ny)], TOP));
        }
        for j in 0..ny {
            edges.push(([self.vertex_index(nx, j), self.vertex_index(nx, j + 1)], RIGHT));
            edges.push(([self.vertex_index(0, j + 1), self.vertex_index(0, j)], LEFT));
        }
        edges
    }
}

/// Generates an axis-aligned rectangular uniform mesh given a unit length,
/// dimensions as multipliers of the unit length and the number of cells per unit length.
pub fn create_rectangular_uniform_quad_mesh_2d(
    unit_length: f64,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    bottom_left: &Vector2<f64>,
) -> Result<Mesh, GeometryError> {
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 {
        return Mesh::from_vertices_and_elements(Vec::new(), Vec::new(), Vec::new());
    }

    let grid = Grid::new(unit_length, units_x, units_y, cells_per_unit, bottom_left);
    let mut elements = Vec::with_capacity(grid.num_cells_x * grid.num_cells_y);
    for j in 0..grid.num_cells_y {
        for i in 0..grid.num_cells_x {
            elements.push(MeshElement::new(Quad4d2Connectivity(grid.cell_corners(i, j)), 0));
        }
    }

    let boundary_edges = grid.boundary_edges();
    Mesh::from_vertices_and_elements(grid.vertices, elements, boundary_edges)
}

/// Same as [`create_rectangular_uniform_quad_mesh_2d`], but every cell is split into two
/// triangles along its diagonal from the bottom left to the top right corner.
pub fn create_rectangular_uniform_tri_mesh_2d(
    unit_length: f64,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    bottom_left: &Vector2<f64>,
) -> Result<Mesh, GeometryError> {
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 {
        return Mesh::from_vertices_and_elements(Vec::new(), Vec::new(), Vec::new());
    }

    let grid = Grid::new(unit_length, units_x, units_y, cells_per_unit, bottom_left);
    let mut elements = Vec::with_capacity(2 * grid.num_cells_x * grid.num_cells_y);
    for j in 0..grid.num_cells_y {
        for i in 0..grid.num_cells_x {
            let [a, b, c, d] = grid.cell_corners(i, j);
            elements.push(MeshElement::new(Tri3d2Connectivity([a, b, c]), 0));
            elements.push(MeshElement::new(Tri3d2Connectivity([a, c, d]), 0));
        }
    }

    let boundary_edges = grid.boundary_edges();
    Mesh::from_vertices_and_elements(grid.vertices, elements, boundary_edges)
}
