//! Strategies for property-based testing.
use crate::mesh::procedural::{create_rectangular_uniform_quad_mesh_2d, create_rectangular_uniform_tri_mesh_2d};
use crate::mesh::Mesh;
use crate::nalgebra::{Point2, Vector2};
use ::proptest::prelude::*;

pub fn point2() -> impl Strategy<Value = Point2<f64>> {
    // Keep coordinates moderate so that geometric predicates remain well-conditioned
    let range = -10.0..10.0;
    [range.clone(), range].prop_map(|[x, y]| Point2::new(x, y))
}

/// Structured triangle or quadrilateral meshes of rectangles with up to 4 x 4 cells.
pub fn rectangular_mesh() -> impl Strategy<Value = Mesh> {
    let cells = 1..=4usize;
    (cells.clone(), cells, 0.1..2.0f64, point2(), any::<bool>()).prop_filter_map(
        "mesh generation failed",
        |(units_x, units_y, unit_length, corner, triangles)| {
            let corner = Vector2::new(corner.x, corner.y);
            if triangles {
                create_rectangular_uniform_tri_mesh_2d(unit_length, units_x, units_y, 1, &corner).ok()
            } else {
                create_rectangular_uniform_quad_mesh_2d(unit_length, units_x, units_y, 1, &corner).ok()
            }
        },
    )
}

/// Rectangular meshes whose interior vertices are perturbed, keeping all elements valid.
pub fn perturbed_rectangular_mesh() -> impl Strategy<Value = Mesh> {
    (rectangular_mesh(), 0.0..0.2f64, any::<u64>()).prop_map(|(mut mesh, amplitude, seed)| {
        let boundary_vertices: Vec<bool> = {
            let mut flags = vec![false; mesh.num_vertices()];
            for ([a, b], _) in mesh.boundary_edges() {
                flags[a] = true;
                flags[b] = true;
            }
            flags
        };
        let h = mesh
            .edges()
            .iter()
            .map(|&[a, b]| (mesh.vertices()[a] - mesh.vertices()[b]).norm())
            .fold(f64::INFINITY, f64::min);
        let mut index = 0;
        mesh.transform_vertices(|v| {
            if !boundary_vertices[index] {
                // Pseudo-random offsets derived from the seed
                let phase = (seed.wrapping_add(index as u64) % 1000) as f64;
                v.x += amplitude * h * phase.sin();
                v.y += amplitude * h * phase.cos();
            }
            index += 1;
        });
        mesh
    })
}
