//! The minimal in-memory mesh import/export contract (§6): flat triangle
//! arrays in, flat triangle arrays out. File-format glue (STL/OBJ/…) is
//! deliberately outside this crate.

use crate::errors::Error;
use crate::geom::plane::Plane;
use crate::geom::polygon::Polygon;
use crate::geom::shared::Shared;
use crate::geom::vec3::Vec3;
use crate::geom::vertex::Vertex;
use crate::solid::Solid;

/// One flat `(x, y, z)` per vertex, three vertices per triangle.
pub fn solid_from_triangles(triangles: &[[[f64; 3]; 3]]) -> Result<Solid, Error> {
    let mut polygons = Vec::with_capacity(triangles.len());
    for tri in triangles {
        let vertices: Vec<Vertex> = tri.iter().map(|p| Vertex::new(Vec3::new(p[0], p[1], p[2]))).collect();
        let plane = Plane::from_points(&vertices[0].pos, &vertices[1].pos, &vertices[2].pos)?;
        polygons.push(Polygon::new(vertices, plane, Shared::none())?);
    }
    Ok(Solid::new(polygons))
}

/// Triangulates every polygon as a fan from its first vertex and emits the
/// flattened triangle stream. A `k`-vertex polygon contributes `k - 2`
/// triangles.
pub fn solid_to_triangles(solid: &Solid) -> Vec<[[f64; 3]; 3]> {
    let mut out = Vec::new();
    for polygon in &solid.polygons {
        let verts = &polygon.vertices;
        for i in 1..verts.len().saturating_sub(1) {
            out.push([
                verts[0].pos.as_array(),
                verts[i].pos.as_array(),
                verts[i + 1].pos.as_array(),
            ]);
        }
    }
    out
}

/// Per-triangle-vertex color, in lockstep with [`solid_to_triangles`],
/// defaulting to white when a polygon's `shared.color` is unset.
pub fn solid_to_triangle_colors(solid: &Solid) -> Vec<[[f32; 3]; 3]> {
    let mut out = Vec::new();
    for polygon in &solid.polygons {
        let color = polygon
            .shared
            .color
            .map(|[r, g, b]| [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
            .unwrap_or([1.0, 1.0, 1.0]);
        let verts = &polygon.vertices;
        for _ in 1..verts.len().saturating_sub(1) {
            out.push([color, color, color]);
        }
    }
    out
}
