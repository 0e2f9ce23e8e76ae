//! Canonicalization (component 4.6): rebuilds a solid so geometrically-equal
//! vertices, planes, and shared descriptors become the same instance.

use crate::errors::Error;
use crate::float_types::EPSILON;
use crate::fuzzy::FuzzyFactory;
use crate::geom::plane::Plane;
use crate::geom::polygon::Polygon;
use crate::geom::shared::Shared;
use crate::geom::vec3::Vec3;
use crate::geom::vertex::Vertex;
use hashbrown::HashMap;

/// Rebuilds every polygon of `polygons` through shared vertex/plane
/// factories so that any two values within [`EPSILON`] of one another
/// collapse onto the same instance. This implementation's tag counter is
/// local to the call (per component 5, "arena-scoped memory"), not a
/// process-wide atomic.
pub fn canonicalize(polygons: &[Polygon]) -> Result<Vec<Polygon>, Error> {
    let mut vertex_factory: FuzzyFactory<Vertex, 3> = FuzzyFactory::new(EPSILON);
    let mut plane_factory: FuzzyFactory<Plane, 4> = FuzzyFactory::new(EPSILON);
    let mut shared_cache: HashMap<Shared, Shared> = HashMap::new();
    let mut next_tag: u64 = 0;

    let mut out = Vec::with_capacity(polygons.len());

    for polygon in polygons {
        let plane_key = [polygon.plane.n.x(), polygon.plane.n.y(), polygon.plane.n.z(), polygon.plane.w];
        let plane = plane_factory.lookup_or_create(plane_key, |v| Plane::new(Vec3::new(v[0], v[1], v[2]), v[3]));

        let shared = *shared_cache.entry(polygon.shared).or_insert(polygon.shared);

        let mut vertices: Vec<Vertex> = Vec::with_capacity(polygon.vertices.len());
        for v in &polygon.vertices {
            let key = v.pos.as_array();
            let canonical = vertex_factory.lookup_or_create(key, |arr| {
                let tag = next_tag;
                next_tag += 1;
                Vertex::new(Vec3::new(arr[0], arr[1], arr[2])).with_tag(tag)
            });
            vertices.push(canonical);
        }

        dedup_consecutive_by_identity(&mut vertices);
        if vertices.len() < 3 {
            continue;
        }

        out.push(Polygon::new(vertices, plane, shared)?);
    }

    Ok(out)
}

fn dedup_consecutive_by_identity(vertices: &mut Vec<Vertex>) {
    if vertices.len() < 2 {
        return;
    }
    let mut out: Vec<Vertex> = Vec::with_capacity(vertices.len());
    for v in vertices.drain(..) {
        match out.last() {
            Some(last) if last.same_as(&v) => {}
            _ => out.push(v),
        }
    }
    if out.len() > 1 && out.first().unwrap().same_as(out.last().unwrap()) {
        out.pop();
    }
    *vertices = out;
}
