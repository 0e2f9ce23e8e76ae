//! A convex, coplanar polygon: the kernel's one surface primitive.

use super::plane::Plane;
use super::shared::Shared;
use super::vec3::Vec3;
use crate::errors::Error;
use crate::float_types::EPSILON;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Polygon {
    pub vertices: Vec<super::vertex::Vertex>,
    pub plane: Plane,
    pub shared: Shared,
    bounding_box: OnceLock<(Vec3, Vec3)>,
    bounding_sphere: OnceLock<(Vec3, f64)>,
}

impl Polygon {
    /// Builds a polygon from its vertex ring and plane. Asserts at least
    /// three vertices unconditionally (that is not a degenerate-input edge
    /// case, it is a shape the type cannot represent). With
    /// `kernel-debug-assertions` enabled, also verifies convexity.
    pub fn new(
        vertices: Vec<super::vertex::Vertex>,
        plane: Plane,
        shared: Shared,
    ) -> Result<Self, Error> {
        if vertices.len() < 3 {
            return Err(Error::InvalidInput(format!(
                "Polygon::new given {} vertices, need at least 3",
                vertices.len()
            )));
        }
        let polygon = Polygon {
            vertices,
            plane,
            shared,
            bounding_box: OnceLock::new(),
            bounding_sphere: OnceLock::new(),
        };
        #[cfg(feature = "kernel-debug-assertions")]
        {
            if !polygon.is_convex() {
                return Err(Error::InvalidInput(
                    "Polygon::new given a non-convex vertex ring".into(),
                ));
            }
        }
        Ok(polygon)
    }

    /// Derives the plane from the first three vertices and builds the
    /// polygon from them.
    pub fn from_vertices(
        vertices: Vec<super::vertex::Vertex>,
        shared: Shared,
    ) -> Result<Self, Error> {
        if vertices.len() < 3 {
            return Err(Error::InvalidInput(format!(
                "Polygon::from_vertices given {} vertices, need at least 3",
                vertices.len()
            )));
        }
        let plane = Plane::from_points(&vertices[0].pos, &vertices[1].pos, &vertices[2].pos)?;
        Polygon::new(vertices, plane, shared)
    }

    pub fn flipped(&self) -> Polygon {
        let mut vertices: Vec<_> = self.vertices.iter().map(|v| v.flipped()).collect();
        vertices.reverse();
        Polygon {
            vertices,
            plane: self.plane.flipped(),
            shared: self.shared,
            bounding_box: OnceLock::new(),
            bounding_sphere: OnceLock::new(),
        }
    }

    pub fn bounding_box(&self) -> (Vec3, Vec3) {
        *self.bounding_box.get_or_init(|| {
            let mut mins = self.vertices[0].pos;
            let mut maxs = self.vertices[0].pos;
            for v in &self.vertices[1..] {
                mins = mins.min(&v.pos);
                maxs = maxs.max(&v.pos);
            }
            (mins, maxs)
        })
    }

    /// A (non-minimal but cheap) bounding sphere: center is the bounding-box
    /// midpoint, radius reaches the farthest vertex. Used only for the
    /// sphere-vs-plane early-out in `PolygonTreeNode::split_by_plane`.
    pub fn bounding_sphere(&self) -> (Vec3, f64) {
        *self.bounding_sphere.get_or_init(|| {
            let (mins, maxs) = self.bounding_box();
            let center = mins.add(&maxs).scale(0.5);
            let radius = self
                .vertices
                .iter()
                .map(|v| v.pos.distance(&center))
                .fold(0.0_f64, f64::max);
            (center, radius)
        })
    }

    /// Edges as `(from, to)` vertex pairs walking the ring once.
    pub fn edges(&self) -> impl Iterator<Item = (&super::vertex::Vertex, &super::vertex::Vertex)> {
        self.vertices
            .iter()
            .zip(self.vertices.iter().cycle().skip(1))
    }

    /// Sign-change check of successive edge cross products projected onto
    /// the polygon's own normal: a convex ring never turns the "wrong way".
    pub fn is_convex(&self) -> bool {
        let n = self.vertices.len();
        if n < 4 {
            return true;
        }
        let mut sign = 0i32;
        for i in 0..n {
            let a = self.vertices[i].pos;
            let b = self.vertices[(i + 1) % n].pos;
            let c = self.vertices[(i + 2) % n].pos;
            let cross = b.sub(&a).cross(&c.sub(&b));
            let proj = cross.dot(&self.plane.n);
            if proj.abs() <= EPSILON {
                continue;
            }
            let this_sign = if proj > 0.0 { 1 } else { -1 };
            if sign == 0 {
                sign = this_sign;
            } else if this_sign != sign {
                return false;
            }
        }
        true
    }
}

/// Builds an orthonormal 2D basis `(u, v)` for the plane whose normal is `n`,
/// by crossing `n` with whichever axis it is least aligned with. Used by
/// retesselation to project a coplanar group into 2D.
pub fn build_orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let n = n.unit();
    let other = if n.x().abs() < n.y().abs() && n.x().abs() < n.z().abs() {
        Vec3::new(1.0, 0.0, 0.0)
    } else if n.y().abs() < n.z().abs() {
        Vec3::new(0.0, 1.0, 0.0)
    } else {
        Vec3::new(0.0, 0.0, 1.0)
    };
    let v = n.cross(&other).unit();
    let u = v.cross(&n).unit();
    (u, v)
}
