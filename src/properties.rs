//! The `properties` attribute a caller may attach to a [`crate::solid::Solid`]:
//! an arbitrary nested dictionary of typed geometric values, transformed
//! alongside the solid it is attached to.

use crate::geom::plane::Plane;
use crate::geom::vec3::Vec3;
use hashbrown::HashMap;
use nalgebra::Matrix4;

/// A leaf value or sub-map in a solid's property tree.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Vector(Vec3),
    Plane(Plane),
    /// A line segment, as its two endpoints.
    Line(Vec3, Vec3),
    Map(HashMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Applies an affine transform to every geometric leaf, recursing into
    /// sub-maps unchanged in shape.
    pub fn transform(&self, m: &Matrix4<f64>) -> PropertyValue {
        match self {
            PropertyValue::Vector(v) => PropertyValue::Vector(transform_point(v, m)),
            PropertyValue::Plane(p) => PropertyValue::Plane(transform_plane(p, m)),
            PropertyValue::Line(a, b) => {
                PropertyValue::Line(transform_point(a, m), transform_point(b, m))
            }
            PropertyValue::Map(map) => {
                PropertyValue::Map(map.iter().map(|(k, v)| (k.clone(), v.transform(m))).collect())
            }
        }
    }

    /// Merges `other` into `self`, preferring `self`'s value on key
    /// collision unless both sides are maps, in which case they merge
    /// recursively.
    pub fn merge(&self, other: &PropertyValue) -> PropertyValue {
        match (self, other) {
            (PropertyValue::Map(a), PropertyValue::Map(b)) => {
                let mut merged = b.clone();
                for (k, v) in a {
                    match merged.get(k) {
                        Some(existing) => {
                            merged.insert(k.clone(), v.merge(existing));
                        }
                        None => {
                            merged.insert(k.clone(), v.clone());
                        }
                    }
                }
                PropertyValue::Map(merged)
            }
            _ => self.clone(),
        }
    }
}

fn transform_point(v: &Vec3, m: &Matrix4<f64>) -> Vec3 {
    let homogeneous = m * nalgebra::Vector4::new(v.x(), v.y(), v.z(), 1.0);
    Vec3::new(homogeneous.x, homogeneous.y, homogeneous.z)
}

fn transform_plane(p: &Plane, m: &Matrix4<f64>) -> Plane {
    // Normals transform by the inverse transpose; fall back to the
    // identity-equivalent forward transform if the matrix is singular
    // (callers are not expected to pass singular transforms here).
    let normal_matrix = m.try_inverse().map(|inv| inv.transpose()).unwrap_or(*m);
    let n4 = normal_matrix * nalgebra::Vector4::new(p.n.x(), p.n.y(), p.n.z(), 0.0);
    let n = Vec3::new(n4.x, n4.y, n4.z).unit();
    let point_on_plane = p.n.scale(p.w);
    let transformed_point = transform_point(&point_on_plane, m);
    let w = n.dot(&transformed_point);
    Plane::new(n, w)
}
