//! A plane represented as a unit normal plus a scalar offset: `{ p : n·p = w }`.
//!
//! This differs deliberately from a three-point plane representation: storing
//! `(n, w)` directly gives exact, representation-stable equality and makes
//! `signed_distance` a single dot product instead of a re-derivation from
//! three stored points every time.

use super::vec3::Vec3;
use crate::errors::Error;
use crate::float_types::{Real, EPSILON};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub n: Vec3,
    pub w: Real,
}

impl Plane {
    /// `n` must already be a unit vector; this is the canonical constructor
    /// used once a normal has been computed and normalized by the caller.
    pub const fn new(n: Vec3, w: Real) -> Self {
        Plane { n, w }
    }

    /// Build the plane through three points, in the order that makes their
    /// winding the outward face (right-hand rule on (b-a) x (c-a)).
    pub fn from_points(a: &Vec3, b: &Vec3, c: &Vec3) -> Result<Self, Error> {
        let n = b.sub(a).cross(&c.sub(a));
        if n.length() <= EPSILON {
            return Err(Error::Degenerate(
                "Plane::from_points given collinear or coincident points".into(),
            ));
        }
        let n = n.unit();
        let w = n.dot(a);
        Ok(Plane::new(n, w))
    }

    pub fn flipped(&self) -> Plane {
        Plane::new(self.n.negate(), -self.w)
    }

    /// Positive in front of the plane, negative behind, zero on it.
    pub fn signed_distance(&self, p: &Vec3) -> Real {
        self.n.dot(p) - self.w
    }

    /// Intersection of segment `p1`→`p2` with this plane, expressed as a line
    /// parameter `t` clamped to `[0, 1]`. A segment parallel to the plane (or
    /// otherwise producing a non-finite `t`) resolves to `t = 0`, i.e. `p1`.
    pub fn split_line_between_points(&self, p1: &Vec3, p2: &Vec3) -> Vec3 {
        let d1 = self.signed_distance(p1);
        let d2 = self.signed_distance(p2);
        let denom = d1 - d2;
        let mut t = if denom.abs() <= EPSILON { 0.0 } else { d1 / denom };
        if !t.is_finite() {
            t = 0.0;
        }
        t = t.clamp(0.0, 1.0);
        p1.lerp(p2, t)
    }
}
