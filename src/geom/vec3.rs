//! An immutable 3D vector with one canonical constructor and a small set of
//! explicit, non-ambiguous converters. Arithmetic is delegated to
//! `nalgebra::Vector3`; this type exists so the kernel never has to guess
//! what shape of input a caller meant (array, tuple, scalar broadcast, …).

use crate::errors::Error;
use crate::float_types::Real;
use nalgebra::Vector3;

/// Three `f64` components. Equality is exact component equality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3(pub Vector3<Real>);

impl Vec3 {
    /// The one canonical constructor.
    pub const fn new(x: Real, y: Real, z: Real) -> Self {
        Vec3(Vector3::new(x, y, z))
    }

    /// Build from a `[x, y, z]` array. Rejects non-finite components.
    pub fn from_array(a: [Real; 3]) -> Result<Self, Error> {
        if a.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "Vec3::from_array given non-finite components: {a:?}"
            )));
        }
        Ok(Vec3::new(a[0], a[1], a[2]))
    }

    /// Build from an (x, y) pair with z = 0.
    pub fn from_xy(x: Real, y: Real) -> Result<Self, Error> {
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::InvalidInput(format!(
                "Vec3::from_xy given non-finite components: ({x}, {y})"
            )));
        }
        Ok(Vec3::new(x, y, 0.0))
    }

    /// Broadcast a single scalar to all three components.
    pub fn from_scalar(s: Real) -> Result<Self, Error> {
        if !s.is_finite() {
            return Err(Error::InvalidInput(format!(
                "Vec3::from_scalar given non-finite scalar: {s}"
            )));
        }
        Ok(Vec3::new(s, s, s))
    }

    pub const fn zero() -> Self {
        Vec3::new(0.0, 0.0, 0.0)
    }

    pub fn x(&self) -> Real {
        self.0.x
    }
    pub fn y(&self) -> Real {
        self.0.y
    }
    pub fn z(&self) -> Real {
        self.0.z
    }

    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3(self.0 + other.0)
    }

    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3(self.0 - other.0)
    }

    pub fn negate(&self) -> Vec3 {
        Vec3(-self.0)
    }

    pub fn scale(&self, s: Real) -> Vec3 {
        Vec3(self.0 * s)
    }

    pub fn dot(&self, other: &Vec3) -> Real {
        self.0.dot(&other.0)
    }

    pub fn cross(&self, other: &Vec3) -> Vec3 {
        Vec3(self.0.cross(&other.0))
    }

    pub fn length(&self) -> Real {
        self.0.norm()
    }

    /// Unit vector in the same direction. Undefined (returns zero) for a
    /// zero-length input; callers at the plane/polygon layer are expected to
    /// validate non-degeneracy before calling this.
    pub fn unit(&self) -> Vec3 {
        let len = self.length();
        if len <= crate::float_types::EPSILON {
            Vec3::zero()
        } else {
            self.scale(1.0 / len)
        }
    }

    pub fn lerp(&self, other: &Vec3, t: Real) -> Vec3 {
        self.add(&other.sub(self).scale(t))
    }

    pub fn min(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x().min(other.x()), self.y().min(other.y()), self.z().min(other.z()))
    }

    pub fn max(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x().max(other.x()), self.y().max(other.y()), self.z().max(other.z()))
    }

    pub fn distance_squared(&self, other: &Vec3) -> Real {
        self.sub(other).0.norm_squared()
    }

    pub fn distance(&self, other: &Vec3) -> Real {
        self.distance_squared(other).sqrt()
    }

    pub fn as_array(&self) -> [Real; 3] {
        [self.x(), self.y(), self.z()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn canonical_constructor_roundtrips() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.as_array(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn from_array_rejects_nan() {
        assert!(Vec3::from_array([Real::NAN, 0.0, 0.0]).is_err());
    }

    #[test]
    fn from_xy_sets_z_zero() {
        let v = Vec3::from_xy(1.0, 2.0).unwrap();
        assert_eq!(v.z(), 0.0);
    }

    #[test]
    fn from_scalar_broadcasts() {
        let v = Vec3::from_scalar(4.0).unwrap();
        assert_eq!(v.as_array(), [4.0, 4.0, 4.0]);
    }

    #[test]
    fn cross_is_orthogonal() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        let z = x.cross(&y);
        assert_relative_eq!(z.dot(&x), 0.0, epsilon = 1e-12);
        assert_relative_eq!(z.dot(&y), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn unit_has_length_one() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        assert_relative_eq!(v.unit().length(), 1.0, epsilon = 1e-12);
    }
}
