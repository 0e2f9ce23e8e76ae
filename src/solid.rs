//! The Solid façade (component 4.8): bounding-box-cached polygon sets with
//! the union/difference/intersection operation sequences of component 4.4.

use crate::canonicalize::canonicalize;
use crate::errors::Error;
use crate::geom::polygon::Polygon;
use crate::properties::PropertyValue;
use crate::retesselate::retesselate;
use crate::tree::bsp::BspTree;
use crate::geom::vec3::Vec3;
use hashbrown::HashMap;

/// A solid is a value object: every Boolean method returns a new `Solid`
/// rather than mutating `self` or `other`.
#[derive(Debug, Clone)]
pub struct Solid {
    pub polygons: Vec<Polygon>,
    pub properties: PropertyValue,
    is_canonicalized: bool,
    is_retesselated: bool,
}

impl Solid {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Solid {
            polygons,
            properties: PropertyValue::Map(HashMap::new()),
            is_canonicalized: false,
            is_retesselated: false,
        }
    }

    pub fn is_canonicalized(&self) -> bool {
        self.is_canonicalized
    }

    pub fn is_retesselated(&self) -> bool {
        self.is_retesselated
    }

    /// `None` for a solid with no polygons.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.polygons.iter();
        let first = iter.next()?;
        let (mut mins, mut maxs) = first.bounding_box();
        for p in iter {
            let (pmin, pmax) = p.bounding_box();
            mins = mins.min(&pmin);
            maxs = maxs.max(&pmax);
        }
        Some((mins, maxs))
    }

    /// Whether `self` and `other`'s bounding boxes might overlap. `false`
    /// licenses the union fast path; an empty solid never overlaps anything.
    pub fn may_overlap(&self, other: &Solid) -> bool {
        let (Some((a_min, a_max)), Some((b_min, b_max))) =
            (self.bounding_box(), other.bounding_box())
        else {
            return false;
        };
        a_min.x() <= b_max.x()
            && a_max.x() >= b_min.x()
            && a_min.y() <= b_max.y()
            && a_max.y() >= b_min.y()
            && a_min.z() <= b_max.z()
            && a_max.z() >= b_min.z()
    }

    fn finalize(polygons: Vec<Polygon>, properties: PropertyValue) -> Result<Solid, Error> {
        let retess = retesselate(&polygons)?;
        let canon = canonicalize(&retess)?;
        Ok(Solid { polygons: canon, properties, is_canonicalized: true, is_retesselated: true })
    }

    pub fn union(&self, other: &Solid) -> Result<Solid, Error> {
        let properties = self.properties.merge(&other.properties);
        if !self.may_overlap(other) {
            let mut polygons = self.polygons.clone();
            polygons.extend(other.polygons.clone());
            return Solid::finalize(polygons, properties);
        }

        let mut a = BspTree::from_polygons(self.polygons.clone())?;
        let mut b = BspTree::from_polygons(other.polygons.clone())?;
        a.clip_to(&b, false)?;
        b.clip_to(&a, false)?;
        b.invert();
        b.clip_to(&a, false)?;
        b.invert();

        let mut polygons = a.all_polygons();
        polygons.extend(b.all_polygons());
        Solid::finalize(polygons, properties)
    }

    pub fn difference(&self, other: &Solid) -> Result<Solid, Error> {
        let properties = self.properties.merge(&other.properties);
        // A BSP node with no plane means "unexplored space", which the clip
        // routines treat as pass-through rather than empty; an operand with
        // zero polygons must therefore be special-cased rather than handed
        // to the BSP machinery, or `self ∖ ∅`/`∅ ∖ other` would not reduce
        // to the identities they must.
        if self.polygons.is_empty() || other.polygons.is_empty() {
            return Solid::finalize(self.polygons.clone(), properties);
        }
        let mut a = BspTree::from_polygons(self.polygons.clone())?;
        let mut b = BspTree::from_polygons(other.polygons.clone())?;

        a.invert();
        a.clip_to(&b, false)?;
        b.clip_to(&a, true)?;
        a.add_polygons(b.all_polygons())?;
        a.invert();

        Solid::finalize(a.all_polygons(), properties)
    }

    pub fn intersection(&self, other: &Solid) -> Result<Solid, Error> {
        let properties = self.properties.merge(&other.properties);
        // Same rationale as `difference`: an empty operand has no BSP plane
        // to clip against, so it must be special-cased to actually produce
        // the empty intersection rather than passing the other operand
        // through untouched.
        if self.polygons.is_empty() || other.polygons.is_empty() {
            return Solid::finalize(Vec::new(), properties);
        }
        let mut a = BspTree::from_polygons(self.polygons.clone())?;
        let mut b = BspTree::from_polygons(other.polygons.clone())?;

        a.invert();
        b.clip_to(&a, false)?;
        b.invert();
        a.clip_to(&b, false)?;
        b.clip_to(&a, false)?;
        a.add_polygons(b.all_polygons())?;
        a.invert();

        Solid::finalize(a.all_polygons(), properties)
    }

    /// Reduces `solids` pairwise in a balanced binary tree rather than a
    /// linear left-to-right chain, so the BSP trees being clipped against
    /// one another stay roughly matched in size at every step.
    pub fn union_all(solids: &[Solid]) -> Result<Solid, Error> {
        match solids {
            [] => Err(Error::InvalidInput("Solid::union_all given zero operands".into())),
            [only] => Ok(only.clone()),
            _ => {
                let mid = solids.len() / 2;
                let left = Solid::union_all(&solids[..mid])?;
                let right = Solid::union_all(&solids[mid..])?;
                left.union(&right)
            }
        }
    }

    /// Reduces `solids` left-to-right: `solids[0] - solids[1] - solids[2] - …`.
    pub fn difference_all(solids: &[Solid]) -> Result<Solid, Error> {
        let (first, rest) = solids
            .split_first()
            .ok_or_else(|| Error::InvalidInput("Solid::difference_all given zero operands".into()))?;
        let mut acc = first.clone();
        for solid in rest {
            acc = acc.difference(solid)?;
        }
        Ok(acc)
    }

    /// Reduces `solids` left-to-right: `solids[0] & solids[1] & solids[2] & …`.
    pub fn intersection_all(solids: &[Solid]) -> Result<Solid, Error> {
        let (first, rest) = solids
            .split_first()
            .ok_or_else(|| Error::InvalidInput("Solid::intersection_all given zero operands".into()))?;
        let mut acc = first.clone();
        for solid in rest {
            acc = acc.intersection(solid)?;
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::plane::Plane;
    use crate::geom::shared::Shared;
    use crate::geom::vertex::Vertex;
    use approx::assert_relative_eq;

    /// An axis-aligned box with outward-facing quad faces, centered at
    /// `center` with the given half-extents.
    fn cuboid(center: Vec3, half: Vec3) -> Solid {
        let (cx, cy, cz) = (center.x(), center.y(), center.z());
        let (hx, hy, hz) = (half.x(), half.y(), half.z());
        let corner = |dx: f64, dy: f64, dz: f64| {
            Vertex::new(Vec3::new(cx + dx * hx, cy + dy * hy, cz + dz * hz))
        };
        let face = |verts: [Vertex; 4], n: Vec3, w: f64| {
            Polygon::new(verts.to_vec(), Plane::new(n, w), Shared::none()).unwrap()
        };
        let polygons = vec![
            // -Z
            face(
                [corner(-1.0, -1.0, -1.0), corner(-1.0, 1.0, -1.0), corner(1.0, 1.0, -1.0), corner(1.0, -1.0, -1.0)],
                Vec3::new(0.0, 0.0, -1.0),
                -(cz - hz),
            ),
            // +Z
            face(
                [corner(-1.0, -1.0, 1.0), corner(1.0, -1.0, 1.0), corner(1.0, 1.0, 1.0), corner(-1.0, 1.0, 1.0)],
                Vec3::new(0.0, 0.0, 1.0),
                cz + hz,
            ),
            // -Y
            face(
                [corner(-1.0, -1.0, -1.0), corner(1.0, -1.0, -1.0), corner(1.0, -1.0, 1.0), corner(-1.0, -1.0, 1.0)],
                Vec3::new(0.0, -1.0, 0.0),
                -(cy - hy),
            ),
            // +Y
            face(
                [corner(-1.0, 1.0, -1.0), corner(-1.0, 1.0, 1.0), corner(1.0, 1.0, 1.0), corner(1.0, 1.0, -1.0)],
                Vec3::new(0.0, 1.0, 0.0),
                cy + hy,
            ),
            // -X
            face(
                [corner(-1.0, -1.0, -1.0), corner(-1.0, -1.0, 1.0), corner(-1.0, 1.0, 1.0), corner(-1.0, 1.0, -1.0)],
                Vec3::new(-1.0, 0.0, 0.0),
                -(cx - hx),
            ),
            // +X
            face(
                [corner(1.0, -1.0, -1.0), corner(1.0, 1.0, -1.0), corner(1.0, 1.0, 1.0), corner(1.0, -1.0, 1.0)],
                Vec3::new(1.0, 0.0, 0.0),
                cx + hx,
            ),
        ];
        Solid::new(polygons)
    }

    #[test]
    fn disjoint_union_takes_fast_path_and_concatenates() {
        let a = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = cuboid(Vec3::new(3.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(!a.may_overlap(&b));
        let union = a.union(&b).unwrap();
        assert_eq!(union.polygons.len(), a.polygons.len() + b.polygons.len());
    }

    #[test]
    fn self_union_keeps_same_bounding_box() {
        let a = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let union = a.union(&a).unwrap();
        assert_eq!(union.bounding_box(), a.bounding_box());
    }

    #[test]
    fn self_difference_is_empty() {
        let a = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let diff = a.difference(&a).unwrap();
        assert!(diff.polygons.is_empty());
    }

    #[test]
    fn overlapping_difference_shrinks_bounding_box() {
        let a = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = cuboid(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let diff = a.difference(&b).unwrap();
        let (mins, maxs) = diff.bounding_box().unwrap();
        assert_eq!(mins, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(maxs, Vec3::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn overlapping_intersection_keeps_only_shared_region() {
        let a = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = cuboid(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let inter = a.intersection(&b).unwrap();
        let (mins, maxs) = inter.bounding_box().unwrap();
        assert_eq!(mins, Vec3::new(0.0, -1.0, -1.0));
        assert_eq!(maxs, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn self_intersection_is_idempotent() {
        let a = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let inter = a.intersection(&a).unwrap();
        assert_eq!(inter.bounding_box(), a.bounding_box());
    }

    #[test]
    fn difference_against_empty_is_identity() {
        let a = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let empty = Solid::new(Vec::new());
        let diff = a.difference(&empty).unwrap();
        assert_eq!(diff.bounding_box(), a.bounding_box());
        assert_eq!(diff.polygons.len(), a.polygons.len());
    }

    #[test]
    fn intersection_with_empty_annihilates() {
        let a = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let empty = Solid::new(Vec::new());
        let inter = a.intersection(&empty).unwrap();
        assert!(inter.polygons.is_empty());
        let inter_rev = empty.intersection(&a).unwrap();
        assert!(inter_rev.polygons.is_empty());
    }

    #[test]
    fn intersection_is_commutative_up_to_reordering() {
        let a = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = cuboid(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let ab = a.intersection(&b).unwrap();
        let ba = b.intersection(&a).unwrap();
        assert_eq!(ab.bounding_box(), ba.bounding_box());
        assert_eq!(ab.polygons.len(), ba.polygons.len());
    }

    #[test]
    fn union_bounding_box_matches_de_morgan_aabb_union() {
        let a = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = cuboid(Vec3::new(3.0, 0.5, 0.0), Vec3::new(1.0, 2.0, 0.5));
        let union = a.union(&b).unwrap();
        let (a_min, a_max) = a.bounding_box().unwrap();
        let (b_min, b_max) = b.bounding_box().unwrap();
        let (u_min, u_max) = union.bounding_box().unwrap();
        assert_eq!(u_min, a_min.min(&b_min));
        assert_eq!(u_max, a_max.max(&b_max));
    }

    fn rotate_about_z(v: Vec3, cos_a: f64, sin_a: f64) -> Vec3 {
        Vec3::new(v.x() * cos_a - v.y() * sin_a, v.x() * sin_a + v.y() * cos_a, v.z())
    }

    /// A cuboid centered at the origin, rotated about the z axis. The offset
    /// `w` of a plane through the origin is its distance from the origin
    /// along its normal, which a rotation about the origin leaves unchanged;
    /// only the normals (and corners) need rotating.
    fn rotated_cuboid_about_origin(angle_rad: f64, half: Vec3) -> Solid {
        let (hx, hy, hz) = (half.x(), half.y(), half.z());
        let cos_a = angle_rad.cos();
        let sin_a = angle_rad.sin();
        let corner = |dx: f64, dy: f64, dz: f64| {
            Vertex::new(rotate_about_z(Vec3::new(dx * hx, dy * hy, dz * hz), cos_a, sin_a))
        };
        let face = |verts: [Vertex; 4], n: Vec3, w: f64| {
            let n = rotate_about_z(n, cos_a, sin_a);
            Polygon::new(verts.to_vec(), Plane::new(n, w), Shared::none()).unwrap()
        };
        let polygons = vec![
            face(
                [corner(-1.0, -1.0, -1.0), corner(-1.0, 1.0, -1.0), corner(1.0, 1.0, -1.0), corner(1.0, -1.0, -1.0)],
                Vec3::new(0.0, 0.0, -1.0),
                -hz,
            ),
            face(
                [corner(-1.0, -1.0, 1.0), corner(1.0, -1.0, 1.0), corner(1.0, 1.0, 1.0), corner(-1.0, 1.0, 1.0)],
                Vec3::new(0.0, 0.0, 1.0),
                hz,
            ),
            face(
                [corner(-1.0, -1.0, -1.0), corner(1.0, -1.0, -1.0), corner(1.0, -1.0, 1.0), corner(-1.0, -1.0, 1.0)],
                Vec3::new(0.0, -1.0, 0.0),
                -hy,
            ),
            face(
                [corner(-1.0, 1.0, -1.0), corner(-1.0, 1.0, 1.0), corner(1.0, 1.0, 1.0), corner(1.0, 1.0, -1.0)],
                Vec3::new(0.0, 1.0, 0.0),
                hy,
            ),
            face(
                [corner(-1.0, -1.0, -1.0), corner(-1.0, -1.0, 1.0), corner(-1.0, 1.0, 1.0), corner(-1.0, 1.0, -1.0)],
                Vec3::new(-1.0, 0.0, 0.0),
                -hx,
            ),
            face(
                [corner(1.0, -1.0, -1.0), corner(1.0, 1.0, -1.0), corner(1.0, 1.0, 1.0), corner(1.0, -1.0, 1.0)],
                Vec3::new(1.0, 0.0, 0.0),
                hx,
            ),
        ];
        Solid::new(polygons)
    }

    #[test]
    fn rotated_cube_intersection_keeps_unrotated_bounding_box() {
        // A unit cube intersected with the same cube rotated 45° about its
        // own center: the rotated square's apothem equals the original's, and
        // the original's extreme points (1,0)/(0,1) lie just inside the
        // diamond, so clipping never shrinks the bounding box.
        let a = cuboid(Vec3::zero(), Vec3::new(1.0, 1.0, 1.0));
        let b = rotated_cuboid_about_origin(std::f64::consts::FRAC_PI_4, Vec3::new(1.0, 1.0, 1.0));
        let inter = a.intersection(&b).unwrap();
        assert!(!inter.polygons.is_empty());
        for p in &inter.polygons {
            assert!(p.vertices.len() >= 3);
        }
        let (mins, maxs) = inter.bounding_box().unwrap();
        assert_relative_eq!(mins.x(), -1.0, epsilon = 1e-6);
        assert_relative_eq!(mins.y(), -1.0, epsilon = 1e-6);
        assert_relative_eq!(mins.z(), -1.0, epsilon = 1e-6);
        assert_relative_eq!(maxs.x(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(maxs.y(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(maxs.z(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn near_duplicate_translated_union_matches_self_union() {
        // B is A nudged by half a tolerance quantum; canonicalization should
        // merge their near-coincident vertices down to the same face count
        // as unioning A with itself, with the bounding box equal up to the
        // nudge.
        let a = cuboid(Vec3::zero(), Vec3::new(1.0, 1.0, 1.0));
        let nudge = crate::float_types::EPSILON / 2.0;
        let b = cuboid(Vec3::new(nudge, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let union = a.union(&b).unwrap();
        let solo = a.union(&a).unwrap();
        assert_eq!(union.polygons.len(), solo.polygons.len());
        let (u_min, u_max) = union.bounding_box().unwrap();
        let (s_min, s_max) = solo.bounding_box().unwrap();
        assert_relative_eq!(u_min.x(), s_min.x(), epsilon = crate::float_types::EPSILON);
        assert_relative_eq!(u_max.x(), s_max.x(), epsilon = crate::float_types::EPSILON);
        assert_eq!(u_min.y(), s_min.y());
        assert_eq!(u_max.y(), s_max.y());
    }

    #[test]
    fn union_all_reduces_every_operand() {
        let solids = vec![
            cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            cuboid(Vec3::new(3.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            cuboid(Vec3::new(6.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            cuboid(Vec3::new(9.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
        ];
        let total: usize = solids.iter().map(|s| s.polygons.len()).sum();
        let union = Solid::union_all(&solids).unwrap();
        assert_eq!(union.polygons.len(), total);
        let (mins, maxs) = union.bounding_box().unwrap();
        assert_eq!(mins, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(maxs, Vec3::new(10.0, 1.0, 1.0));
    }

    #[test]
    fn difference_all_reduces_left_to_right() {
        let base = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(5.0, 1.0, 1.0));
        let bite_a = cuboid(Vec3::new(-4.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let bite_b = cuboid(Vec3::new(4.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let chained = Solid::difference_all(&[base.clone(), bite_a.clone(), bite_b.clone()]).unwrap();
        let stepwise = base.difference(&bite_a).unwrap().difference(&bite_b).unwrap();
        assert_eq!(chained.bounding_box(), stepwise.bounding_box());
        assert_eq!(chained.polygons.len(), stepwise.polygons.len());
    }

    #[test]
    fn intersection_all_reduces_left_to_right() {
        let a = cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let b = cuboid(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let c = cuboid(Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let chained = Solid::intersection_all(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let stepwise = a.intersection(&b).unwrap().intersection(&c).unwrap();
        assert_eq!(chained.bounding_box(), stepwise.bounding_box());
        assert_eq!(chained.polygons.len(), stepwise.polygons.len());
    }

    #[test]
    fn nary_reductions_reject_empty_operand_lists() {
        assert!(Solid::union_all(&[]).is_err());
        assert!(Solid::difference_all(&[]).is_err());
        assert!(Solid::intersection_all(&[]).is_err());
    }
}
