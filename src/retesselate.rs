//! Retesselation (component 4.7): re-merges adjacent coplanar convex
//! fragments produced by BSP clipping back into the largest convex polygons
//! a horizontal planar sweep can find.

use crate::errors::Error;
use crate::float_types::EPSILON;
use crate::geom::plane::Plane;
use crate::geom::polygon::{build_orthonormal_basis, Polygon};
use crate::geom::shared::Shared;
use crate::geom::vec3::Vec3;
use crate::geom::vertex::Vertex;
use hashbrown::HashMap;

type PlaneKey = (i64, i64, i64, i64);

fn plane_key(plane: &Plane) -> PlaneKey {
    let m = 1.0 / EPSILON;
    (
        (plane.n.x() * m).round() as i64,
        (plane.n.y() * m).round() as i64,
        (plane.n.z() * m).round() as i64,
        (plane.w * m).round() as i64,
    )
}

#[derive(Clone, Copy, Debug)]
struct Point2 {
    x: f64,
    y: f64,
}

/// Groups `polygons` by `(plane, shared)` and re-tesselates each group
/// independently; groups of size one pass through unchanged.
pub fn retesselate(polygons: &[Polygon]) -> Result<Vec<Polygon>, Error> {
    let mut groups: HashMap<(PlaneKey, Shared), Vec<&Polygon>> = HashMap::new();
    for p in polygons {
        groups.entry((plane_key(&p.plane), p.shared)).or_default().push(p);
    }

    let mut out = Vec::with_capacity(polygons.len());
    for ((_, _), members) in groups {
        if members.len() == 1 {
            out.push(members[0].clone());
            continue;
        }
        out.extend(retesselate_group(&members)?);
    }
    Ok(out)
}

fn retesselate_group(members: &[&Polygon]) -> Result<Vec<Polygon>, Error> {
    let plane = members[0].plane;
    let shared = members[0].shared;
    let (u, v) = build_orthonormal_basis(plane.n);
    let origin = members[0].vertices[0].pos;

    // Step 1-2: project to 2D and snap near-equal y's onto one canonical
    // value so edges that originated from different source polygons but
    // describe the same horizontal cut line compare equal.
    let mut projected: Vec<Vec<Point2>> = members
        .iter()
        .map(|p| {
            p.vertices
                .iter()
                .map(|vert| {
                    let d = vert.pos.sub(&origin);
                    Point2 { x: d.dot(&u), y: d.dot(&v) }
                })
                .collect()
        })
        .collect();
    snap_y_values(&mut projected);

    // Step 3: reverse vertex order so the sweep below walks a consistent
    // winding regardless of the source polygons' own order.
    for poly in &mut projected {
        poly.reverse();
    }

    // Step 4: distinct sorted y values drive the strip sweep.
    let mut ys: Vec<f64> = projected.iter().flatten().map(|p| p.y).collect();
    ys.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ys.dedup_by(|a, b| (*a - *b).abs() < EPSILON);

    if ys.len() < 2 {
        // Degenerate: every vertex collapsed to one y. Fall back to
        // returning the members unchanged rather than fabricating geometry.
        return Ok(members.iter().map(|p| (*p).clone()).collect());
    }

    let mut open: Vec<OpenPolygon> = Vec::new();
    let mut closed: Vec<OpenPolygon> = Vec::new();

    for window in ys.windows(2) {
        let (y0, y1) = (window[0], window[1]);
        let mut quads: Vec<Quad> = Vec::new();
        for poly in &projected {
            let (min_y, max_y) = y_range(poly);
            if min_y <= y0 + EPSILON && max_y >= y1 - EPSILON {
                if let (Some((l0, r0)), Some((l1, r1))) =
                    (x_at_y(poly, y0), x_at_y(poly, y1))
                {
                    quads.push(Quad { y0, y1, left_top: l0, right_top: r0, left_bot: l1, right_bot: r1 });
                }
            }
        }
        merge_horizontal_quads(&mut quads);

        // Step 7: try to continue each still-open polygon from the
        // previous strip; anything unmatched closes out.
        let mut still_open: Vec<OpenPolygon> = Vec::new();
        let mut matched = vec![false; quads.len()];
        for candidate in open.drain(..) {
            let mut extended = None;
            for (i, quad) in quads.iter().enumerate() {
                if matched[i] {
                    continue;
                }
                if candidate.can_continue(quad) {
                    extended = Some((i, candidate.extended(quad)));
                    break;
                }
            }
            match extended {
                Some((i, polygon)) => {
                    matched[i] = true;
                    still_open.push(polygon);
                }
                None => closed.push(candidate),
            }
        }
        for (i, quad) in quads.into_iter().enumerate() {
            if !matched[i] {
                still_open.push(OpenPolygon::from_quad(&quad));
            }
        }
        open = still_open;
    }
    closed.extend(open);

    // Step 8: project every closed polygon back into 3D.
    let mut out = Vec::with_capacity(closed.len());
    for polygon2d in closed {
        let ring = polygon2d.into_ring();
        if ring.len() < 3 {
            continue;
        }
        let vertices: Vec<Vertex> = ring
            .into_iter()
            .map(|p| Vertex::new(origin.add(&u.scale(p.x)).add(&v.scale(p.y))))
            .collect();
        out.push(Polygon::new(vertices, plane, shared)?);
    }
    Ok(out)
}

fn y_range(poly: &[Point2]) -> (f64, f64) {
    let min_y = poly.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = poly.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    (min_y, max_y)
}

/// The two x crossings of the convex ring `poly` at horizontal level `y`,
/// as `(min_x, max_x)`.
fn x_at_y(poly: &[Point2], y: f64) -> Option<(f64, f64)> {
    let mut xs = Vec::new();
    let n = poly.len();
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if (a.y - y) * (b.y - y) <= 0.0 {
            if (a.y - b.y).abs() < EPSILON {
                xs.push(a.x);
                xs.push(b.x);
            } else {
                let t = (y - a.y) / (b.y - a.y);
                xs.push(a.x + t * (b.x - a.x));
            }
        }
    }
    if xs.is_empty() {
        return None;
    }
    let min_x = xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some((min_x, max_x))
}

fn snap_y_values(polys: &mut [Vec<Point2>]) {
    let bin_factor = 10.0 / EPSILON;
    let mut all_y: Vec<f64> = polys.iter().flatten().map(|p| p.y).collect();
    all_y.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut canonical: Vec<f64> = Vec::new();
    for y in all_y {
        match canonical.last() {
            Some(&last) if ((y - last) * bin_factor).abs() < 1.0 => {}
            _ => canonical.push(y),
        }
    }

    for poly in polys.iter_mut() {
        for p in poly.iter_mut() {
            if let Some(&nearest) = canonical
                .iter()
                .min_by(|a, b| (*a - p.y).abs().partial_cmp(&(*b - p.y).abs()).unwrap())
            {
                p.y = nearest;
            }
        }
    }
}

#[derive(Clone, Copy)]
struct Quad {
    y0: f64,
    y1: f64,
    left_top: f64,
    right_top: f64,
    left_bot: f64,
    right_bot: f64,
}

/// Merges quads within one strip that share a vertical edge (this quad's
/// right edge equals the next quad's left edge within EPS, top and bottom).
fn merge_horizontal_quads(quads: &mut Vec<Quad>) {
    quads.sort_by(|a, b| a.left_top.partial_cmp(&b.left_top).unwrap());
    let mut merged: Vec<Quad> = Vec::with_capacity(quads.len());
    for q in quads.drain(..) {
        if let Some(last) = merged.last_mut() {
            if (last.right_top - q.left_top).abs() < EPSILON
                && (last.right_bot - q.left_bot).abs() < EPSILON
            {
                last.right_top = q.right_top;
                last.right_bot = q.right_bot;
                continue;
            }
        }
        merged.push(q);
    }
    *quads = merged;
}

/// A polygon under construction while the sweep descends: the left chain
/// (top to bottom so far) and right chain, kept separate until closed.
struct OpenPolygon {
    left: Vec<Point2>,
    right: Vec<Point2>,
    bottom_left_x: f64,
    bottom_right_x: f64,
    last_left_slope: Option<f64>,
    last_right_slope: Option<f64>,
}

impl OpenPolygon {
    fn from_quad(q: &Quad) -> Self {
        OpenPolygon {
            left: vec![Point2 { x: q.left_top, y: q.y0 }, Point2 { x: q.left_bot, y: q.y1 }],
            right: vec![Point2 { x: q.right_top, y: q.y0 }, Point2 { x: q.right_bot, y: q.y1 }],
            bottom_left_x: q.left_bot,
            bottom_right_x: q.right_bot,
            last_left_slope: Some(slope(q.left_top, q.y0, q.left_bot, q.y1)),
            last_right_slope: Some(slope(q.right_top, q.y0, q.right_bot, q.y1)),
        }
    }

    fn can_continue(&self, q: &Quad) -> bool {
        if (self.bottom_left_x - q.left_top).abs() > EPSILON
            || (self.bottom_right_x - q.right_top).abs() > EPSILON
        {
            return false;
        }
        let new_left_slope = slope(q.left_top, q.y0, q.left_bot, q.y1);
        let new_right_slope = slope(q.right_top, q.y0, q.right_bot, q.y1);
        let left_ok = self.last_left_slope.map_or(true, |s| new_left_slope - s >= -EPSILON);
        let right_ok = self.last_right_slope.map_or(true, |s| s - new_right_slope >= -EPSILON);
        left_ok && right_ok
    }

    fn extended(mut self, q: &Quad) -> Self {
        self.left.push(Point2 { x: q.left_bot, y: q.y1 });
        self.right.push(Point2 { x: q.right_bot, y: q.y1 });
        self.bottom_left_x = q.left_bot;
        self.bottom_right_x = q.right_bot;
        self.last_left_slope = Some(slope(q.left_top, q.y0, q.left_bot, q.y1));
        self.last_right_slope = Some(slope(q.right_top, q.y0, q.right_bot, q.y1));
        self
    }

    /// Walks left (top to bottom), across the bottom, then back up the
    /// right chain (bottom to top), producing a closed ring.
    fn into_ring(self) -> Vec<Point2> {
        let mut ring = self.left;
        let mut right_rev = self.right;
        right_rev.reverse();
        ring.extend(right_rev);
        ring
    }
}

fn slope(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    if (y1 - y0).abs() < EPSILON {
        0.0
    } else {
        (x1 - x0) / (y1 - y0)
    }
}
