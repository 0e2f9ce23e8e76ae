//! Polygon–plane classification and splitting (component 4.1): the single
//! place the kernel decides which side(s) of a plane a polygon lies on.

use super::plane::Plane;
use super::polygon::Polygon;
use super::vertex::Vertex;
use crate::errors::Error;
use crate::float_types::{EPSILON, EPSILON_SQUARED};

/// Which side(s) of a plane a polygon (or polygon fragment) lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    CoplanarFront,
    CoplanarBack,
    Front,
    Back,
    Spanning,
}

/// Result of splitting a polygon against a plane. `front`/`back` are
/// populated only when `classification == Spanning`.
pub struct SplitResult {
    pub classification: Classification,
    pub front: Option<Polygon>,
    pub back: Option<Polygon>,
}

const COPLANAR_BIT: u8 = 0;
const FRONT_BIT: u8 = 1;
const BACK_BIT: u8 = 2;

fn vertex_bit(t: f64) -> u8 {
    if t > EPSILON {
        FRONT_BIT
    } else if t < -EPSILON {
        BACK_BIT
    } else {
        COPLANAR_BIT
    }
}

/// Classifies `polygon` against `plane` and, if the polygon spans the plane,
/// produces front and back fragments that retain the polygon's `shared`
/// metadata and original plane.
pub fn split_polygon_by_plane(plane: &Plane, polygon: &Polygon) -> Result<SplitResult, Error> {
    let distances: Vec<f64> = polygon
        .vertices
        .iter()
        .map(|v| plane.signed_distance(&v.pos))
        .collect();
    let bits: Vec<u8> = distances.iter().map(|&t| vertex_bit(t)).collect();
    let poly_type = bits.iter().fold(0u8, |acc, &b| acc | b);

    match poly_type {
        // All coplanar.
        0 => {
            let classification = if plane.n.dot(&polygon.plane.n) >= 0.0 {
                Classification::CoplanarFront
            } else {
                Classification::CoplanarBack
            };
            Ok(SplitResult { classification, front: None, back: None })
        }
        b if b == FRONT_BIT => {
            Ok(SplitResult { classification: Classification::Front, front: None, back: None })
        }
        b if b == BACK_BIT => {
            Ok(SplitResult { classification: Classification::Back, front: None, back: None })
        }
        _ => {
            let mut front_vertices: Vec<Vertex> = Vec::new();
            let mut back_vertices: Vec<Vertex> = Vec::new();
            let n = polygon.vertices.len();

            for i in 0..n {
                let j = (i + 1) % n;
                let (ti, tj) = (bits[i], bits[j]);
                let vi = &polygon.vertices[i];
                let vj = &polygon.vertices[j];

                if ti != BACK_BIT {
                    front_vertices.push(*vi);
                }
                if ti != FRONT_BIT {
                    back_vertices.push(*vi);
                }
                let spans = (ti == FRONT_BIT && tj == BACK_BIT)
                    || (ti == BACK_BIT && tj == FRONT_BIT);
                if spans {
                    let pos = plane.split_line_between_points(&vi.pos, &vj.pos);
                    let v = Vertex::new(pos);
                    front_vertices.push(v);
                    back_vertices.push(v);
                }
            }

            dedup_consecutive(&mut front_vertices);
            dedup_consecutive(&mut back_vertices);

            let front = if front_vertices.len() >= 3 {
                Some(Polygon::new(front_vertices, polygon.plane, polygon.shared)?)
            } else {
                None
            };
            let back = if back_vertices.len() >= 3 {
                Some(Polygon::new(back_vertices, polygon.plane, polygon.shared)?)
            } else {
                None
            };

            Ok(SplitResult { classification: Classification::Spanning, front, back })
        }
    }
}

fn dedup_consecutive(vertices: &mut Vec<Vertex>) {
    if vertices.len() < 2 {
        return;
    }
    let mut out: Vec<Vertex> = Vec::with_capacity(vertices.len());
    for v in vertices.drain(..) {
        match out.last() {
            Some(last) if last.pos.distance_squared(&v.pos) < EPSILON_SQUARED => {}
            _ => out.push(v),
        }
    }
    if out.len() > 1 && out.first().unwrap().pos.distance_squared(&out.last().unwrap().pos) < EPSILON_SQUARED {
        out.pop();
    }
    *vertices = out;
}
