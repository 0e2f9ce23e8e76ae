//! Constructive solid geometry on convex-polygon solids, built on a Binary
//! Space Partitioning (BSP) engine: union, difference, and intersection of
//! closed polyhedra represented as lists of coplanar convex polygons.
//!
//! The kernel is single-threaded and performs no I/O. Primitive shape
//! constructors, 2D paths, and mesh file-format glue live in layers above
//! this crate, not inside it.

#![forbid(unsafe_code)]

pub mod canonicalize;
pub mod errors;
pub mod float_types;
pub mod fuzzy;
pub mod geom;
pub mod mesh_io;
pub mod properties;
pub mod retesselate;
pub mod solid;
pub mod tree;

pub use errors::{Error, Result};
pub use geom::{Plane, Polygon, Shared, Vec3, Vertex};
pub use solid::Solid;
