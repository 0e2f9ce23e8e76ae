//! The two cooperating trees behind every Boolean operation: the polygon
//! derivation history ([`polygon_tree`]) and the spatial BSP index built
//! over it ([`bsp`]).

pub mod bsp;
pub mod polygon_tree;

pub use bsp::BspTree;
pub use polygon_tree::{NodeId, PolygonTree};
