//! Typed error surface for the kernel. Every public operation that can fail
//! returns `Result<T, Error>` rather than panicking; panics in this crate
//! indicate a bug, not a bad input.

use thiserror::Error;

/// Errors produced by the geometric kernel.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The caller supplied data the kernel cannot build a valid value from:
    /// a non-finite vector component, a polygon with fewer than three
    /// vertices, or (with `kernel-debug-assertions`) a non-convex polygon.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A geometric computation hit a degenerate configuration it cannot
    /// resolve, such as intersecting two parallel planes.
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    /// A PolygonTree or BSP invariant was violated. In a correct build this
    /// is unreachable; it is surfaced as an error rather than a panic so a
    /// caller embedding the kernel can log and abort cleanly instead of
    /// unwinding through foreign code.
    #[error("internal invariant violated: {0}")]
    Assertion(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
