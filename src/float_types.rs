//! Shared floating point type and the epsilon family used throughout the kernel.

/// The floating point type used for all geometric computation.
pub type Real = f64;

/// Distance tolerance governing split classification, vertex/plane dedup, and
/// the quantization quantum used by [`crate::fuzzy::FuzzyFactory`] (`1.0 / EPSILON`
/// is its default multiplier).
pub const EPSILON: Real = 1e-5;

/// `EPSILON` squared, used for positional dedup comparisons against squared
/// distances so callers avoid an extra `sqrt`.
pub const EPSILON_SQUARED: Real = EPSILON * EPSILON;

/// Angular tolerance, in degrees, used where a normal-direction comparison is
/// more natural than a distance comparison.
pub const ANGLE_EPSILON_DEGREES: Real = 0.1;

/// Area tolerance below which a polygon fragment is treated as degenerate.
pub const AREA_EPSILON: Real = 4.99e-12;
