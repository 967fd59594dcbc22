pub mod int128;
pub mod polygon_2d;

pub use int128::WideInt128;

/// Floating-point 2D vector, used for offset normals.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Largest coordinate magnitude handled with plain 64-bit products.
pub const LO_RANGE: i64 = 0x3FFF_FFFF;

/// Largest coordinate magnitude accepted at all.
pub const HI_RANGE: i64 = 0x3FFF_FFFF_FFFF_FFFF;

/// Integer point with an auxiliary `z` channel.
///
/// `z` is never interpreted by the clipper; it is carried through unchanged
/// so that callers can tag vertices. Equality compares `x` and `y` only.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntPoint {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl IntPoint {
    /// Creates a point with `z = 0`.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y, z: 0 }
    }

    /// Creates a point carrying auxiliary data.
    #[must_use]
    pub const fn with_z(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

impl PartialEq for IntPoint {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Eq for IntPoint {}

impl From<(i64, i64)> for IntPoint {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

/// A single open or closed polyline.
pub type Path = Vec<IntPoint>;

/// A set of paths.
pub type Paths = Vec<Path>;

/// Axis-aligned integer rectangle. `top <= bottom` in the Y-down convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

/// Rounds half away from zero, as every coordinate conversion in the crate does.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round(value: f64) -> i64 {
    if value < 0.0 {
        (value - 0.5) as i64
    } else {
        (value + 0.5) as i64
    }
}

/// Builds a path from `(x, y)` tuples.
#[must_use]
pub fn path_from(coords: &[(i64, i64)]) -> Path {
    coords.iter().copied().map(IntPoint::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_z() {
        assert_eq!(IntPoint::with_z(1, 2, 7), IntPoint::new(1, 2));
        assert_ne!(IntPoint::new(1, 2), IntPoint::new(2, 1));
    }

    #[test]
    fn round_half_away_from_zero() {
        assert_eq!(round(2.5), 3);
        assert_eq!(round(-2.5), -3);
        assert_eq!(round(2.49), 2);
        assert_eq!(round(-0.2), 0);
    }
}
