pub mod clipper;
pub mod error;
pub mod math;
pub mod operations;

pub use clipper::{ClipType, Clipper, PolyFillType, PolyTree, PolyType};
pub use error::{ClipError, Result};
pub use math::{IntPoint, IntRect, Path, Paths};
