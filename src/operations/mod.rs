//! Path-set operations built on the [`Clipper`](crate::clipper::Clipper).

pub mod boolean;
pub mod offset;
pub mod simplify;

pub use boolean::{difference, intersection, union, xor, Boolean};
pub use offset::{offset_paths, JoinType, OffsetOptions, PathOffset};
pub use simplify::{clean_polygon, clean_polygons, simplify_polygon, simplify_polygons, DEFAULT_CLEAN_DISTANCE};
