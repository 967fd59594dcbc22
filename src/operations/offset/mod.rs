mod path_offset;

pub use path_offset::{offset_paths, JoinType, OffsetOptions, PathOffset};
