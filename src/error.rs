use thiserror::Error;

/// Top-level error type for clipping and offsetting.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Invariant(#[from] InvariantError),

    /// Kept for the lock flag; `&mut self` on the execute methods already
    /// prevents overlapping calls at compile time.
    #[error("execute called while another execute is in progress")]
    Busy,
}

/// Errors caused by the caller's input. The offending call contributes nothing.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("coordinate ({x}, {y}) is outside the supported range of ±{max}")]
    CoordinateOutOfRange { x: i64, y: i64, max: i64 },

    #[error("open paths can only be returned through a PolyTree")]
    OpenPathsRequireTree,

    #[error("open paths are only supported as subjects")]
    OpenClipPath,
}

/// Topologies the sweep could not resolve.
///
/// These abort the execute as a whole; the caller may retry with
/// simplified input.
#[derive(Debug, Error)]
pub enum InvariantError {
    #[error("edge has no successor in its bound")]
    MissingBoundSuccessor,

    #[error("maxima pair not found for a contributing edge")]
    MaximaPairNotFound,

    #[error("edge contributes to an output record that has no vertices")]
    DetachedOutRec,

    #[error("intersections could not be ordered into adjacent swaps")]
    UnorderableIntersections,
}

/// Convenience type alias for results using [`ClipError`].
pub type Result<T> = std::result::Result<T, ClipError>;
