//! Vatti sweep-line clipping of integer paths.
//!
//! Paths are added as subject or clip, split into bounds at their local
//! minima, and swept bottom-up (from large to small Y). [`Clipper::execute`]
//! returns flat closed paths, [`Clipper::execute_tree`] returns the
//! outer/hole nesting and supports open subject paths.

mod edge;
mod horizontal;
mod intersect;
mod join;
mod local_minima;
mod output;
mod sweep;
pub mod tree;
mod winding;

pub use tree::{
    closed_paths_from_tree, open_paths_from_tree, poly_tree_to_paths, PolyNode, PolyNodeId,
    PolyTree,
};

use tracing::debug;

use crate::error::{ClipError, InputError, Result};
use crate::math::{IntPoint, IntRect, Paths};

use local_minima::EdgeTable;
use sweep::{Sweep, SweepConfig};

/// Boolean operation performed by [`Clipper::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipType {
    Intersection,
    Union,
    Difference,
    Xor,
}

/// Role of an added path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolyType {
    #[default]
    Subject,
    Clip,
}

/// Rule deciding which regions of a self-overlapping path set are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolyFillType {
    /// Odd winding numbers are filled.
    #[default]
    EvenOdd,
    /// Non-zero winding numbers are filled.
    NonZero,
    /// Winding numbers above zero are filled.
    Positive,
    /// Winding numbers below zero are filled.
    Negative,
}

/// Callback filling the `z` of intersection vertices.
///
/// Receives the `z` of the bottom vertex of each crossing edge and the new
/// vertex, whose `z` it may overwrite.
pub type ZFillFn = dyn FnMut(i64, i64, &mut IntPoint) + Send;

/// Polygon clipping engine.
///
/// Holds every added path between executes; each execute reruns the sweep
/// over all of them, so the same paths can be clipped with several
/// operations.
#[derive(Default)]
pub struct Clipper {
    table: EdgeTable,
    z_fill: Option<Box<ZFillFn>>,
    preserve_collinear: bool,
    reverse_solution: bool,
    locked: bool,
}

impl std::fmt::Debug for Clipper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clipper")
            .field("edges", &self.table.edges.len())
            .field("minima", &self.table.minima.len())
            .field("preserve_collinear", &self.preserve_collinear)
            .field("reverse_solution", &self.reverse_solution)
            .field("z_fill", &self.z_fill.is_some())
            .finish_non_exhaustive()
    }
}

impl Clipper {
    /// Creates an empty clipper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps vertices that lie strictly between colinear neighbours, in the
    /// input and in the output.
    #[must_use]
    pub fn preserve_collinear(mut self, preserve: bool) -> Self {
        self.preserve_collinear = preserve;
        self
    }

    /// Outputs outer contours with negative and holes with positive area.
    #[must_use]
    pub fn reverse_solution(mut self, reverse: bool) -> Self {
        self.reverse_solution = reverse;
        self
    }

    /// Installs the callback that fills `z` on intersection vertices.
    pub fn set_z_fill<F>(&mut self, fill: F)
    where
        F: FnMut(i64, i64, &mut IntPoint) + Send + 'static,
    {
        self.z_fill = Some(Box::new(fill));
    }

    /// Removes the `z` callback.
    pub fn clear_z_fill(&mut self) {
        self.z_fill = None;
    }

    /// Adds one path.
    ///
    /// Returns `Ok(false)` when the path is too degenerate to contribute,
    /// e.g. fewer than three distinct non-colinear vertices for a closed path.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::CoordinateOutOfRange`] if any coordinate is out of
    /// range and [`InputError::OpenClipPath`] for an open clip path. The path
    /// is not added in either case.
    pub fn add_path(&mut self, path: &[IntPoint], poly_type: PolyType, closed: bool) -> Result<bool> {
        self.table
            .add_path(path, poly_type, closed, self.preserve_collinear)
    }

    /// Adds several paths; returns whether any of them was accepted.
    ///
    /// # Errors
    ///
    /// Stops at the first path that fails [`Clipper::add_path`]; earlier
    /// paths stay added.
    pub fn add_paths(&mut self, paths: &[Vec<IntPoint>], poly_type: PolyType, closed: bool) -> Result<bool> {
        let mut any = false;
        for path in paths {
            if self.add_path(path, poly_type, closed)? {
                any = true;
            }
        }
        Ok(any)
    }

    /// Removes every added path.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Bounding rectangle of every added path, or `None` when nothing was added.
    #[must_use]
    pub fn bounds(&self) -> Option<IntRect> {
        self.table.bounds()
    }

    /// Runs `clip_type` over the added paths and returns closed contours.
    ///
    /// Outer contours have positive [`area`](crate::math::polygon_2d::area)
    /// and holes negative, unless [`Clipper::reverse_solution`] is set.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::OpenPathsRequireTree`] if open paths were added,
    /// [`ClipError::Busy`] on re-entry, and an [`InvariantError`] when the
    /// sweep meets a topology it cannot resolve.
    ///
    /// Both execute methods take `&mut self`, so the borrow checker already
    /// rules out a second execute while one runs; `Busy` is only a guard on
    /// the lock flag and is not reachable from safe code.
    ///
    /// [`InvariantError`]: crate::error::InvariantError
    pub fn execute(
        &mut self,
        clip_type: ClipType,
        subj_fill: PolyFillType,
        clip_fill: PolyFillType,
    ) -> Result<Paths> {
        if self.table.has_open_paths {
            return Err(InputError::OpenPathsRequireTree.into());
        }
        self.with_sweep(clip_type, subj_fill, clip_fill, false, |sweep| {
            Ok(sweep.build_paths())
        })
    }

    /// Runs `clip_type` over the added paths and returns the nested result.
    ///
    /// Open subject paths come back as open top-level nodes.
    ///
    /// # Errors
    ///
    /// Returns [`ClipError::Busy`] on re-entry (unreachable from safe code,
    /// see [`Clipper::execute`]) and an [`InvariantError`] when the sweep
    /// meets a topology it cannot resolve.
    ///
    /// [`InvariantError`]: crate::error::InvariantError
    pub fn execute_tree(
        &mut self,
        clip_type: ClipType,
        subj_fill: PolyFillType,
        clip_fill: PolyFillType,
    ) -> Result<PolyTree> {
        self.with_sweep(clip_type, subj_fill, clip_fill, true, |sweep| {
            Ok(sweep.build_tree())
        })
    }

    fn with_sweep<T>(
        &mut self,
        clip_type: ClipType,
        subj_fill: PolyFillType,
        clip_fill: PolyFillType,
        using_tree: bool,
        build: impl FnOnce(&mut Sweep<'_>) -> Result<T>,
    ) -> Result<T> {
        if self.locked {
            return Err(ClipError::Busy);
        }
        self.locked = true;
        debug!(
            ?clip_type,
            ?subj_fill,
            ?clip_fill,
            minima = self.table.minima.len(),
            "executing clip"
        );
        let config = SweepConfig {
            clip_type,
            subj_fill,
            clip_fill,
            preserve_collinear: self.preserve_collinear,
            reverse_output: self.reverse_solution,
            using_tree,
        };
        self.table.reset();
        let mut sweep = Sweep::new(&mut self.table, self.z_fill.as_deref_mut(), config);
        let result = sweep.run().and_then(|()| build(&mut sweep));
        if let Err(err) = &result {
            debug!(%err, "clip failed");
        } else {
            debug!(records = sweep.out_recs.len(), "clip finished");
        }
        drop(sweep);
        self.locked = false;
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::path_from;
    use crate::math::polygon_2d::{area, orientation};
    use approx::assert_relative_eq;

    fn square(x: i64, y: i64, size: i64) -> Vec<IntPoint> {
        path_from(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
    }

    fn total_area(paths: &Paths) -> f64 {
        paths.iter().map(|p| area(p)).sum()
    }

    /// Routes sweep logs to the test output, filtered by `RUST_LOG`.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn empty_clipper_yields_nothing() {
        let mut clipper = Clipper::new();
        let result = clipper
            .execute(ClipType::Union, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap();
        assert!(result.is_empty());
        assert!(clipper.bounds().is_none());
    }

    #[test]
    fn overlapping_squares() {
        init_tracing();
        let mut clipper = Clipper::new();
        clipper.add_path(&square(0, 0, 10), PolyType::Subject, true).unwrap();
        clipper.add_path(&square(5, 5, 10), PolyType::Clip, true).unwrap();

        let inter = clipper
            .execute(ClipType::Intersection, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap();
        assert_eq!(inter.len(), 1);
        assert_eq!(inter[0].len(), 4);
        assert_relative_eq!(total_area(&inter), 25.0);

        let union = clipper
            .execute(ClipType::Union, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap();
        assert_eq!(union.len(), 1);
        assert_eq!(union[0].len(), 8);
        assert_relative_eq!(total_area(&union), 175.0);
        assert!(orientation(&union[0]));

        let diff = clipper
            .execute(ClipType::Difference, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap();
        assert_relative_eq!(total_area(&diff), 75.0);

        let xor = clipper
            .execute(ClipType::Xor, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap();
        assert_relative_eq!(total_area(&xor), 150.0);
    }

    #[test]
    fn reverse_solution_flips_orientation() {
        let mut clipper = Clipper::new().reverse_solution(true);
        clipper.add_path(&square(0, 0, 10), PolyType::Subject, true).unwrap();
        let result = clipper
            .execute(ClipType::Union, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap();
        assert_eq!(result.len(), 1);
        assert!(!orientation(&result[0]));
    }

    #[test]
    fn open_paths_need_a_tree() {
        let mut clipper = Clipper::new();
        clipper
            .add_path(&path_from(&[(0, 5), (20, 5)]), PolyType::Subject, false)
            .unwrap();
        clipper.add_path(&square(5, 0, 10), PolyType::Clip, true).unwrap();
        let err = clipper
            .execute(ClipType::Intersection, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap_err();
        assert!(matches!(err, ClipError::Input(InputError::OpenPathsRequireTree)));

        let tree = clipper
            .execute_tree(ClipType::Intersection, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap();
        let open = open_paths_from_tree(&tree);
        assert_eq!(open.len(), 1);
        let mut xs: Vec<i64> = open[0].iter().map(|p| p.x).collect();
        xs.sort_unstable();
        assert_eq!(xs.first(), Some(&5));
        assert_eq!(xs.last(), Some(&15));
        assert!(open[0].iter().all(|p| p.y == 5));
    }

    #[test]
    fn z_fill_tags_intersections() {
        let mut clipper = Clipper::new();
        let mut subject = square(0, 0, 10);
        for pt in &mut subject {
            pt.z = 1;
        }
        let mut clip = square(5, 5, 10);
        for pt in &mut clip {
            pt.z = 2;
        }
        clipper.add_path(&subject, PolyType::Subject, true).unwrap();
        clipper.add_path(&clip, PolyType::Clip, true).unwrap();
        clipper.set_z_fill(|z1, z2, pt| pt.z = z1 * 10 + z2);
        let result = clipper
            .execute(ClipType::Intersection, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap();
        assert_eq!(result.len(), 1);
        for pt in &result[0] {
            match (pt.x, pt.y) {
                (10, 10) => assert_eq!(pt.z, 1),
                (5, 5) => assert_eq!(pt.z, 2),
                _ => assert!(pt.z == 12 || pt.z == 21, "unexpected z {} at {pt:?}", pt.z),
            }
        }
    }

    #[test]
    fn z_fill_skips_crossings_that_are_not_output() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        // Two overlapping clip squares deep inside the subject: their
        // crossings never reach the union's outline.
        let mut clipper = Clipper::new();
        clipper.add_path(&square(0, 0, 30), PolyType::Subject, true).unwrap();
        clipper.add_path(&square(5, 5, 10), PolyType::Clip, true).unwrap();
        clipper.add_path(&square(10, 10, 10), PolyType::Clip, true).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        clipper.set_z_fill(move |_, _, pt| {
            counter.fetch_add(1, Ordering::Relaxed);
            pt.z = 1;
        });
        let result = clipper
            .execute(ClipType::Union, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 4);
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        // The same crossings are output vertices of the clip union.
        let mut clipper = Clipper::new();
        clipper.add_path(&square(5, 5, 10), PolyType::Subject, true).unwrap();
        clipper.add_path(&square(10, 10, 10), PolyType::Clip, true).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        clipper.set_z_fill(move |_, _, pt| {
            counter.fetch_add(1, Ordering::Relaxed);
            pt.z = 1;
        });
        let result = clipper
            .execute(ClipType::Union, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap();
        assert_eq!(result.len(), 1);
        let tagged = result[0].iter().filter(|pt| pt.z == 1).count();
        assert_eq!(tagged, 2);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn lock_is_released_after_each_execute() {
        let mut clipper = Clipper::new();
        clipper.add_path(&square(0, 0, 10), PolyType::Subject, true).unwrap();
        for _ in 0..2 {
            let paths = clipper
                .execute(ClipType::Union, PolyFillType::NonZero, PolyFillType::NonZero)
                .unwrap();
            assert_eq!(paths.len(), 1);
            assert!(!clipper.locked);
            let tree = clipper
                .execute_tree(ClipType::Union, PolyFillType::NonZero, PolyFillType::NonZero)
                .unwrap();
            assert_eq!(tree.total(), 1);
            assert!(!clipper.locked);
        }
    }

    #[test]
    fn clear_and_reuse() {
        let mut clipper = Clipper::new();
        clipper.add_path(&square(0, 0, 10), PolyType::Subject, true).unwrap();
        assert_eq!(
            clipper.bounds(),
            Some(IntRect { left: 0, top: 0, right: 10, bottom: 10 })
        );
        clipper.clear();
        assert!(clipper.bounds().is_none());
        clipper.add_path(&square(2, 2, 3), PolyType::Subject, true).unwrap();
        let result = clipper
            .execute(ClipType::Union, PolyFillType::EvenOdd, PolyFillType::EvenOdd)
            .unwrap();
        assert_relative_eq!(total_area(&result), 9.0);
    }

    #[test]
    fn add_paths_reports_acceptance() {
        let mut clipper = Clipper::new();
        let degenerate = vec![path_from(&[(0, 0), (1, 1)])];
        assert!(!clipper.add_paths(&degenerate, PolyType::Subject, true).unwrap());
        let mixed = vec![path_from(&[(0, 0), (1, 1)]), square(0, 0, 4)];
        assert!(clipper.add_paths(&mixed, PolyType::Subject, true).unwrap());
    }
}
