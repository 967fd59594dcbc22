use slotmap::SlotMap;
use tracing::debug;

use crate::error::{InputError, Result};
use crate::math::polygon_2d::{pt2_is_between_pt1_and_pt3, slopes_equal3};
use crate::math::{IntPoint, IntRect, HI_RANGE, LO_RANGE};

use super::edge::{Edge, EdgeId, EdgeSide};
use super::PolyType;

/// Start of a pair of bounds.
///
/// Open paths can produce minima with only one bound.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalMinimum {
    pub y: i64,
    pub left_bound: Option<EdgeId>,
    pub right_bound: Option<EdgeId>,
}

/// Every added path, split into bounds.
///
/// Built incrementally by [`EdgeTable::add_path`] and reset, not rebuilt, at
/// the start of every execute.
#[derive(Debug, Default)]
pub(crate) struct EdgeTable {
    pub edges: SlotMap<EdgeId, Edge>,
    pub minima: Vec<LocalMinimum>,
    /// Set once any coordinate exceeds [`LO_RANGE`]; slope tests then use
    /// 128-bit products.
    pub use_full_range: bool,
    pub has_open_paths: bool,
}

fn range_test(pt: IntPoint, full_range: &mut bool) -> Result<()> {
    let magnitude = pt.x.unsigned_abs().max(pt.y.unsigned_abs());
    if magnitude > HI_RANGE.unsigned_abs() {
        return Err(InputError::CoordinateOutOfRange {
            x: pt.x,
            y: pt.y,
            max: HI_RANGE,
        }
        .into());
    }
    if magnitude > LO_RANGE.unsigned_abs() {
        *full_range = true;
    }
    Ok(())
}

impl EdgeTable {
    /// Drops every edge and minimum.
    pub fn clear(&mut self) {
        self.edges.clear();
        self.minima.clear();
        self.use_full_range = false;
        self.has_open_paths = false;
    }

    /// Adds one path as a ring of edges and records its local minima.
    ///
    /// Returns `Ok(false)` when the path is degenerate after removing duplicate
    /// (and, for closed paths, colinear) vertices.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::CoordinateOutOfRange`] when a coordinate exceeds
    /// [`HI_RANGE`], and [`InputError::OpenClipPath`] for open clip paths.
    pub fn add_path(
        &mut self,
        path: &[IntPoint],
        poly_type: PolyType,
        closed: bool,
        preserve_collinear: bool,
    ) -> Result<bool> {
        if !closed && poly_type == PolyType::Clip {
            return Err(InputError::OpenClipPath.into());
        }
        let Some(mut high) = path.len().checked_sub(1) else {
            return Ok(false);
        };
        if closed {
            while high > 0 && path[high] == path[0] {
                high -= 1;
            }
        }
        while high > 0 && path[high] == path[high - 1] {
            high -= 1;
        }
        if (closed && high < 2) || (!closed && high < 1) {
            return Ok(false);
        }

        let mut full_range = self.use_full_range;
        for &pt in &path[..=high] {
            range_test(pt, &mut full_range)?;
        }
        if full_range && !self.use_full_range {
            debug!("coordinates exceed the 64-bit product range, using 128-bit slopes");
            self.use_full_range = true;
        }

        let ids: Vec<EdgeId> = path[..=high]
            .iter()
            .map(|&pt| self.edges.insert_with_key(|id| Edge::new(id, pt)))
            .collect();
        let count = ids.len();
        for (i, &id) in ids.iter().enumerate() {
            let edge = &mut self.edges[id];
            edge.next = ids[(i + 1) % count];
            edge.prev = ids[(i + count - 1) % count];
        }

        // Remove duplicate vertices, and colinear ones on closed paths.
        let mut e_start = ids[0];
        let mut e = e_start;
        let mut e_loop_stop = e_start;
        loop {
            let next = self.edges[e].next;
            let prev = self.edges[e].prev;
            let curr = self.edges[e].curr;
            if curr == self.edges[next].curr && (closed || next != e_start) {
                if e == next {
                    break;
                }
                if e == e_start {
                    e_start = next;
                }
                e = self.remove_edge(e);
                e_loop_stop = e;
                continue;
            }
            if prev == next {
                break;
            }
            let prev_pt = self.edges[prev].curr;
            let next_pt = self.edges[next].curr;
            if closed
                && slopes_equal3(prev_pt, curr, next_pt, self.use_full_range)
                && (!preserve_collinear || !pt2_is_between_pt1_and_pt3(prev_pt, curr, next_pt))
            {
                if e == e_start {
                    e_start = next;
                }
                e = self.remove_edge(e);
                e = self.edges[e].prev;
                e_loop_stop = e;
                continue;
            }
            e = next;
            if e == e_loop_stop || (!closed && self.edges[e].next == e_start) {
                break;
            }
        }

        if (!closed && e == self.edges[e].next)
            || (closed && self.edges[e].prev == self.edges[e].next)
        {
            self.discard_ring(e);
            return Ok(false);
        }

        if !closed {
            self.has_open_paths = true;
            let last = self.edges[e_start].prev;
            self.edges[last].skip = true;
        }

        let mut e = e_start;
        let mut is_flat = true;
        loop {
            self.init_bot_top(e, poly_type);
            e = self.edges[e].next;
            if is_flat && self.edges[e].curr.y != self.edges[e_start].curr.y {
                is_flat = false;
            }
            if e == e_start {
                break;
            }
        }

        if is_flat {
            if closed {
                self.discard_ring(e);
                return Ok(false);
            }
            // A flat open path is a single right bound.
            let y = self.edges[e].bot.y;
            let right = e;
            {
                let edge = &mut self.edges[right];
                edge.side = EdgeSide::Right;
                edge.wind_delta = 0;
            }
            loop {
                let prev_top_x = self.edges[self.edges[e].prev].top.x;
                if self.edges[e].bot.x != prev_top_x {
                    self.reverse_horizontal(e);
                }
                let next = self.edges[e].next;
                if self.edges[next].skip {
                    break;
                }
                self.edges[e].next_in_lml = Some(next);
                e = next;
            }
            self.minima.push(LocalMinimum {
                y,
                left_bound: None,
                right_bound: Some(right),
            });
            return Ok(true);
        }

        // Open paths whose ends meet would otherwise never find a minimum.
        let prev = self.edges[e].prev;
        if self.edges[prev].bot == self.edges[prev].top {
            e = self.edges[e].next;
        }

        let mut e_min: Option<EdgeId> = None;
        loop {
            e = self.find_next_loc_min(e);
            if Some(e) == e_min {
                break;
            }
            if e_min.is_none() {
                e_min = Some(e);
            }

            let y = self.edges[e].bot.y;
            let prev = self.edges[e].prev;
            let (left, right, left_is_forward) = if self.edges[e].dx < self.edges[prev].dx {
                (prev, e, false)
            } else {
                (e, prev, true)
            };
            let wind_delta = if !closed {
                0
            } else if self.edges[left].next == right {
                -1
            } else {
                1
            };
            self.edges[left].wind_delta = wind_delta;
            self.edges[right].wind_delta = -wind_delta;

            e = self.process_bound(left, left_is_forward);
            if self.edges[e].skip {
                e = self.process_bound(e, left_is_forward);
            }
            let mut e2 = self.process_bound(right, !left_is_forward);
            if self.edges[e2].skip {
                e2 = self.process_bound(e2, !left_is_forward);
            }

            let (left_bound, right_bound) = if self.edges[left].skip {
                (None, Some(right))
            } else if self.edges[right].skip {
                (Some(left), None)
            } else {
                (Some(left), Some(right))
            };
            self.minima.push(LocalMinimum {
                y,
                left_bound,
                right_bound,
            });
            if !left_is_forward {
                e = e2;
            }
        }
        Ok(true)
    }

    fn init_bot_top(&mut self, e: EdgeId, poly_type: PolyType) {
        let next_pt = self.edges[self.edges[e].next].curr;
        let edge = &mut self.edges[e];
        if edge.curr.y >= next_pt.y {
            edge.bot = edge.curr;
            edge.top = next_pt;
        } else {
            edge.top = edge.curr;
            edge.bot = next_pt;
        }
        edge.set_dx();
        edge.poly_type = poly_type;
    }

    /// Unlinks `e` from its ring and returns its successor.
    fn remove_edge(&mut self, e: EdgeId) -> EdgeId {
        let (prev, next) = (self.edges[e].prev, self.edges[e].next);
        self.edges[prev].next = next;
        self.edges[next].prev = prev;
        self.edges.remove(e);
        next
    }

    fn discard_ring(&mut self, start: EdgeId) {
        let mut ring = vec![start];
        let mut e = self.edges[start].next;
        while e != start {
            ring.push(e);
            e = self.edges[e].next;
        }
        for id in ring {
            self.edges.remove(id);
        }
    }

    /// Swaps a horizontal edge's ends so that it continues from its predecessor.
    fn reverse_horizontal(&mut self, e: EdgeId) {
        let edge = &mut self.edges[e];
        std::mem::swap(&mut edge.top.x, &mut edge.bot.x);
        std::mem::swap(&mut edge.top.z, &mut edge.bot.z);
    }

    fn is_horizontal(&self, e: EdgeId) -> bool {
        self.edges[e].is_horizontal()
    }

    fn find_next_loc_min(&self, mut e: EdgeId) -> EdgeId {
        loop {
            while self.edges[e].bot != self.edges[self.edges[e].prev].bot
                || self.edges[e].curr == self.edges[e].top
            {
                e = self.edges[e].next;
            }
            if !self.is_horizontal(e) && !self.is_horizontal(self.edges[e].prev) {
                break;
            }
            while self.is_horizontal(self.edges[e].prev) {
                e = self.edges[e].prev;
            }
            let e2 = e;
            while self.is_horizontal(e) {
                e = self.edges[e].next;
            }
            if self.edges[e].top.y == self.edges[self.edges[e].prev].bot.y {
                // Just an intermediate horizontal.
                continue;
            }
            if self.edges[self.edges[e2].prev].bot.x < self.edges[e].bot.x {
                e = e2;
            }
            break;
        }
        e
    }

    /// Chains the edges of one bound through `next_in_lml` and returns the
    /// first edge beyond it.
    fn process_bound(&mut self, mut e: EdgeId, next_is_forward: bool) -> EdgeId {
        let mut result = e;

        if self.edges[e].skip {
            // Edges may remain beyond the skip edge; they form another minimum.
            if next_is_forward {
                while self.edges[e].top.y == self.edges[self.edges[e].next].bot.y {
                    e = self.edges[e].next;
                }
                while e != result && self.is_horizontal(e) {
                    e = self.edges[e].prev;
                }
            } else {
                while self.edges[e].top.y == self.edges[self.edges[e].prev].bot.y {
                    e = self.edges[e].prev;
                }
                while e != result && self.is_horizontal(e) {
                    e = self.edges[e].next;
                }
            }
            if e == result {
                return if next_is_forward {
                    self.edges[e].next
                } else {
                    self.edges[e].prev
                };
            }
            e = if next_is_forward {
                self.edges[result].next
            } else {
                self.edges[result].prev
            };
            let y = self.edges[e].bot.y;
            self.edges[e].wind_delta = 0;
            result = self.process_bound(e, next_is_forward);
            self.minima.push(LocalMinimum {
                y,
                left_bound: None,
                right_bound: Some(e),
            });
            return result;
        }

        if self.is_horizontal(e) {
            // Consecutive horizontals may start heading away from the bound.
            let start = if next_is_forward {
                self.edges[e].prev
            } else {
                self.edges[e].next
            };
            let bot_x = self.edges[e].bot.x;
            if self.is_horizontal(start) {
                if self.edges[start].bot.x != bot_x && self.edges[start].top.x != bot_x {
                    self.reverse_horizontal(e);
                }
            } else if self.edges[start].bot.x != bot_x {
                self.reverse_horizontal(e);
            }
        }

        let e_start = e;
        if next_is_forward {
            loop {
                let next = self.edges[result].next;
                if self.edges[result].top.y != self.edges[next].bot.y || self.edges[next].skip {
                    break;
                }
                result = next;
            }
            let next = self.edges[result].next;
            if self.is_horizontal(result) && !self.edges[next].skip {
                // Top horizontals join the bound only from their left end.
                let mut horz = result;
                while self.is_horizontal(self.edges[horz].prev) {
                    horz = self.edges[horz].prev;
                }
                let horz_prev = self.edges[horz].prev;
                if self.edges[horz_prev].top.x > self.edges[next].top.x {
                    result = horz_prev;
                }
            }
            while e != result {
                let next = self.edges[e].next;
                self.edges[e].next_in_lml = Some(next);
                self.fix_bound_horizontal(e, e_start, self.edges[e].prev);
                e = next;
            }
            self.fix_bound_horizontal(e, e_start, self.edges[e].prev);
            self.edges[result].next
        } else {
            loop {
                let prev = self.edges[result].prev;
                if self.edges[result].top.y != self.edges[prev].bot.y || self.edges[prev].skip {
                    break;
                }
                result = prev;
            }
            let prev = self.edges[result].prev;
            if self.is_horizontal(result) && !self.edges[prev].skip {
                let mut horz = result;
                while self.is_horizontal(self.edges[horz].next) {
                    horz = self.edges[horz].next;
                }
                let horz_next = self.edges[horz].next;
                if self.edges[horz_next].top.x >= self.edges[prev].top.x {
                    result = horz_next;
                }
            }
            while e != result {
                let prev = self.edges[e].prev;
                self.edges[e].next_in_lml = Some(prev);
                self.fix_bound_horizontal(e, e_start, self.edges[e].next);
                e = prev;
            }
            self.fix_bound_horizontal(e, e_start, self.edges[e].next);
            self.edges[result].prev
        }
    }

    /// Reverses a horizontal inside a bound that does not continue from the
    /// previous edge's top.
    fn fix_bound_horizontal(&mut self, e: EdgeId, e_start: EdgeId, behind: EdgeId) {
        if self.is_horizontal(e) && e != e_start && self.edges[e].bot.x != self.edges[behind].top.x {
            self.reverse_horizontal(e);
        }
    }

    /// Sorts minima for the sweep (largest Y first) and rewinds every bound.
    pub fn reset(&mut self) {
        self.minima.sort_by(|a, b| b.y.cmp(&a.y));
        for lm in &self.minima {
            for (bound, side) in [
                (lm.left_bound, EdgeSide::Left),
                (lm.right_bound, EdgeSide::Right),
            ] {
                if let Some(id) = bound {
                    let edge = &mut self.edges[id];
                    edge.curr = edge.bot;
                    edge.side = side;
                    edge.out_idx = None;
                }
            }
        }
    }

    /// Bounding rectangle of every vertex in the table.
    pub fn bounds(&self) -> Option<IntRect> {
        let mut points = self.edges.values().flat_map(|e| [e.bot, e.top]);
        let first = points.next()?;
        let mut rect = IntRect {
            left: first.x,
            top: first.y,
            right: first.x,
            bottom: first.y,
        };
        for pt in points {
            rect.left = rect.left.min(pt.x);
            rect.right = rect.right.max(pt.x);
            rect.top = rect.top.min(pt.y);
            rect.bottom = rect.bottom.max(pt.y);
        }
        Some(rect)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ClipError;
    use crate::math::path_from;

    #[test]
    fn square_has_one_minimum() {
        let mut table = EdgeTable::default();
        let added = table
            .add_path(
                &path_from(&[(0, 0), (10, 0), (10, 10), (0, 10)]),
                PolyType::Subject,
                true,
                false,
            )
            .unwrap();
        assert!(added);
        assert_eq!(table.edges.len(), 4);
        assert_eq!(table.minima.len(), 1);
        assert_eq!(table.minima[0].y, 10);
    }

    #[test]
    fn colinear_and_duplicate_vertices_are_dropped() {
        let mut table = EdgeTable::default();
        let path = path_from(&[(0, 0), (5, 0), (10, 0), (10, 0), (10, 10), (0, 10), (0, 0)]);
        assert!(table.add_path(&path, PolyType::Subject, true, false).unwrap());
        assert_eq!(table.edges.len(), 4);
        // The caller's buffer is untouched.
        assert_eq!(path.len(), 7);
    }

    #[test]
    fn preserve_collinear_keeps_middle_vertex() {
        let mut table = EdgeTable::default();
        let path = path_from(&[(0, 0), (5, 0), (10, 0), (10, 10), (0, 10)]);
        assert!(table.add_path(&path, PolyType::Subject, true, true).unwrap());
        assert_eq!(table.edges.len(), 5);
    }

    #[test]
    fn degenerate_paths_are_rejected_silently() {
        let mut table = EdgeTable::default();
        assert!(!table
            .add_path(&path_from(&[(0, 0), (10, 10)]), PolyType::Subject, true, false)
            .unwrap());
        assert!(!table
            .add_path(&path_from(&[(0, 0), (5, 5), (10, 10)]), PolyType::Subject, true, false)
            .unwrap());
        assert!(!table
            .add_path(&path_from(&[(0, 0), (5, 0), (9, 0)]), PolyType::Clip, true, false)
            .unwrap());
        assert!(table.edges.is_empty());
        assert!(table.minima.is_empty());
    }

    #[test]
    fn open_path_minima() {
        let mut table = EdgeTable::default();
        assert!(table
            .add_path(&path_from(&[(0, 0), (5, 10), (10, 0)]), PolyType::Subject, false, false)
            .unwrap());
        assert!(table.has_open_paths);
        assert_eq!(table.minima.len(), 1);
        assert_eq!(table.minima[0].y, 10);
    }

    #[test]
    fn flat_open_path_is_one_right_bound() {
        let mut table = EdgeTable::default();
        assert!(table
            .add_path(&path_from(&[(0, 5), (10, 5), (20, 5)]), PolyType::Subject, false, false)
            .unwrap());
        assert_eq!(table.minima.len(), 1);
        assert!(table.minima[0].left_bound.is_none());
        assert!(table.minima[0].right_bound.is_some());
    }

    #[test]
    fn open_clip_paths_are_refused() {
        let mut table = EdgeTable::default();
        let err = table
            .add_path(&path_from(&[(0, 0), (5, 5)]), PolyType::Clip, false, false)
            .unwrap_err();
        assert!(matches!(err, ClipError::Input(InputError::OpenClipPath)));
    }

    #[test]
    fn range_switch_and_overflow() {
        let mut table = EdgeTable::default();
        let big = LO_RANGE + 1;
        assert!(table
            .add_path(&path_from(&[(0, 0), (big, 0), (big, big)]), PolyType::Subject, true, false)
            .unwrap());
        assert!(table.use_full_range);

        let too_big = path_from(&[(0, 0), (i64::MAX, 0), (0, 10)]);
        let edges_before = table.edges.len();
        let err = table
            .add_path(&too_big, PolyType::Subject, true, false)
            .unwrap_err();
        assert!(matches!(
            err,
            ClipError::Input(InputError::CoordinateOutOfRange { .. })
        ));
        assert_eq!(table.edges.len(), edges_before);
    }

    #[test]
    fn reset_orders_minima_from_the_bottom() {
        let mut table = EdgeTable::default();
        table
            .add_path(&path_from(&[(0, 0), (10, 0), (10, 10), (0, 10)]), PolyType::Subject, true, false)
            .unwrap();
        table
            .add_path(&path_from(&[(0, 20), (10, 20), (10, 30), (0, 30)]), PolyType::Clip, true, false)
            .unwrap();
        table.reset();
        let ys: Vec<i64> = table.minima.iter().map(|lm| lm.y).collect();
        assert_eq!(ys, vec![30, 10]);
        let rect = table.bounds().unwrap();
        assert_eq!(rect, IntRect { left: 0, top: 0, right: 10, bottom: 30 });
    }
}
