use crate::math::polygon_2d::{point_in_ring, slopes_equal3};
use crate::math::IntPoint;

use super::output::{OutPt, OutPtId};
use super::sweep::Sweep;

/// Two output vertices lying on coincident edges, to be merged once the
/// sweep is done. Ghost joins only carry `out_pt1`: they stand for a
/// horizontal that later minima may still overlap.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Join {
    pub out_pt1: OutPtId,
    pub out_pt2: Option<OutPtId>,
    pub off_pt: IntPoint,
}

/// Overlap of the X ranges `a1..a2` and `b1..b2`, if it has positive length.
fn get_overlap(a1: i64, a2: i64, b1: i64, b2: i64) -> Option<(i64, i64)> {
    let (a_lo, a_hi) = (a1.min(a2), a1.max(a2));
    let (b_lo, b_hi) = (b1.min(b2), b1.max(b2));
    let (left, right) = (a_lo.max(b_lo), a_hi.min(b_hi));
    (left < right).then_some((left, right))
}

impl Sweep<'_> {
    pub(super) fn add_join(&mut self, op1: OutPtId, op2: OutPtId, off_pt: IntPoint) {
        self.joins.push(Join {
            out_pt1: op1,
            out_pt2: Some(op2),
            off_pt,
        });
    }

    pub(super) fn add_ghost_join(&mut self, op: OutPtId, off_pt: IntPoint) {
        self.ghost_joins.push(Join {
            out_pt1: op,
            out_pt2: None,
            off_pt,
        });
    }

    /// The record that finally owns what record `idx` was merged into.
    fn get_out_rec(&self, mut idx: usize) -> usize {
        while self.out_recs[idx].idx != idx {
            idx = self.out_recs[idx].idx;
        }
        idx
    }

    /// First record of the `first_left` chain that still has points.
    fn parse_first_left(&self, mut first_left: Option<usize>) -> Option<usize> {
        while let Some(idx) = first_left {
            if self.out_recs[idx].pts.is_some() {
                break;
            }
            first_left = self.out_recs[idx].first_left;
        }
        first_left
    }

    /// Inserts a copy of `op` after or before it.
    fn dup_out_pt(&mut self, op: OutPtId, insert_after: bool) -> OutPtId {
        let OutPt { idx, pt, next, prev } = self.out_pts[op];
        let (before, after) = if insert_after { (op, next) } else { (prev, op) };
        let dup = self.out_pts.insert(OutPt {
            idx,
            pt,
            next: after,
            prev: before,
        });
        self.link(before, dup);
        self.link(dup, after);
        dup
    }

    /// Whether every vertex of ring `inner` that is not on ring `outer`
    /// lies inside it.
    pub(super) fn poly2_contains_poly1(&self, inner: OutPtId, outer: OutPtId) -> bool {
        for pt in self.ring_points(inner) {
            let res = point_in_ring(pt, self.ring_points(outer));
            if res >= 0 {
                return res > 0;
            }
        }
        true
    }

    fn update_out_pt_idxs(&mut self, idx: usize) {
        let Some(pts) = self.out_recs[idx].pts else {
            return;
        };
        let ids: Vec<OutPtId> = self.ring_ids(pts).collect();
        for id in ids {
            self.out_pts[id].idx = idx;
        }
    }

    /// Cuts the rings at `op1` and `op2` and cross-links them, duplicating
    /// both vertices. Returns the duplicate of `op1`.
    fn splice_at(&mut self, op1: OutPtId, op2: OutPtId, reverse: bool) -> OutPtId {
        let op1b = self.dup_out_pt(op1, !reverse);
        let op2b = self.dup_out_pt(op2, reverse);
        if reverse {
            self.link(op2, op1);
            self.link(op1b, op2b);
        } else {
            self.link(op1, op2);
            self.link(op2b, op1b);
        }
        op1b
    }

    /// Moves `op` along its horizontal to `pt` and splits it there.
    fn horz_join_end(&mut self, mut op: OutPtId, left_to_right: bool, pt: IntPoint, discard_left: bool) -> (OutPtId, OutPtId) {
        loop {
            let next = self.out_pts[self.out_pts[op].next].pt;
            let cur = self.out_pts[op].pt;
            let advances = if left_to_right {
                next.x <= pt.x && next.x >= cur.x
            } else {
                next.x >= pt.x && next.x <= cur.x
            };
            if !advances || next.y != pt.y {
                break;
            }
            op = self.out_pts[op].next;
        }
        if left_to_right == discard_left && self.out_pts[op].pt.x != pt.x {
            op = self.out_pts[op].next;
        }
        let insert_after = left_to_right != discard_left;
        let mut opb = self.dup_out_pt(op, insert_after);
        if self.out_pts[opb].pt != pt {
            op = opb;
            self.out_pts[op].pt = pt;
            opb = self.dup_out_pt(op, insert_after);
        }
        (op, opb)
    }

    #[allow(clippy::similar_names)]
    fn join_horz(&mut self, ends1: (OutPtId, OutPtId), ends2: (OutPtId, OutPtId), pt: IntPoint, discard_left: bool) -> bool {
        let ltr1 = self.out_pts[ends1.0].pt.x <= self.out_pts[ends1.1].pt.x;
        let ltr2 = self.out_pts[ends2.0].pt.x <= self.out_pts[ends2.1].pt.x;
        if ltr1 == ltr2 {
            return false;
        }
        let (op1, op1b) = self.horz_join_end(ends1.0, ltr1, pt, discard_left);
        let (op2, op2b) = self.horz_join_end(ends2.0, ltr2, pt, discard_left);
        if ltr1 == discard_left {
            self.link(op2, op1);
            self.link(op1b, op2b);
        } else {
            self.link(op1, op2);
            self.link(op2b, op1b);
        }
        true
    }

    /// Merges (or splits) the rings at a join. On success the join's two
    /// points are left on the two resulting rings.
    #[allow(clippy::similar_names)]
    fn join_points(&mut self, join: &mut Join, rec1: usize, rec2: usize) -> bool {
        let Some(mut op2) = join.out_pt2 else {
            return false;
        };
        let mut op1 = join.out_pt1;
        let off_pt = join.off_pt;
        let is_horizontal = self.out_pts[op1].pt.y == off_pt.y;

        if is_horizontal && off_pt == self.out_pts[op1].pt && off_pt == self.out_pts[op2].pt {
            // Edges touching at a single vertex.
            if rec1 != rec2 {
                return false;
            }
            let heads_down = |sweep: &Self, op: OutPtId| {
                let mut b = sweep.out_pts[op].next;
                while b != op && sweep.out_pts[b].pt == off_pt {
                    b = sweep.out_pts[b].next;
                }
                sweep.out_pts[b].pt.y > off_pt.y
            };
            let reverse1 = heads_down(self, op1);
            if reverse1 == heads_down(self, op2) {
                return false;
            }
            let op1b = self.splice_at(op1, op2, reverse1);
            join.out_pt2 = Some(op1b);
            return true;
        }

        if is_horizontal {
            // The joined points may sit anywhere along coincident horizontals;
            // find both horizontals' extents first.
            let mut op1b = op1;
            while self.out_pts[self.out_pts[op1].prev].pt.y == self.out_pts[op1].pt.y
                && self.out_pts[op1].prev != op1b
                && self.out_pts[op1].prev != op2
            {
                op1 = self.out_pts[op1].prev;
            }
            while self.out_pts[self.out_pts[op1b].next].pt.y == self.out_pts[op1b].pt.y
                && self.out_pts[op1b].next != op1
                && self.out_pts[op1b].next != op2
            {
                op1b = self.out_pts[op1b].next;
            }
            if self.out_pts[op1b].next == op1 || self.out_pts[op1b].next == op2 {
                return false;
            }

            let mut op2b = op2;
            while self.out_pts[self.out_pts[op2].prev].pt.y == self.out_pts[op2].pt.y
                && self.out_pts[op2].prev != op2b
                && self.out_pts[op2].prev != op1b
            {
                op2 = self.out_pts[op2].prev;
            }
            while self.out_pts[self.out_pts[op2b].next].pt.y == self.out_pts[op2b].pt.y
                && self.out_pts[op2b].next != op2
                && self.out_pts[op2b].next != op1
            {
                op2b = self.out_pts[op2b].next;
            }
            if self.out_pts[op2b].next == op2 || self.out_pts[op2b].next == op1 {
                return false;
            }

            let (p1, p1b) = (self.out_pts[op1].pt, self.out_pts[op1b].pt);
            let (p2, p2b) = (self.out_pts[op2].pt, self.out_pts[op2b].pt);
            let Some((left, right)) = get_overlap(p1.x, p1b.x, p2.x, p2b.x) else {
                return false;
            };

            // The spike left by the join is discarded on the side away from
            // op1 and op2, which later joins may still need.
            let within = |x: i64| x >= left && x <= right;
            let (pt, discard_left) = if within(p1.x) {
                (p1, p1.x > p1b.x)
            } else if within(p2.x) {
                (p2, p2.x > p2b.x)
            } else if within(p1b.x) {
                (p1b, p1b.x > p1.x)
            } else {
                (p2b, p2b.x > p2.x)
            };
            join.out_pt1 = op1;
            join.out_pt2 = Some(op2);
            return self.join_horz((op1, op1b), (op2, op2b), pt, discard_left);
        }

        // Non-horizontal joins start at a shared bottom point and run up
        // towards off_pt; each ring is entered from whichever side heads
        // that way.
        let full_range = self.full_range;
        let along = |sweep: &Self, op: OutPtId, forward: bool| {
            let b = sweep.distinct_neighbour(op, forward);
            let (pt, bpt) = (sweep.out_pts[op].pt, sweep.out_pts[b].pt);
            let ok = bpt.y <= pt.y && slopes_equal3(pt, bpt, off_pt, full_range);
            (b, ok)
        };
        let side = |sweep: &Self, op: OutPtId| match along(sweep, op, true) {
            (b, true) => Some((b, false)),
            _ => match along(sweep, op, false) {
                (b, true) => Some((b, true)),
                _ => None,
            },
        };
        let (Some((op1b, reverse1)), Some((op2b, reverse2))) = (side(self, op1), side(self, op2)) else {
            return false;
        };
        if op1b == op1 || op2b == op2 || op1b == op2b || (rec1 == rec2 && reverse1 == reverse2) {
            return false;
        }
        let op1b = self.splice_at(op1, op2, reverse1);
        join.out_pt1 = op1;
        join.out_pt2 = Some(op1b);
        true
    }

    /// Re-parents records whose owner was split into `old` and `new`,
    /// moving those that now lie inside `new`.
    fn fixup_first_lefts1(&mut self, old: usize, new: usize) {
        let Some(new_pts) = self.out_recs[new].pts else {
            return;
        };
        for idx in 0..self.out_recs.len() {
            let Some(pts) = self.out_recs[idx].pts else {
                continue;
            };
            if self.parse_first_left(self.out_recs[idx].first_left) == Some(old)
                && self.poly2_contains_poly1(pts, new_pts)
            {
                self.out_recs[idx].first_left = Some(new);
            }
        }
    }

    /// Re-parents records after a ring split into `inner` nested in `outer`.
    fn fixup_first_lefts2(&mut self, inner: usize, outer: usize) {
        let (Some(inner_pts), Some(outer_pts)) = (self.out_recs[inner].pts, self.out_recs[outer].pts) else {
            return;
        };
        let orfl = self.out_recs[outer].first_left;
        for idx in 0..self.out_recs.len() {
            let Some(pts) = self.out_recs[idx].pts else {
                continue;
            };
            if idx == outer || idx == inner {
                continue;
            }
            let first_left = self.parse_first_left(self.out_recs[idx].first_left);
            if first_left != orfl && first_left != Some(inner) && first_left != Some(outer) {
                continue;
            }
            if self.poly2_contains_poly1(pts, inner_pts) {
                self.out_recs[idx].first_left = Some(inner);
            } else if self.poly2_contains_poly1(pts, outer_pts) {
                self.out_recs[idx].first_left = Some(outer);
            } else if matches!(self.out_recs[idx].first_left, Some(fl) if fl == inner || fl == outer) {
                self.out_recs[idx].first_left = orfl;
            }
        }
    }

    /// Re-parents every record owned by `old` to `new` without testing.
    fn fixup_first_lefts3(&mut self, old: usize, new: usize) {
        for idx in 0..self.out_recs.len() {
            if self.out_recs[idx].pts.is_some()
                && self.parse_first_left(self.out_recs[idx].first_left) == Some(old)
            {
                self.out_recs[idx].first_left = Some(new);
            }
        }
    }

    /// Resolves every recorded join, merging rings that share an edge and
    /// splitting rings that touch themselves.
    pub(super) fn join_common_edges(&mut self) {
        let using_tree = self.config.using_tree;
        let reverse_output = self.config.reverse_output;
        for i in 0..self.joins.len() {
            let mut join = self.joins[i];
            let Some(op2) = join.out_pt2 else {
                continue;
            };
            let rec1 = self.get_out_rec(self.out_pts[join.out_pt1].idx);
            let mut rec2 = self.get_out_rec(self.out_pts[op2].idx);
            let (r1, r2) = (&self.out_recs[rec1], &self.out_recs[rec2]);
            if r1.pts.is_none() || r2.pts.is_none() || r1.is_open || r2.is_open {
                continue;
            }

            // The fragment whose hole state survives the merge.
            let hole_state_rec = if rec1 == rec2 {
                rec1
            } else if self.out_rec1_right_of_out_rec2(rec1, rec2) {
                rec2
            } else if self.out_rec1_right_of_out_rec2(rec2, rec1) {
                rec1
            } else {
                self.get_lowermost_rec(rec1, rec2)
            };

            if !self.join_points(&mut join, rec1, rec2) {
                continue;
            }
            let Some(op2) = join.out_pt2 else {
                continue;
            };

            if rec1 == rec2 {
                // One ring was split in two.
                self.out_recs[rec1].pts = Some(join.out_pt1);
                self.out_recs[rec1].bottom_pt = None;
                rec2 = self.create_out_rec();
                self.out_recs[rec2].pts = Some(op2);
                self.update_out_pt_idxs(rec2);

                if self.poly2_contains_poly1(op2, join.out_pt1) {
                    let is_hole = !self.out_recs[rec1].is_hole;
                    self.out_recs[rec2].is_hole = is_hole;
                    self.out_recs[rec2].first_left = Some(rec1);
                    if using_tree {
                        self.fixup_first_lefts2(rec2, rec1);
                    }
                    if (is_hole ^ reverse_output) == (self.ring_area(op2) > 0.0) {
                        self.reverse_links(op2);
                    }
                } else if self.poly2_contains_poly1(join.out_pt1, op2) {
                    let is_hole = self.out_recs[rec1].is_hole;
                    self.out_recs[rec2].is_hole = is_hole;
                    self.out_recs[rec1].is_hole = !is_hole;
                    self.out_recs[rec2].first_left = self.out_recs[rec1].first_left;
                    self.out_recs[rec1].first_left = Some(rec2);
                    if using_tree {
                        self.fixup_first_lefts2(rec1, rec2);
                    }
                    if (!is_hole ^ reverse_output) == (self.ring_area(join.out_pt1) > 0.0) {
                        self.reverse_links(join.out_pt1);
                    }
                } else {
                    self.out_recs[rec2].is_hole = self.out_recs[rec1].is_hole;
                    self.out_recs[rec2].first_left = self.out_recs[rec1].first_left;
                    if using_tree {
                        self.fixup_first_lefts1(rec1, rec2);
                    }
                }
            } else {
                // Two rings became one.
                let (is_hole, hole_first_left) = {
                    let hs = &self.out_recs[hole_state_rec];
                    (hs.is_hole, hs.first_left)
                };
                let survivor_idx = self.out_recs[rec1].idx;
                let merged = &mut self.out_recs[rec2];
                merged.pts = None;
                merged.bottom_pt = None;
                merged.idx = survivor_idx;

                self.out_recs[rec1].is_hole = is_hole;
                if hole_state_rec == rec2 {
                    self.out_recs[rec1].first_left = hole_first_left;
                }
                self.out_recs[rec2].first_left = Some(rec1);
                if using_tree {
                    self.fixup_first_lefts3(rec2, rec1);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clipper::local_minima::EdgeTable;
    use crate::clipper::sweep::SweepConfig;
    use crate::clipper::{ClipType, PolyFillType};

    #[test]
    fn overlap_of_ranges() {
        assert_eq!(get_overlap(0, 10, 5, 20), Some((5, 10)));
        assert_eq!(get_overlap(10, 0, 20, 5), Some((5, 10)));
        assert_eq!(get_overlap(0, 5, 5, 10), None);
        assert_eq!(get_overlap(0, 5, 6, 10), None);
    }

    fn config() -> SweepConfig {
        SweepConfig {
            clip_type: ClipType::Union,
            subj_fill: PolyFillType::EvenOdd,
            clip_fill: PolyFillType::EvenOdd,
            preserve_collinear: false,
            reverse_output: false,
            using_tree: false,
        }
    }

    fn ring(sweep: &mut Sweep<'_>, coords: &[(i64, i64)]) -> OutPtId {
        let idx = sweep.create_out_rec();
        let ids: Vec<OutPtId> = coords
            .iter()
            .map(|&(x, y)| {
                sweep.out_pts.insert_with_key(|id| OutPt {
                    idx,
                    pt: IntPoint::new(x, y),
                    next: id,
                    prev: id,
                })
            })
            .collect();
        for i in 0..ids.len() {
            sweep.link(ids[i], ids[(i + 1) % ids.len()]);
        }
        sweep.out_recs[idx].pts = Some(ids[0]);
        ids[0]
    }

    #[test]
    fn duplicated_vertex_is_linked_in_place() {
        let mut table = EdgeTable::default();
        let mut sweep = Sweep::new(&mut table, None, config());
        let start = ring(&mut sweep, &[(0, 0), (10, 0), (10, 10)]);
        let dup = sweep.dup_out_pt(start, true);
        assert_eq!(sweep.out_pts[start].next, dup);
        assert_eq!(sweep.out_pts[dup].pt, IntPoint::new(0, 0));
        assert_eq!(sweep.ring_ids(start).count(), 4);
        let before = sweep.dup_out_pt(start, false);
        assert_eq!(sweep.out_pts[start].prev, before);
        assert_eq!(sweep.ring_ids(start).count(), 5);
    }

    #[test]
    fn containment_of_rings() {
        let mut table = EdgeTable::default();
        let mut sweep = Sweep::new(&mut table, None, config());
        let outer = ring(&mut sweep, &[(0, 0), (20, 0), (20, 20), (0, 20)]);
        let inner = ring(&mut sweep, &[(5, 5), (15, 5), (15, 15), (5, 15)]);
        let apart = ring(&mut sweep, &[(30, 0), (40, 0), (40, 10)]);
        assert!(sweep.poly2_contains_poly1(inner, outer));
        assert!(!sweep.poly2_contains_poly1(outer, inner));
        assert!(!sweep.poly2_contains_poly1(apart, outer));
    }

    #[test]
    fn merged_records_resolve_to_their_survivor() {
        let mut table = EdgeTable::default();
        let mut sweep = Sweep::new(&mut table, None, config());
        ring(&mut sweep, &[(0, 0), (1, 0), (1, 1)]);
        ring(&mut sweep, &[(0, 0), (1, 0), (1, 1)]);
        ring(&mut sweep, &[(0, 0), (1, 0), (1, 1)]);
        sweep.out_recs[2].idx = 1;
        sweep.out_recs[1].idx = 0;
        assert_eq!(sweep.get_out_rec(2), 0);
        sweep.out_recs[1].pts = None;
        sweep.out_recs[2].first_left = Some(1);
        sweep.out_recs[1].first_left = Some(0);
        assert_eq!(sweep.parse_first_left(Some(1)), Some(0));
    }
}
