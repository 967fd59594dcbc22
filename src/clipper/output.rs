use crate::error::{InvariantError, Result};
use crate::math::polygon_2d::{pt2_is_between_pt1_and_pt3, slopes_equal3, slopes_equal4};
use crate::math::{IntPoint, Path, Paths};

use super::edge::{EdgeId, EdgeSide, HORIZONTAL};
use super::sweep::Sweep;
use super::tree::{PolyNodeId, PolyTree};

slotmap::new_key_type! {
    /// Identifier of an output vertex.
    pub(crate) struct OutPtId;
}

/// Vertex of an output ring. `idx` names the owning [`OutRec`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct OutPt {
    pub idx: usize,
    pub pt: IntPoint,
    pub next: OutPtId,
    pub prev: OutPtId,
}

/// One output contour under construction.
///
/// `pts` is the left-most vertex while the contour is open in the AEL, and
/// `None` once it has been merged into another record. Merged records keep
/// pointing at their survivor through `idx` and `first_left`.
#[derive(Debug, Clone)]
pub(crate) struct OutRec {
    pub idx: usize,
    pub is_hole: bool,
    pub is_open: bool,
    /// Nearest record known to enclose this one.
    pub first_left: Option<usize>,
    pub pts: Option<OutPtId>,
    pub bottom_pt: Option<OutPtId>,
    pub poly_node: Option<PolyNodeId>,
}

#[allow(clippy::cast_precision_loss)]
fn get_dx(pt1: IntPoint, pt2: IntPoint) -> f64 {
    if pt1.y == pt2.y {
        HORIZONTAL
    } else {
        (pt2.x - pt1.x) as f64 / (pt2.y - pt1.y) as f64
    }
}

impl Sweep<'_> {
    pub(super) fn create_out_rec(&mut self) -> usize {
        let idx = self.out_recs.len();
        self.out_recs.push(OutRec {
            idx,
            is_hole: false,
            is_open: false,
            first_left: None,
            pts: None,
            bottom_pt: None,
            poly_node: None,
        });
        idx
    }

    /// Links `a` directly before `b`.
    pub(super) fn link(&mut self, a: OutPtId, b: OutPtId) {
        self.out_pts[a].next = b;
        self.out_pts[b].prev = a;
    }

    fn new_ring(&mut self, idx: usize, pt: IntPoint) -> OutPtId {
        self.out_pts.insert_with_key(|id| OutPt {
            idx,
            pt,
            next: id,
            prev: id,
        })
    }

    /// Adds `pt` to the edge's contour, at the front for left-side edges and
    /// at the back for right-side ones. Starts a new contour when the edge
    /// has none.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError::DetachedOutRec`] when the edge still points
    /// at a record whose ring was merged away.
    pub(super) fn add_out_pt(&mut self, e: EdgeId, pt: IntPoint) -> Result<OutPtId> {
        let Some(idx) = self.edges[e].out_idx else {
            let idx = self.create_out_rec();
            let is_open = self.edges[e].wind_delta == 0;
            let op = self.new_ring(idx, pt);
            let rec = &mut self.out_recs[idx];
            rec.is_open = is_open;
            rec.pts = Some(op);
            if !is_open {
                self.set_hole_state(e, idx);
            }
            self.edges[e].out_idx = Some(idx);
            return Ok(op);
        };
        let Some(op) = self.out_recs[idx].pts else {
            return Err(InvariantError::DetachedOutRec.into());
        };

        let to_front = self.edges[e].side == EdgeSide::Left;
        let back = self.out_pts[op].prev;
        if to_front && pt == self.out_pts[op].pt {
            return Ok(op);
        }
        if !to_front && pt == self.out_pts[back].pt {
            return Ok(back);
        }
        let new_op = self.out_pts.insert(OutPt {
            idx,
            pt,
            next: op,
            prev: back,
        });
        self.out_pts[back].next = new_op;
        self.out_pts[op].prev = new_op;
        if to_front {
            self.out_recs[idx].pts = Some(new_op);
        }
        Ok(new_op)
    }

    /// The vertex most recently added by this edge.
    pub(super) fn last_out_pt(&self, e: EdgeId) -> Option<OutPtId> {
        let pts = self.out_recs[self.edges[e].out_idx?].pts?;
        Some(match self.edges[e].side {
            EdgeSide::Left => pts,
            EdgeSide::Right => self.out_pts[pts].prev,
        })
    }

    /// A new contour is a hole when an odd number of other contours are
    /// open to its left.
    fn set_hole_state(&mut self, e: EdgeId, idx: usize) {
        let mut owner: Option<EdgeId> = None;
        let mut e2 = self.edges[e].ael.prev;
        while let Some(id) = e2 {
            let edge = &self.edges[id];
            if edge.out_idx.is_some() && edge.wind_delta != 0 {
                owner = match owner {
                    None => Some(id),
                    Some(t) if self.edges[t].out_idx == edge.out_idx => None,
                    keep => keep,
                };
            }
            e2 = edge.ael.prev;
        }
        match owner.and_then(|t| self.edges[t].out_idx) {
            None => {
                let rec = &mut self.out_recs[idx];
                rec.first_left = None;
                rec.is_hole = false;
            }
            Some(first_left) => {
                let is_hole = !self.out_recs[first_left].is_hole;
                let rec = &mut self.out_recs[idx];
                rec.first_left = Some(first_left);
                rec.is_hole = is_hole;
            }
        }
    }

    /// Opens a contour where two bounds meet at a local minimum.
    pub(super) fn add_local_min_poly(&mut self, e1: EdgeId, e2: EdgeId, pt: IntPoint) -> Result<OutPtId> {
        let (first, second) = if self.edges[e2].is_horizontal() || self.edges[e1].dx > self.edges[e2].dx {
            (e1, e2)
        } else {
            (e2, e1)
        };
        let result = self.add_out_pt(first, pt)?;
        self.edges[second].out_idx = self.edges[first].out_idx;
        self.edges[first].side = EdgeSide::Left;
        self.edges[second].side = EdgeSide::Right;

        let e = first;
        let prev = self.edges[e].ael.prev;
        let prev_e = if prev == Some(second) {
            self.edges[second].ael.prev
        } else {
            prev
        };

        if let Some(prev_e) = prev_e {
            let (pe, ee) = (&self.edges[prev_e], &self.edges[e]);
            if pe.out_idx.is_some() && pe.top.y < pt.y && ee.top.y < pt.y {
                let x_prev = pe.top_x(pt.y);
                let x_e = ee.top_x(pt.y);
                if x_prev == x_e
                    && ee.wind_delta != 0
                    && pe.wind_delta != 0
                    && slopes_equal4(
                        IntPoint::new(x_prev, pt.y),
                        pe.top,
                        IntPoint::new(x_e, pt.y),
                        ee.top,
                        self.full_range,
                    )
                {
                    let off_pt = ee.top;
                    let out_pt = self.add_out_pt(prev_e, pt)?;
                    self.add_join(result, out_pt, off_pt);
                }
            }
        }
        Ok(result)
    }

    /// Closes the contour(s) of two bounds meeting at a local maximum.
    pub(super) fn add_local_max_poly(&mut self, e1: EdgeId, e2: EdgeId, pt: IntPoint) -> Result<()> {
        self.add_out_pt(e1, pt)?;
        if self.edges[e2].wind_delta == 0 {
            self.add_out_pt(e2, pt)?;
        }
        let (o1, o2) = (self.edges[e1].out_idx, self.edges[e2].out_idx);
        if o1 == o2 {
            self.edges[e1].out_idx = None;
            self.edges[e2].out_idx = None;
        } else if o1 < o2 {
            self.append_polygon(e1, e2);
        } else {
            self.append_polygon(e2, e1);
        }
        Ok(())
    }

    /// Whether `rec2` is on the `first_left` chain of `rec1`.
    pub(super) fn out_rec1_right_of_out_rec2(&self, rec1: usize, rec2: usize) -> bool {
        let mut rec = self.out_recs[rec1].first_left;
        while let Some(idx) = rec {
            if idx == rec2 {
                return true;
            }
            rec = self.out_recs[idx].first_left;
        }
        false
    }

    /// Splices the contour of `e2` onto that of `e1`.
    fn append_polygon(&mut self, e1: EdgeId, e2: EdgeId) {
        let (Some(idx1), Some(idx2)) = (self.edges[e1].out_idx, self.edges[e2].out_idx) else {
            return;
        };
        let hole_state_rec = if self.out_rec1_right_of_out_rec2(idx1, idx2) {
            idx2
        } else if self.out_rec1_right_of_out_rec2(idx2, idx1) {
            idx1
        } else {
            self.get_lowermost_rec(idx1, idx2)
        };

        let (Some(p1_lft), Some(p2_lft)) = (self.out_recs[idx1].pts, self.out_recs[idx2].pts) else {
            return;
        };
        let p1_rt = self.out_pts[p1_lft].prev;
        let p2_rt = self.out_pts[p2_lft].prev;

        let side1 = self.edges[e1].side;
        match (side1, self.edges[e2].side) {
            (EdgeSide::Left, EdgeSide::Left) => {
                // z y x a b c
                self.reverse_links(p2_lft);
                self.link(p2_lft, p1_lft);
                self.link(p1_rt, p2_rt);
                self.out_recs[idx1].pts = Some(p2_rt);
            }
            (EdgeSide::Left, EdgeSide::Right) => {
                // x y z a b c
                self.link(p2_rt, p1_lft);
                self.link(p1_rt, p2_lft);
                self.out_recs[idx1].pts = Some(p2_lft);
            }
            (EdgeSide::Right, EdgeSide::Right) => {
                // a b c z y x
                self.reverse_links(p2_lft);
                self.link(p1_rt, p2_rt);
                self.link(p2_lft, p1_lft);
            }
            (EdgeSide::Right, EdgeSide::Left) => {
                // a b c x y z
                self.link(p1_rt, p2_lft);
                self.link(p2_rt, p1_lft);
            }
        }

        self.out_recs[idx1].bottom_pt = None;
        if hole_state_rec == idx2 {
            let (first_left, is_hole) = (self.out_recs[idx2].first_left, self.out_recs[idx2].is_hole);
            if first_left != Some(idx1) {
                self.out_recs[idx1].first_left = first_left;
            }
            self.out_recs[idx1].is_hole = is_hole;
        }
        let rec2 = &mut self.out_recs[idx2];
        rec2.pts = None;
        rec2.bottom_pt = None;
        rec2.first_left = Some(idx1);

        self.edges[e1].out_idx = None;
        self.edges[e2].out_idx = None;

        let mut e = self.active;
        while let Some(id) = e {
            let edge = &mut self.edges[id];
            if edge.out_idx == Some(idx2) {
                edge.out_idx = Some(idx1);
                edge.side = side1;
                break;
            }
            e = edge.ael.next;
        }
        self.out_recs[idx2].idx = self.out_recs[idx1].idx;
    }

    /// Of two contours, the one whose bottom vertex is lowest (then
    /// left-most); its hole state is the reliable one.
    pub(super) fn get_lowermost_rec(&mut self, idx1: usize, idx2: usize) -> usize {
        let (Some(bp1), Some(bp2)) = (self.bottom_pt(idx1), self.bottom_pt(idx2)) else {
            return idx1;
        };
        let (pt1, pt2) = (self.out_pts[bp1].pt, self.out_pts[bp2].pt);
        if pt1.y > pt2.y {
            idx1
        } else if pt1.y < pt2.y {
            idx2
        } else if pt1.x < pt2.x {
            idx1
        } else if pt1.x > pt2.x {
            idx2
        } else if self.out_pts[bp1].next == bp1 {
            idx2
        } else if self.out_pts[bp2].next == bp2 || self.first_is_bottom_pt(bp1, bp2) {
            idx1
        } else {
            idx2
        }
    }

    fn bottom_pt(&mut self, idx: usize) -> Option<OutPtId> {
        if self.out_recs[idx].bottom_pt.is_none() {
            let pts = self.out_recs[idx].pts?;
            self.out_recs[idx].bottom_pt = Some(self.get_bottom_pt(pts));
        }
        self.out_recs[idx].bottom_pt
    }

    fn get_bottom_pt(&self, mut pp: OutPtId) -> OutPtId {
        let mut dups = None;
        let mut p = self.out_pts[pp].next;
        while p != pp {
            let (cur, best) = (self.out_pts[p].pt, self.out_pts[pp].pt);
            if cur.y > best.y {
                pp = p;
                dups = None;
            } else if cur.y == best.y && cur.x <= best.x {
                if cur.x < best.x {
                    dups = None;
                    pp = p;
                } else if self.out_pts[p].next != pp && self.out_pts[p].prev != pp {
                    dups = Some(p);
                }
            }
            p = self.out_pts[p].next;
        }
        if let Some(mut dup) = dups {
            // Several vertices share the bottom point; pick the one whose
            // edges make the bottom-most corner.
            while dup != p {
                if !self.first_is_bottom_pt(p, dup) {
                    pp = dup;
                }
                dup = self.out_pts[dup].next;
                while self.out_pts[dup].pt != self.out_pts[pp].pt {
                    dup = self.out_pts[dup].next;
                }
            }
        }
        pp
    }

    /// Neighbour of `op` in the given direction that is at a different point.
    pub(super) fn distinct_neighbour(&self, op: OutPtId, forward: bool) -> OutPtId {
        let step = |id: OutPtId| {
            if forward {
                self.out_pts[id].next
            } else {
                self.out_pts[id].prev
            }
        };
        let mut p = step(op);
        while self.out_pts[p].pt == self.out_pts[op].pt && p != op {
            p = step(p);
        }
        p
    }

    #[allow(clippy::float_cmp)]
    fn first_is_bottom_pt(&self, btm1: OutPtId, btm2: OutPtId) -> bool {
        let slope = |btm: OutPtId, forward: bool| {
            let other = self.distinct_neighbour(btm, forward);
            get_dx(self.out_pts[btm].pt, self.out_pts[other].pt).abs()
        };
        let (dx1p, dx1n) = (slope(btm1, false), slope(btm1, true));
        let (dx2p, dx2n) = (slope(btm2, false), slope(btm2, true));
        if dx1p.max(dx1n) == dx2p.max(dx2n) && dx1p.min(dx1n) == dx2p.min(dx2n) {
            return self.ring_area(btm1) > 0.0;
        }
        (dx1p >= dx2p && dx1p >= dx2n) || (dx1n >= dx2p && dx1n >= dx2n)
    }

    /// Signed area of a ring, matching [`area`](crate::math::polygon_2d::area)
    /// of the path that [`Sweep::build_paths`] emits for it.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn ring_area(&self, start: OutPtId) -> f64 {
        let mut a = 0.0;
        let mut op = start;
        loop {
            let (pt, prev) = (self.out_pts[op].pt, self.out_pts[self.out_pts[op].prev].pt);
            a += (prev.x as f64 + pt.x as f64) * (prev.y as f64 - pt.y as f64);
            op = self.out_pts[op].next;
            if op == start {
                break;
            }
        }
        a * 0.5
    }

    pub(super) fn reverse_links(&mut self, start: OutPtId) {
        let mut p = start;
        loop {
            let op = &mut self.out_pts[p];
            let next = op.next;
            std::mem::swap(&mut op.next, &mut op.prev);
            p = next;
            if p == start {
                break;
            }
        }
    }

    /// Ids of a ring, following `next` from `start`.
    pub(super) fn ring_ids(&self, start: OutPtId) -> impl Iterator<Item = OutPtId> + '_ {
        std::iter::successors(Some(start), move |&op| {
            let next = self.out_pts[op].next;
            (next != start).then_some(next)
        })
    }

    /// Points of a ring, following `next` from `start`.
    pub(super) fn ring_points(&self, start: OutPtId) -> impl Iterator<Item = IntPoint> + '_ {
        self.ring_ids(start).map(|op| self.out_pts[op].pt)
    }

    fn dispose_ring(&mut self, start: OutPtId) {
        let ids: Vec<OutPtId> = self.ring_ids(start).collect();
        for id in ids {
            self.out_pts.remove(id);
        }
    }

    /// Removes duplicate vertices and, unless preserved, colinear ones.
    pub(super) fn fixup_out_polygon(&mut self, idx: usize) {
        self.out_recs[idx].bottom_pt = None;
        let Some(mut pp) = self.out_recs[idx].pts else {
            return;
        };
        let preserve = self.config.preserve_collinear;
        let mut last_ok = None;
        loop {
            let OutPt { prev, next, pt, .. } = self.out_pts[pp];
            if prev == pp || prev == next {
                self.dispose_ring(pp);
                self.out_recs[idx].pts = None;
                return;
            }
            let (prev_pt, next_pt) = (self.out_pts[prev].pt, self.out_pts[next].pt);
            if pt == next_pt
                || pt == prev_pt
                || (slopes_equal3(prev_pt, pt, next_pt, self.full_range)
                    && (!preserve || !pt2_is_between_pt1_and_pt3(prev_pt, pt, next_pt)))
            {
                last_ok = None;
                self.link(prev, next);
                self.out_pts.remove(pp);
                pp = prev;
            } else if Some(pp) == last_ok {
                break;
            } else {
                if last_ok.is_none() {
                    last_ok = Some(pp);
                }
                pp = next;
            }
        }
        self.out_recs[idx].pts = Some(pp);
    }

    /// Removes consecutive duplicate vertices of an open contour.
    pub(super) fn fixup_out_polyline(&mut self, idx: usize) {
        let Some(mut pp) = self.out_recs[idx].pts else {
            return;
        };
        let mut last_pp = self.out_pts[pp].prev;
        while pp != last_pp {
            pp = self.out_pts[pp].next;
            let prev = self.out_pts[pp].prev;
            if self.out_pts[pp].pt == self.out_pts[prev].pt {
                if pp == last_pp {
                    last_pp = prev;
                }
                let next = self.out_pts[pp].next;
                self.link(prev, next);
                self.out_pts.remove(pp);
                pp = prev;
            }
        }
        if pp == self.out_pts[pp].prev {
            self.dispose_ring(pp);
            self.out_recs[idx].pts = None;
        }
    }

    /// Path of a ring in output order, which follows `prev` from the vertex
    /// before `pts`.
    fn ring_path(&self, pts: OutPtId) -> Path {
        let mut path = Vec::new();
        let start = self.out_pts[pts].prev;
        let mut op = start;
        loop {
            path.push(self.out_pts[op].pt);
            op = self.out_pts[op].prev;
            if op == start {
                break;
            }
        }
        path
    }

    /// Flat list of every finished contour with at least two vertices.
    pub fn build_paths(&self) -> Paths {
        self.out_recs
            .iter()
            .filter_map(|rec| rec.pts)
            .map(|pts| self.ring_path(pts))
            .filter(|path| path.len() >= 2)
            .collect()
    }

    /// Re-points `first_left` of a record at the nearest enclosing record of
    /// opposite hole state that still has points.
    fn fix_hole_linkage(&mut self, idx: usize) {
        let rec = &self.out_recs[idx];
        let Some(first_left) = rec.first_left else {
            return;
        };
        let is_hole = rec.is_hole;
        let owner = &self.out_recs[first_left];
        if is_hole != owner.is_hole && owner.pts.is_some() {
            return;
        }
        let mut candidate = Some(first_left);
        while let Some(c) = candidate {
            let rec = &self.out_recs[c];
            if rec.is_hole != is_hole && rec.pts.is_some() {
                break;
            }
            candidate = rec.first_left;
        }
        self.out_recs[idx].first_left = candidate;
    }

    /// Nests the finished contours into a [`PolyTree`].
    pub fn build_tree(&mut self) -> PolyTree {
        let mut tree = PolyTree::default();
        for idx in 0..self.out_recs.len() {
            let Some(pts) = self.out_recs[idx].pts else {
                continue;
            };
            let is_open = self.out_recs[idx].is_open;
            let count = self.ring_ids(pts).count();
            if (is_open && count < 2) || (!is_open && count < 3) {
                continue;
            }
            self.fix_hole_linkage(idx);
            let node = tree.new_node(self.ring_path(pts), is_open);
            self.out_recs[idx].poly_node = Some(node);
        }
        for idx in 0..self.out_recs.len() {
            let rec = &self.out_recs[idx];
            let Some(node) = rec.poly_node else {
                continue;
            };
            let parent = if rec.is_open {
                None
            } else {
                rec.first_left.and_then(|fl| self.out_recs[fl].poly_node)
            };
            tree.add_child(parent, node);
        }
        tree
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clipper::local_minima::EdgeTable;
    use crate::clipper::sweep::SweepConfig;
    use crate::clipper::{ClipType, PolyFillType, PolyType};
    use crate::error::ClipError;
    use crate::math::path_from;
    use crate::math::polygon_2d::area;
    use approx::assert_relative_eq;

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

    /// Builds a record whose ring follows `next` through `coords`.
    fn ring(sweep: &mut Sweep<'_>, coords: &[(i64, i64)]) -> usize {
        let idx = sweep.create_out_rec();
        let ids: Vec<OutPtId> = coords
            .iter()
            .map(|&(x, y)| sweep.new_ring(idx, IntPoint::new(x, y)))
            .collect();
        for i in 0..ids.len() {
            sweep.link(ids[i], ids[(i + 1) % ids.len()]);
        }
        sweep.out_recs[idx].pts = Some(ids[0]);
        idx
    }

    #[test]
    fn ring_area_matches_emitted_path() {
        let mut table = EdgeTable::default();
        let mut sweep = Sweep::new(&mut table, None, config());
        let idx = ring(&mut sweep, &[(0, 0), (0, 10), (10, 10), (10, 0)]);
        let pts = sweep.out_recs[idx].pts.unwrap();
        let ring_area = sweep.ring_area(pts);
        let paths = sweep.build_paths();
        assert_eq!(paths.len(), 1);
        assert_relative_eq!(ring_area, area(&paths[0]));
        assert_relative_eq!(ring_area.abs(), 100.0);

        sweep.reverse_links(pts);
        assert_relative_eq!(sweep.ring_area(pts), -ring_area);
    }

    #[test]
    fn fixup_drops_duplicates_and_colinear_points() {
        let mut table = EdgeTable::default();
        let mut sweep = Sweep::new(&mut table, None, config());
        let idx = ring(
            &mut sweep,
            &[(0, 0), (5, 0), (10, 0), (10, 0), (10, 10), (0, 10)],
        );
        sweep.fixup_out_polygon(idx);
        let pts = sweep.out_recs[idx].pts.unwrap();
        assert_eq!(sweep.ring_points(pts).count(), 4);
        assert_eq!(sweep.out_pts.len(), 4);
    }

    #[test]
    fn fixup_discards_flat_rings() {
        let mut table = EdgeTable::default();
        let mut sweep = Sweep::new(&mut table, None, config());
        let idx = ring(&mut sweep, &[(0, 0), (5, 0), (10, 0)]);
        sweep.fixup_out_polygon(idx);
        assert!(sweep.out_recs[idx].pts.is_none());
        assert!(sweep.out_pts.is_empty());
    }

    #[test]
    fn polyline_fixup_keeps_colinear_points() {
        let mut table = EdgeTable::default();
        let mut sweep = Sweep::new(&mut table, None, config());
        let idx = ring(&mut sweep, &[(0, 0), (5, 0), (5, 0), (10, 0)]);
        sweep.out_recs[idx].is_open = true;
        sweep.fixup_out_polyline(idx);
        let pts = sweep.out_recs[idx].pts.unwrap();
        assert_eq!(sweep.ring_points(pts).count(), 3);
    }

    #[test]
    fn bottom_point_and_lowermost_record() {
        let mut table = EdgeTable::default();
        let mut sweep = Sweep::new(&mut table, None, config());
        let low = ring(&mut sweep, &[(0, 0), (0, 20), (10, 20), (10, 0)]);
        let high = ring(&mut sweep, &[(20, 0), (20, 10), (30, 10), (30, 0)]);
        let bottom = sweep.bottom_pt(low).unwrap();
        assert_eq!(sweep.out_pts[bottom].pt, IntPoint::new(0, 20));
        assert_eq!(sweep.get_lowermost_rec(low, high), low);
        assert_eq!(sweep.get_lowermost_rec(high, low), low);
    }

    #[test]
    fn adding_to_a_merged_record_is_an_error() {
        let mut table = EdgeTable::default();
        table
            .add_path(&path_from(&[(0, 0), (10, 0), (10, 10), (0, 10)]), PolyType::Subject, true, false)
            .unwrap();
        table.reset();
        let mut sweep = Sweep::new(&mut table, None, config());
        let e = sweep.edges.keys().next().unwrap();

        let first = sweep.add_out_pt(e, IntPoint::new(0, 10)).unwrap();
        let idx = sweep.edges[e].out_idx.unwrap();
        assert_eq!(sweep.out_recs[idx].pts, Some(first));
        sweep.add_out_pt(e, IntPoint::new(0, 0)).unwrap();
        assert_eq!(sweep.ring_points(first).count(), 2);

        sweep.out_recs[idx].pts = None;
        let err = sweep.add_out_pt(e, IntPoint::new(5, 0)).unwrap_err();
        assert!(matches!(err, ClipError::Invariant(InvariantError::DetachedOutRec)));
        assert_eq!(sweep.out_pts.len(), 2);
    }

    #[test]
    fn tree_nests_by_first_left() {
        let mut table = EdgeTable::default();
        let mut sweep = Sweep::new(&mut table, None, config());
        let outer = ring(&mut sweep, &[(0, 0), (0, 20), (20, 20), (20, 0)]);
        let hole = ring(&mut sweep, &[(5, 5), (15, 5), (15, 15), (5, 15)]);
        sweep.out_recs[hole].is_hole = true;
        sweep.out_recs[hole].first_left = Some(outer);
        let tree = sweep.build_tree();
        assert_eq!(tree.total(), 2);
        let first = tree.first().unwrap();
        assert_eq!(tree.node(first).unwrap().child_count(), 1);
        let child = tree.next(first).unwrap();
        assert!(tree.is_hole(child));
        assert_eq!(tree.node(child).unwrap().parent(), Some(first));
    }
}
