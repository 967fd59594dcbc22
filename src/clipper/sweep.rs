use std::collections::BinaryHeap;

use slotmap::SlotMap;

use crate::error::{InvariantError, Result};
use crate::math::polygon_2d::slopes_equal4;

use super::edge::{e2_inserts_before_e1, Edge, EdgeId, EdgeList, Links};
use super::intersect::IntersectNode;
use super::join::Join;
use super::local_minima::{EdgeTable, LocalMinimum};
use super::output::{OutPt, OutPtId, OutRec};
use super::{ClipType, PolyFillType, ZFillFn};

/// Options of one execute.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SweepConfig {
    pub clip_type: ClipType,
    pub subj_fill: PolyFillType,
    pub clip_fill: PolyFillType,
    pub preserve_collinear: bool,
    pub reverse_output: bool,
    pub using_tree: bool,
}

/// State of one execute: the active and sorted edge lists, the scanbeam and
/// every output record built so far.
///
/// The edge table is borrowed mutably since edges carry their sweep state;
/// it is reset before the next execute.
pub(crate) struct Sweep<'a> {
    pub(super) edges: &'a mut SlotMap<EdgeId, Edge>,
    minima: &'a [LocalMinimum],
    pub(super) z_fill: Option<&'a mut ZFillFn>,
    pub(super) config: SweepConfig,
    pub(super) full_range: bool,
    scanbeam: BinaryHeap<i64>,
    minima_cursor: usize,
    pub(super) active: Option<EdgeId>,
    pub(super) sorted: Option<EdgeId>,
    pub(super) intersections: Vec<IntersectNode>,
    pub(crate) out_recs: Vec<OutRec>,
    pub(super) out_pts: SlotMap<OutPtId, OutPt>,
    pub(super) joins: Vec<Join>,
    pub(super) ghost_joins: Vec<Join>,
}

impl<'a> Sweep<'a> {
    /// Prepares a sweep over a table that has already been reset.
    pub fn new(table: &'a mut EdgeTable, z_fill: Option<&'a mut ZFillFn>, config: SweepConfig) -> Self {
        let EdgeTable {
            edges,
            minima,
            use_full_range,
            ..
        } = table;
        let scanbeam = minima.iter().map(|lm| lm.y).collect();
        Self {
            edges,
            minima: minima.as_slice(),
            z_fill,
            config,
            full_range: *use_full_range,
            scanbeam,
            minima_cursor: 0,
            active: None,
            sorted: None,
            intersections: Vec::new(),
            out_recs: Vec::new(),
            out_pts: SlotMap::with_key(),
            joins: Vec::new(),
            ghost_joins: Vec::new(),
        }
    }

    /// Sweeps every scanbeam, then orients, joins and cleans the output.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantError`] when the sweep cannot resolve the input.
    pub fn run(&mut self) -> Result<()> {
        let Some(bot_y) = self.pop_scanbeam() else {
            return Ok(());
        };
        self.insert_local_minima_into_ael(bot_y)?;
        while let Some(top_y) = self.pop_scanbeam() {
            self.process_horizontals()?;
            self.ghost_joins.clear();
            self.process_intersections(top_y)?;
            self.process_edges_at_top_of_scanbeam(top_y)?;
            self.insert_local_minima_into_ael(top_y)?;
        }

        for idx in 0..self.out_recs.len() {
            let rec = &self.out_recs[idx];
            let Some(pts) = rec.pts else { continue };
            if rec.is_open {
                continue;
            }
            if (rec.is_hole ^ self.config.reverse_output) == (self.ring_area(pts) > 0.0) {
                self.reverse_links(pts);
            }
        }

        if !self.joins.is_empty() {
            self.join_common_edges();
        }

        for idx in 0..self.out_recs.len() {
            if self.out_recs[idx].pts.is_none() {
                continue;
            }
            if self.out_recs[idx].is_open {
                self.fixup_out_polyline(idx);
            } else {
                self.fixup_out_polygon(idx);
            }
        }
        Ok(())
    }

    pub(super) fn insert_scanbeam(&mut self, y: i64) {
        self.scanbeam.push(y);
    }

    fn pop_scanbeam(&mut self) -> Option<i64> {
        let y = self.scanbeam.pop()?;
        while self.scanbeam.peek() == Some(&y) {
            self.scanbeam.pop();
        }
        Some(y)
    }

    fn pop_local_minimum(&mut self, y: i64) -> Option<LocalMinimum> {
        let lm = *self.minima.get(self.minima_cursor)?;
        if lm.y != y {
            return None;
        }
        self.minima_cursor += 1;
        Some(lm)
    }

    fn insert_local_minima_into_ael(&mut self, bot_y: i64) -> Result<()> {
        while let Some(lm) = self.pop_local_minimum(bot_y) {
            let (lb, rb) = (lm.left_bound, lm.right_bound);
            let mut op1 = None;
            match (lb, rb) {
                (None, Some(rb)) => {
                    self.insert_edge_into_ael(rb, None);
                    self.set_winding_count(rb);
                    if self.is_contributing(rb) {
                        let bot = self.edges[rb].bot;
                        op1 = Some(self.add_out_pt(rb, bot)?);
                    }
                }
                (Some(lb), None) => {
                    self.insert_edge_into_ael(lb, None);
                    self.set_winding_count(lb);
                    if self.is_contributing(lb) {
                        let bot = self.edges[lb].bot;
                        op1 = Some(self.add_out_pt(lb, bot)?);
                    }
                    self.insert_scanbeam(self.edges[lb].top.y);
                }
                (Some(lb), Some(rb)) => {
                    self.insert_edge_into_ael(lb, None);
                    self.insert_edge_into_ael(rb, Some(lb));
                    self.set_winding_count(lb);
                    let (wind_cnt, wind_cnt2) = (self.edges[lb].wind_cnt, self.edges[lb].wind_cnt2);
                    self.edges[rb].wind_cnt = wind_cnt;
                    self.edges[rb].wind_cnt2 = wind_cnt2;
                    if self.is_contributing(lb) {
                        let bot = self.edges[lb].bot;
                        op1 = Some(self.add_local_min_poly(lb, rb, bot)?);
                    }
                    self.insert_scanbeam(self.edges[lb].top.y);
                }
                (None, None) => continue,
            }

            if let Some(rb) = rb {
                if self.edges[rb].is_horizontal() {
                    self.add_edge_to_sel(rb);
                    if let Some(next) = self.edges[rb].next_in_lml {
                        self.insert_scanbeam(self.edges[next].top.y);
                    }
                } else {
                    self.insert_scanbeam(self.edges[rb].top.y);
                }
            }

            let (Some(lb), Some(rb)) = (lb, rb) else {
                continue;
            };

            // A horizontal right bound overlapping an earlier horizontal of
            // the output needs joining with it.
            if let Some(op1) = op1 {
                let rb_edge = &self.edges[rb];
                if rb_edge.is_horizontal() && rb_edge.wind_delta != 0 && !self.ghost_joins.is_empty() {
                    let (bot_x, top_x) = (rb_edge.bot.x, rb_edge.top.x);
                    let overlapping: Vec<Join> = self
                        .ghost_joins
                        .iter()
                        .filter(|gj| {
                            horz_segments_overlap(self.out_pts[gj.out_pt1].pt.x, gj.off_pt.x, bot_x, top_x)
                        })
                        .copied()
                        .collect();
                    for gj in overlapping {
                        self.add_join(gj.out_pt1, op1, gj.off_pt);
                    }
                }
            }

            if let (Some(op1), Some(prev)) = (op1, self.edges[lb].ael.prev) {
                let lb_edge = &self.edges[lb];
                let prev_edge = &self.edges[prev];
                if lb_edge.out_idx.is_some()
                    && prev_edge.curr.x == lb_edge.bot.x
                    && prev_edge.out_idx.is_some()
                    && slopes_equal4(prev_edge.bot, prev_edge.top, lb_edge.curr, lb_edge.top, self.full_range)
                    && lb_edge.wind_delta != 0
                    && prev_edge.wind_delta != 0
                {
                    let (bot, top) = (lb_edge.bot, lb_edge.top);
                    let op2 = self.add_out_pt(prev, bot)?;
                    self.add_join(op1, op2, top);
                }
            }

            if self.edges[lb].ael.next != Some(rb) {
                if let (Some(op1), Some(prev)) = (op1, self.edges[rb].ael.prev) {
                    let rb_edge = &self.edges[rb];
                    let prev_edge = &self.edges[prev];
                    if rb_edge.out_idx.is_some()
                        && prev_edge.out_idx.is_some()
                        && slopes_equal4(prev_edge.curr, prev_edge.top, rb_edge.curr, rb_edge.top, self.full_range)
                        && rb_edge.wind_delta != 0
                        && prev_edge.wind_delta != 0
                    {
                        let (bot, top) = (rb_edge.bot, rb_edge.top);
                        let op2 = self.add_out_pt(prev, bot)?;
                        self.add_join(op1, op2, top);
                    }
                }

                // Edges between the two bounds cross the right bound here;
                // the right bound goes first since it ends up left of them.
                let pt = self.edges[lb].curr;
                let mut e = self.edges[lb].ael.next;
                while let Some(id) = e {
                    if id == rb {
                        break;
                    }
                    self.intersect_edges(rb, id, pt)?;
                    e = self.edges[id].ael.next;
                }
            }
        }
        Ok(())
    }

    fn head(&self, list: EdgeList) -> Option<EdgeId> {
        match list {
            EdgeList::Active => self.active,
            EdgeList::Sorted => self.sorted,
        }
    }

    fn set_head(&mut self, list: EdgeList, head: Option<EdgeId>) {
        match list {
            EdgeList::Active => self.active = head,
            EdgeList::Sorted => self.sorted = head,
        }
    }

    fn insert_edge_into_ael(&mut self, edge: EdgeId, start: Option<EdgeId>) {
        let Some(head) = self.active else {
            self.edges[edge].ael = Links::default();
            self.active = Some(edge);
            return;
        };
        if start.is_none() && e2_inserts_before_e1(&self.edges[head], &self.edges[edge]) {
            self.edges[edge].ael = Links {
                prev: None,
                next: Some(head),
            };
            self.edges[head].ael.prev = Some(edge);
            self.active = Some(edge);
            return;
        }
        let mut start = start.unwrap_or(head);
        while let Some(next) = self.edges[start].ael.next {
            if e2_inserts_before_e1(&self.edges[next], &self.edges[edge]) {
                break;
            }
            start = next;
        }
        let next = self.edges[start].ael.next;
        self.edges[edge].ael = Links {
            prev: Some(start),
            next,
        };
        if let Some(next) = next {
            self.edges[next].ael.prev = Some(edge);
        }
        self.edges[start].ael.next = Some(edge);
    }

    /// Pushes an edge on the front of the sorted list.
    pub(super) fn add_edge_to_sel(&mut self, edge: EdgeId) {
        self.edges[edge].sel = Links {
            prev: None,
            next: self.sorted,
        };
        if let Some(head) = self.sorted {
            self.edges[head].sel.prev = Some(edge);
        }
        self.sorted = Some(edge);
    }

    pub(super) fn pop_edge_from_sel(&mut self) -> Option<EdgeId> {
        let edge = self.sorted?;
        self.delete_from_list(edge, EdgeList::Sorted);
        Some(edge)
    }

    pub(super) fn copy_ael_to_sel(&mut self) {
        self.sorted = self.active;
        let mut e = self.active;
        while let Some(id) = e {
            let edge = &mut self.edges[id];
            edge.sel = edge.ael;
            e = edge.ael.next;
        }
    }

    pub(super) fn delete_from_list(&mut self, e: EdgeId, list: EdgeList) {
        let Links { prev, next } = *self.edges[e].links(list);
        if prev.is_none() && next.is_none() && self.head(list) != Some(e) {
            return;
        }
        match prev {
            Some(prev) => self.edges[prev].links_mut(list).next = next,
            None => self.set_head(list, next),
        }
        if let Some(next) = next {
            self.edges[next].links_mut(list).prev = prev;
        }
        *self.edges[e].links_mut(list) = Links::default();
    }

    /// Exchanges the positions of two edges within one list.
    pub(super) fn swap_positions(&mut self, e1: EdgeId, e2: EdgeId, list: EdgeList) {
        let l1 = *self.edges[e1].links(list);
        let l2 = *self.edges[e2].links(list);
        // Either edge may already have left the list.
        if (l1.prev.is_none() && l1.next.is_none()) || (l2.prev.is_none() && l2.next.is_none()) {
            return;
        }
        if l1.next == Some(e2) {
            if let Some(next) = l2.next {
                self.edges[next].links_mut(list).prev = Some(e1);
            }
            if let Some(prev) = l1.prev {
                self.edges[prev].links_mut(list).next = Some(e2);
            }
            *self.edges[e2].links_mut(list) = Links {
                prev: l1.prev,
                next: Some(e1),
            };
            *self.edges[e1].links_mut(list) = Links {
                prev: Some(e2),
                next: l2.next,
            };
        } else if l2.next == Some(e1) {
            if let Some(next) = l1.next {
                self.edges[next].links_mut(list).prev = Some(e2);
            }
            if let Some(prev) = l2.prev {
                self.edges[prev].links_mut(list).next = Some(e1);
            }
            *self.edges[e1].links_mut(list) = Links {
                prev: l2.prev,
                next: Some(e2),
            };
            *self.edges[e2].links_mut(list) = Links {
                prev: Some(e1),
                next: l1.next,
            };
        } else {
            *self.edges[e1].links_mut(list) = l2;
            if let Some(next) = l2.next {
                self.edges[next].links_mut(list).prev = Some(e1);
            }
            if let Some(prev) = l2.prev {
                self.edges[prev].links_mut(list).next = Some(e1);
            }
            *self.edges[e2].links_mut(list) = l1;
            if let Some(next) = l1.next {
                self.edges[next].links_mut(list).prev = Some(e2);
            }
            if let Some(prev) = l1.prev {
                self.edges[prev].links_mut(list).next = Some(e2);
            }
        }
        if self.edges[e1].links(list).prev.is_none() {
            self.set_head(list, Some(e1));
        } else if self.edges[e2].links(list).prev.is_none() {
            self.set_head(list, Some(e2));
        }
    }

    /// Replaces an edge in the AEL with the next edge of its bound, carrying
    /// over its output and winding state.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError::MissingBoundSuccessor`] when the edge ends
    /// its bound.
    pub(super) fn update_edge_into_ael(&mut self, e: EdgeId) -> Result<EdgeId> {
        let Some(next) = self.edges[e].next_in_lml else {
            return Err(InvariantError::MissingBoundSuccessor.into());
        };
        let old = self.edges[e].clone();
        match old.ael.prev {
            Some(prev) => self.edges[prev].ael.next = Some(next),
            None => self.active = Some(next),
        }
        if let Some(ael_next) = old.ael.next {
            self.edges[ael_next].ael.prev = Some(next);
        }
        let edge = &mut self.edges[next];
        edge.out_idx = old.out_idx;
        edge.side = old.side;
        edge.wind_delta = old.wind_delta;
        edge.wind_cnt = old.wind_cnt;
        edge.wind_cnt2 = old.wind_cnt2;
        edge.curr = edge.bot;
        edge.ael = old.ael;
        if !edge.is_horizontal() {
            let top_y = edge.top.y;
            self.insert_scanbeam(top_y);
        }
        Ok(next)
    }

    fn is_maxima(&self, e: EdgeId, y: i64) -> bool {
        let edge = &self.edges[e];
        edge.top.y == y && edge.next_in_lml.is_none()
    }

    pub(super) fn is_intermediate(&self, e: EdgeId, y: i64) -> bool {
        let edge = &self.edges[e];
        edge.top.y == y && edge.next_in_lml.is_some()
    }

    /// The other edge ending at this edge's top, when that is a local maximum.
    pub(super) fn get_maxima_pair(&self, e: EdgeId) -> Option<EdgeId> {
        let edge = &self.edges[e];
        [edge.next, edge.prev].into_iter().find(|&other| {
            let other = &self.edges[other];
            other.top == edge.top && other.next_in_lml.is_none()
        })
    }

    /// Like [`Sweep::get_maxima_pair`] but ignores pairs that are not active.
    pub(super) fn get_maxima_pair_ex(&self, e: EdgeId) -> Option<EdgeId> {
        let pair = self.get_maxima_pair(e)?;
        let edge = &self.edges[pair];
        if edge.skip || (edge.ael.next == edge.ael.prev && !edge.is_horizontal()) {
            return None;
        }
        Some(pair)
    }

    fn process_edges_at_top_of_scanbeam(&mut self, top_y: i64) -> Result<()> {
        let mut e = self.active;
        while let Some(id) = e {
            // Maxima are treated as bent horizontals, except next to a real one.
            let mut is_maxima_edge = self.is_maxima(id, top_y);
            if is_maxima_edge {
                if let Some(pair) = self.get_maxima_pair_ex(id) {
                    is_maxima_edge = !self.edges[pair].is_horizontal();
                }
            }
            if is_maxima_edge {
                let prev = self.edges[id].ael.prev;
                self.do_maxima(id)?;
                e = match prev {
                    Some(prev) => self.edges[prev].ael.next,
                    None => self.active,
                };
                continue;
            }

            let mut id = id;
            let promote = self.is_intermediate(id, top_y)
                && self.edges[id]
                    .next_in_lml
                    .is_some_and(|next| self.edges[next].is_horizontal());
            if promote {
                id = self.update_edge_into_ael(id)?;
                if self.edges[id].out_idx.is_some() {
                    let bot = self.edges[id].bot;
                    self.add_out_pt(id, bot)?;
                }
                self.add_edge_to_sel(id);
            } else {
                let x = self.edges[id].top_x(top_y);
                let edge = &mut self.edges[id];
                edge.curr.x = x;
                edge.curr.y = top_y;
                edge.curr.z = if top_y == edge.top.y {
                    edge.top.z
                } else if top_y == edge.bot.y {
                    edge.bot.z
                } else {
                    0
                };
            }
            e = self.edges[id].ael.next;
        }

        self.process_horizontals()?;

        let mut e = self.active;
        while let Some(mut id) = e {
            if self.is_intermediate(id, top_y) {
                let op = if self.edges[id].out_idx.is_some() {
                    let top = self.edges[id].top;
                    Some(self.add_out_pt(id, top)?)
                } else {
                    None
                };
                id = self.update_edge_into_ael(id)?;
                if let Some(op) = op {
                    self.join_with_touching_neighbour(id, op)?;
                }
            }
            e = self.edges[id].ael.next;
        }
        Ok(())
    }

    /// Records a join when an edge just promoted at `op` starts on a
    /// contributing neighbour with the same slope.
    pub(super) fn join_with_touching_neighbour(&mut self, id: EdgeId, op: OutPtId) -> Result<()> {
        let edge = &self.edges[id];
        if edge.wind_delta == 0 {
            return Ok(());
        }
        for neighbour in [edge.ael.prev, edge.ael.next].into_iter().flatten() {
            let other = &self.edges[neighbour];
            if other.curr == edge.bot
                && other.out_idx.is_some()
                && other.curr.y > other.top.y
                && slopes_equal4(edge.curr, edge.top, other.curr, other.top, self.full_range)
                && other.wind_delta != 0
            {
                let (bot, top) = (edge.bot, edge.top);
                let op2 = self.add_out_pt(neighbour, bot)?;
                self.add_join(op, op2, top);
                return Ok(());
            }
        }
        Ok(())
    }

    fn do_maxima(&mut self, e: EdgeId) -> Result<()> {
        let Some(pair) = self.get_maxima_pair_ex(e) else {
            if self.edges[e].out_idx.is_some() {
                let top = self.edges[e].top;
                self.add_out_pt(e, top)?;
            }
            self.delete_from_list(e, EdgeList::Active);
            return Ok(());
        };

        let top = self.edges[e].top;
        let mut next = self.edges[e].ael.next;
        while let Some(n) = next {
            if n == pair {
                break;
            }
            self.intersect_edges(e, n, top)?;
            self.swap_positions(e, n, EdgeList::Active);
            next = self.edges[e].ael.next;
        }

        let (e_out, pair_out) = (self.edges[e].out_idx, self.edges[pair].out_idx);
        match (e_out, pair_out) {
            (None, None) => {}
            (Some(_), Some(_)) => self.add_local_max_poly(e, pair, top)?,
            _ if self.edges[e].wind_delta == 0 => {
                if e_out.is_some() {
                    self.add_out_pt(e, top)?;
                    self.edges[e].out_idx = None;
                }
                if pair_out.is_some() {
                    self.add_out_pt(pair, top)?;
                    self.edges[pair].out_idx = None;
                }
            }
            _ => return Err(InvariantError::MaximaPairNotFound.into()),
        }
        self.delete_from_list(e, EdgeList::Active);
        self.delete_from_list(pair, EdgeList::Active);
        Ok(())
    }
}

/// Whether two horizontal spans overlap by more than a point.
pub(crate) fn horz_segments_overlap(mut seg1a: i64, mut seg1b: i64, mut seg2a: i64, mut seg2b: i64) -> bool {
    if seg1a > seg1b {
        std::mem::swap(&mut seg1a, &mut seg1b);
    }
    if seg2a > seg2b {
        std::mem::swap(&mut seg2a, &mut seg2b);
    }
    seg1a < seg2b && seg2a < seg1b
}
