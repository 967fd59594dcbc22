use tracing::warn;

use crate::error::{InvariantError, Result};
use crate::math::{round, IntPoint};

use super::edge::{Edge, EdgeId, EdgeList};
use super::sweep::Sweep;
use super::winding::normalized_wind;
use super::{ClipType, PolyType};

/// A pending crossing of two AEL edges within the current scanbeam.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IntersectNode {
    pub edge1: EdgeId,
    pub edge2: EdgeId,
    pub pt: IntPoint,
}

/// Where the supporting lines of two edges cross, kept within the current
/// scanbeam: never above either edge's top, never below `e1.curr.y`.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
pub(crate) fn intersect_point(e1: &Edge, e2: &Edge) -> IntPoint {
    let mut ip = IntPoint::default();
    if e1.dx == e2.dx {
        ip.y = e1.curr.y;
        ip.x = e1.top_x(ip.y);
        return ip;
    }
    if e1.delta.x == 0 {
        ip.x = e1.bot.x;
        ip.y = if e2.is_horizontal() {
            e2.bot.y
        } else {
            let b2 = e2.bot.y as f64 - e2.bot.x as f64 / e2.dx;
            round(ip.x as f64 / e2.dx + b2)
        };
    } else if e2.delta.x == 0 {
        ip.x = e2.bot.x;
        ip.y = if e1.is_horizontal() {
            e1.bot.y
        } else {
            let b1 = e1.bot.y as f64 - e1.bot.x as f64 / e1.dx;
            round(ip.x as f64 / e1.dx + b1)
        };
    } else {
        let b1 = e1.bot.x as f64 - e1.bot.y as f64 * e1.dx;
        let b2 = e2.bot.x as f64 - e2.bot.y as f64 * e2.dx;
        let q = (b2 - b1) / (e1.dx - e2.dx);
        ip.y = round(q);
        ip.x = if e1.dx.abs() < e2.dx.abs() {
            round(e1.dx * q + b1)
        } else {
            round(e2.dx * q + b2)
        };
    }

    if ip.y < e1.top.y || ip.y < e2.top.y {
        ip.y = e1.top.y.max(e2.top.y);
        ip.x = if e1.dx.abs() < e2.dx.abs() {
            e1.top_x(ip.y)
        } else {
            e2.top_x(ip.y)
        };
    }
    if ip.y > e1.curr.y {
        ip.y = e1.curr.y;
        // The steeper edge gives the better X.
        ip.x = if e1.dx.abs() > e2.dx.abs() {
            e2.top_x(ip.y)
        } else {
            e1.top_x(ip.y)
        };
    }
    ip
}

impl Sweep<'_> {
    pub(super) fn process_intersections(&mut self, top_y: i64) -> Result<()> {
        if self.active.is_none() {
            return Ok(());
        }
        self.build_intersect_list(top_y);
        let result = match self.intersections.len() {
            0 => Ok(()),
            1 => self.process_intersect_list(),
            _ => {
                if self.fixup_intersection_order() {
                    self.process_intersect_list()
                } else {
                    warn!(
                        count = self.intersections.len(),
                        top_y, "intersections cannot be ordered into adjacent swaps"
                    );
                    Err(InvariantError::UnorderableIntersections.into())
                }
            }
        };
        self.intersections.clear();
        self.sorted = None;
        result
    }

    /// Bubble-sorts a copy of the AEL by X at `top_y`; every swap is a
    /// crossing within the scanbeam.
    fn build_intersect_list(&mut self, top_y: i64) {
        self.sorted = self.active;
        let mut e = self.active;
        while let Some(id) = e {
            let x = self.edges[id].top_x(top_y);
            let edge = &mut self.edges[id];
            edge.sel = edge.ael;
            edge.curr.x = x;
            e = edge.ael.next;
        }

        loop {
            let mut modified = false;
            let Some(mut e) = self.sorted else { return };
            while let Some(next) = self.edges[e].sel.next {
                if self.edges[e].curr.x > self.edges[next].curr.x {
                    let mut pt = intersect_point(&self.edges[e], &self.edges[next]);
                    if pt.y < top_y {
                        pt = IntPoint::new(self.edges[e].top_x(top_y), top_y);
                    }
                    self.intersections.push(IntersectNode {
                        edge1: e,
                        edge2: next,
                        pt,
                    });
                    self.swap_positions(e, next, EdgeList::Sorted);
                    modified = true;
                } else {
                    e = next;
                }
            }
            // The last edge is in place; later passes stop short of it.
            match self.edges[e].sel.prev {
                Some(prev) => self.edges[prev].sel.next = None,
                None => break,
            }
            if !modified {
                break;
            }
        }
        self.sorted = None;
    }

    /// Orders the crossings bottom-up and makes sure each swaps edges that
    /// are adjacent at that moment.
    fn fixup_intersection_order(&mut self) -> bool {
        self.copy_ael_to_sel();
        self.intersections.sort_by(|a, b| b.pt.y.cmp(&a.pt.y));
        let count = self.intersections.len();
        for i in 0..count {
            if !self.edges_adjacent(&self.intersections[i]) {
                let Some(j) = (i + 1..count).find(|&j| self.edges_adjacent(&self.intersections[j])) else {
                    return false;
                };
                self.intersections.swap(i, j);
            }
            let node = self.intersections[i];
            self.swap_positions(node.edge1, node.edge2, EdgeList::Sorted);
        }
        true
    }

    fn edges_adjacent(&self, node: &IntersectNode) -> bool {
        let sel = self.edges[node.edge1].sel;
        sel.next == Some(node.edge2) || sel.prev == Some(node.edge2)
    }

    fn process_intersect_list(&mut self) -> Result<()> {
        let nodes = std::mem::take(&mut self.intersections);
        for node in nodes {
            self.intersect_edges(node.edge1, node.edge2, node.pt)?;
            self.swap_positions(node.edge1, node.edge2, EdgeList::Active);
        }
        Ok(())
    }

    /// Fills `pt.z` for a new vertex where `e1` and `e2` cross.
    pub(super) fn set_z(&mut self, pt: &mut IntPoint, e1: EdgeId, e2: EdgeId) {
        if pt.z != 0 {
            return;
        }
        let Some(fill) = self.z_fill.as_deref_mut() else {
            return;
        };
        let (e1, e2) = (&self.edges[e1], &self.edges[e2]);
        if let Some(end) = [e1.bot, e1.top, e2.bot, e2.top].into_iter().find(|end| *end == *pt) {
            pt.z = end.z;
        } else {
            fill(e1.bot.z, e2.bot.z, pt);
        }
    }

    /// Applies a crossing of `e1` and `e2` at `pt`.
    ///
    /// `e1` must be right of `e2` just above the crossing. Winding counts
    /// are exchanged, and output contours are opened, closed or continued;
    /// the caller swaps the edges in the AEL. `z` is only filled in when the
    /// crossing becomes an output vertex.
    ///
    /// # Errors
    ///
    /// Propagates [`InvariantError::DetachedOutRec`] from the output side.
    pub(super) fn intersect_edges(&mut self, e1: EdgeId, e2: EdgeId, mut pt: IntPoint) -> Result<()> {
        let e1_contributing = self.edges[e1].out_idx.is_some();
        let e2_contributing = self.edges[e2].out_idx.is_some();

        let (wd1, wd2) = (self.edges[e1].wind_delta, self.edges[e2].wind_delta);
        if wd1 == 0 || wd2 == 0 {
            return self.intersect_open(e1, e2, pt, e1_contributing, e2_contributing);
        }

        let same_role = self.edges[e1].poly_type == self.edges[e2].poly_type;
        if same_role {
            if self.is_even_odd_fill(e1) {
                let (a, b) = (self.edges[e1].wind_cnt, self.edges[e2].wind_cnt);
                self.edges[e1].wind_cnt = b;
                self.edges[e2].wind_cnt = a;
            } else {
                let edge = &mut self.edges[e1];
                edge.wind_cnt = if edge.wind_cnt + wd2 == 0 {
                    -edge.wind_cnt
                } else {
                    edge.wind_cnt + wd2
                };
                let edge = &mut self.edges[e2];
                edge.wind_cnt = if edge.wind_cnt - wd1 == 0 {
                    -edge.wind_cnt
                } else {
                    edge.wind_cnt - wd1
                };
            }
        } else {
            let e2_even_odd = self.is_even_odd_fill(e2);
            let e1_even_odd = self.is_even_odd_fill(e1);
            let edge = &mut self.edges[e1];
            edge.wind_cnt2 = if e2_even_odd {
                i32::from(edge.wind_cnt2 == 0)
            } else {
                edge.wind_cnt2 + wd2
            };
            let edge = &mut self.edges[e2];
            edge.wind_cnt2 = if e1_even_odd {
                i32::from(edge.wind_cnt2 == 0)
            } else {
                edge.wind_cnt2 - wd1
            };
        }

        let e1_wc = normalized_wind(self.own_fill(e1), self.edges[e1].wind_cnt);
        let e2_wc = normalized_wind(self.own_fill(e2), self.edges[e2].wind_cnt);
        let unit = |wc: i32| wc == 0 || wc == 1;

        if e1_contributing && e2_contributing {
            self.set_z(&mut pt, e1, e2);
            if !unit(e1_wc) || !unit(e2_wc) || (!same_role && self.config.clip_type != ClipType::Xor) {
                self.add_local_max_poly(e1, e2, pt)?;
            } else {
                self.add_out_pt(e1, pt)?;
                self.add_out_pt(e2, pt)?;
                self.swap_sides_and_indexes(e1, e2);
            }
        } else if e1_contributing {
            if unit(e2_wc) {
                self.set_z(&mut pt, e1, e2);
                self.add_out_pt(e1, pt)?;
                self.swap_sides_and_indexes(e1, e2);
            }
        } else if e2_contributing {
            if unit(e1_wc) {
                self.set_z(&mut pt, e1, e2);
                self.add_out_pt(e2, pt)?;
                self.swap_sides_and_indexes(e1, e2);
            }
        } else if unit(e1_wc) && unit(e2_wc) {
            let e1_wc2 = normalized_wind(self.other_fill(e1), self.edges[e1].wind_cnt2);
            let e2_wc2 = normalized_wind(self.other_fill(e2), self.edges[e2].wind_cnt2);
            if !same_role {
                self.set_z(&mut pt, e1, e2);
                self.add_local_min_poly(e1, e2, pt)?;
            } else if e1_wc == 1 && e2_wc == 1 {
                let opens = match self.config.clip_type {
                    ClipType::Intersection => e1_wc2 > 0 && e2_wc2 > 0,
                    ClipType::Union => e1_wc2 <= 0 && e2_wc2 <= 0,
                    ClipType::Difference => match self.edges[e1].poly_type {
                        PolyType::Clip => e1_wc2 > 0 && e2_wc2 > 0,
                        PolyType::Subject => e1_wc2 <= 0 && e2_wc2 <= 0,
                    },
                    ClipType::Xor => true,
                };
                if opens {
                    self.set_z(&mut pt, e1, e2);
                    self.add_local_min_poly(e1, e2, pt)?;
                }
            } else {
                self.swap_sides(e1, e2);
            }
        }
        Ok(())
    }

    /// Crossings that involve an open path. Open paths never change winding;
    /// they only toggle their own output.
    fn intersect_open(
        &mut self,
        e1: EdgeId,
        e2: EdgeId,
        mut pt: IntPoint,
        e1_contributing: bool,
        e2_contributing: bool,
    ) -> Result<()> {
        let (a, b) = (&self.edges[e1], &self.edges[e2]);
        if a.wind_delta == 0 && b.wind_delta == 0 {
            return Ok(());
        }
        let union = self.config.clip_type == ClipType::Union;
        if a.poly_type == b.poly_type && union {
            // Open subject line against a closed subject polygon.
            if a.wind_delta == 0 {
                if e2_contributing {
                    self.set_z(&mut pt, e1, e2);
                    self.add_out_pt(e1, pt)?;
                    if e1_contributing {
                        self.edges[e1].out_idx = None;
                    }
                }
            } else if e1_contributing {
                self.set_z(&mut pt, e1, e2);
                self.add_out_pt(e2, pt)?;
                if e2_contributing {
                    self.edges[e2].out_idx = None;
                }
            }
        } else if a.poly_type != b.poly_type {
            if a.wind_delta == 0 && b.wind_cnt.abs() == 1 && (!union || b.wind_cnt2 == 0) {
                self.set_z(&mut pt, e1, e2);
                self.add_out_pt(e1, pt)?;
                if e1_contributing {
                    self.edges[e1].out_idx = None;
                }
            } else if b.wind_delta == 0 && a.wind_cnt.abs() == 1 && (!union || a.wind_cnt2 == 0) {
                self.set_z(&mut pt, e1, e2);
                self.add_out_pt(e2, pt)?;
                if e2_contributing {
                    self.edges[e2].out_idx = None;
                }
            }
        }
        Ok(())
    }

    fn swap_sides(&mut self, e1: EdgeId, e2: EdgeId) {
        let (s1, s2) = (self.edges[e1].side, self.edges[e2].side);
        self.edges[e1].side = s2;
        self.edges[e2].side = s1;
    }

    fn swap_sides_and_indexes(&mut self, e1: EdgeId, e2: EdgeId) {
        self.swap_sides(e1, e2);
        let (o1, o2) = (self.edges[e1].out_idx, self.edges[e2].out_idx);
        self.edges[e1].out_idx = o2;
        self.edges[e2].out_idx = o1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn edge(bot: (i64, i64), top: (i64, i64)) -> Edge {
        let mut map: SlotMap<EdgeId, ()> = SlotMap::with_key();
        let id = map.insert(());
        let mut e = Edge::new(id, IntPoint::new(bot.0, bot.1));
        e.bot = IntPoint::new(bot.0, bot.1);
        e.top = IntPoint::new(top.0, top.1);
        e.set_dx();
        e
    }

    #[test]
    fn crossing_diagonals() {
        let e1 = edge((0, 10), (10, 0));
        let e2 = edge((10, 10), (0, 0));
        assert_eq!(intersect_point(&e1, &e2), IntPoint::new(5, 5));
    }

    #[test]
    fn vertical_and_horizontal() {
        let vertical = edge((4, 10), (4, 0));
        let horizontal = edge((0, 6), (10, 6));
        assert_eq!(intersect_point(&vertical, &horizontal), IntPoint::new(4, 6));
        let diagonal = edge((0, 10), (10, 0));
        assert_eq!(intersect_point(&diagonal, &vertical), IntPoint::new(4, 6));
    }

    #[test]
    fn clamped_to_the_scanbeam() {
        // Nearly parallel lines meet far above both tops.
        let e1 = edge((0, 10), (1, 0));
        let e2 = edge((3, 10), (3, 5));
        // The vertical edge is steeper, so it fixes X.
        assert_eq!(intersect_point(&e1, &e2), IntPoint::new(3, 5));
    }

    #[test]
    fn parallel_edges_meet_at_current_y() {
        let e1 = edge((0, 10), (10, 0));
        let e2 = edge((2, 10), (12, 0));
        let ip = intersect_point(&e1, &e2);
        assert_eq!(ip.y, 10);
        assert_eq!(ip.x, 0);
    }
}
