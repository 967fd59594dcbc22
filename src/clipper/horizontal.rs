use crate::error::Result;
use crate::math::IntPoint;

use super::edge::{EdgeId, EdgeList};
use super::output::OutPtId;
use super::sweep::{horz_segments_overlap, Sweep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    LeftToRight,
    RightToLeft,
}

/// Direction of a horizontal edge and the X range it spans.
fn horz_direction(bot_x: i64, top_x: i64) -> (Direction, i64, i64) {
    if bot_x < top_x {
        (Direction::LeftToRight, bot_x, top_x)
    } else {
        (Direction::RightToLeft, top_x, bot_x)
    }
}

impl Sweep<'_> {
    pub(super) fn process_horizontals(&mut self) -> Result<()> {
        while let Some(horz) = self.pop_edge_from_sel() {
            self.process_horizontal(horz)?;
        }
        Ok(())
    }

    fn next_in_ael(&self, e: EdgeId, dir: Direction) -> Option<EdgeId> {
        match dir {
            Direction::LeftToRight => self.edges[e].ael.next,
            Direction::RightToLeft => self.edges[e].ael.prev,
        }
    }

    /// Joins `op1` with every pending horizontal of the output that overlaps
    /// `horz`, then records `op1` as a ghost join for later minima.
    fn join_pending_horizontals(&mut self, horz: EdgeId, op1: OutPtId, ghost_at: IntPoint) {
        let (bot_x, top_x) = (self.edges[horz].bot.x, self.edges[horz].top.x);
        let mut next_horz = self.sorted;
        while let Some(id) = next_horz {
            let other = &self.edges[id];
            if other.out_idx.is_some() && horz_segments_overlap(bot_x, top_x, other.bot.x, other.top.x) {
                let off_pt = other.top;
                if let Some(op2) = self.last_out_pt(id) {
                    self.add_join(op2, op1, off_pt);
                }
            }
            next_horz = self.edges[id].sel.next;
        }
        self.add_ghost_join(op1, ghost_at);
    }

    /// Walks a horizontal edge (and the horizontals continuing its bound)
    /// across the AEL, crossing every edge within its span.
    fn process_horizontal(&mut self, mut horz: EdgeId) -> Result<()> {
        let is_open = self.edges[horz].wind_delta == 0;
        let (mut dir, mut horz_left, mut horz_right) =
            horz_direction(self.edges[horz].bot.x, self.edges[horz].top.x);

        let mut last_horz = horz;
        while let Some(next) = self.edges[last_horz].next_in_lml {
            if !self.edges[next].is_horizontal() {
                break;
            }
            last_horz = next;
        }
        let max_pair = if self.edges[last_horz].next_in_lml.is_none() {
            self.get_maxima_pair(last_horz)
        } else {
            None
        };

        let mut op1: Option<OutPtId> = None;
        loop {
            let is_last_horz = horz == last_horz;
            let mut e = self.next_in_ael(horz, dir);
            while let Some(id) = e {
                let curr_x = self.edges[id].curr.x;
                if (dir == Direction::LeftToRight && curr_x > horz_right)
                    || (dir == Direction::RightToLeft && curr_x < horz_left)
                {
                    break;
                }
                // At the end of an intermediate horizontal, stop at edges that
                // lie right of the next bound edge above it.
                let horz_edge = &self.edges[horz];
                if curr_x == horz_edge.top.x {
                    if let Some(next) = horz_edge.next_in_lml {
                        if self.edges[id].dx < self.edges[next].dx {
                            break;
                        }
                    }
                }

                let mut pt = IntPoint::new(curr_x, self.edges[horz].curr.y);
                if self.edges[horz].out_idx.is_some() && !is_open {
                    match dir {
                        Direction::LeftToRight => self.set_z(&mut pt, horz, id),
                        Direction::RightToLeft => self.set_z(&mut pt, id, horz),
                    }
                    let op = self.add_out_pt(horz, pt)?;
                    op1 = Some(op);
                    let bot = self.edges[horz].bot;
                    self.join_pending_horizontals(horz, op, bot);
                }

                if Some(id) == max_pair && is_last_horz {
                    if self.edges[horz].out_idx.is_some() {
                        let top = self.edges[horz].top;
                        self.add_local_max_poly(horz, id, top)?;
                    }
                    self.delete_from_list(horz, EdgeList::Active);
                    self.delete_from_list(id, EdgeList::Active);
                    return Ok(());
                }

                match dir {
                    Direction::LeftToRight => self.intersect_edges(horz, id, pt)?,
                    Direction::RightToLeft => self.intersect_edges(id, horz, pt)?,
                }
                let next = self.next_in_ael(id, dir);
                self.swap_positions(horz, id, EdgeList::Active);
                e = next;
            }

            match self.edges[horz].next_in_lml {
                Some(next) if self.edges[next].is_horizontal() => {}
                _ => break,
            }
            horz = self.update_edge_into_ael(horz)?;
            if self.edges[horz].out_idx.is_some() {
                let bot = self.edges[horz].bot;
                self.add_out_pt(horz, bot)?;
            }
            (dir, horz_left, horz_right) = horz_direction(self.edges[horz].bot.x, self.edges[horz].top.x);
        }

        if op1.is_none() {
            if let Some(op) = self.last_out_pt(horz) {
                let top = self.edges[horz].top;
                self.join_pending_horizontals(horz, op, top);
            }
        }

        if self.edges[horz].next_in_lml.is_some() {
            if self.edges[horz].out_idx.is_some() {
                let top = self.edges[horz].top;
                let op = self.add_out_pt(horz, top)?;
                horz = self.update_edge_into_ael(horz)?;
                self.join_with_touching_neighbour(horz, op)?;
            } else {
                self.update_edge_into_ael(horz)?;
            }
        } else {
            if self.edges[horz].out_idx.is_some() {
                let top = self.edges[horz].top;
                self.add_out_pt(horz, top)?;
            }
            self.delete_from_list(horz, EdgeList::Active);
        }
        Ok(())
    }
}
