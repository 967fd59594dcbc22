use crate::math::{round, IntPoint};

use super::PolyType;

slotmap::new_key_type! {
    /// Identifier of an edge in the edge table.
    pub(crate) struct EdgeId;
}

/// `dx` value marking a horizontal edge.
pub(crate) const HORIZONTAL: f64 = -1.0e40;

/// Which side of an output contour an edge is drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum EdgeSide {
    #[default]
    Left,
    Right,
}

/// The two intrusive lists an edge can be threaded through during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeList {
    /// Active edge list, ordered by X along the sweep line.
    Active,
    /// Sorted edge list: scratch ordering for horizontals and intersections.
    Sorted,
}

/// Neighbour links within one [`EdgeList`].
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Links {
    pub prev: Option<EdgeId>,
    pub next: Option<EdgeId>,
}

/// One segment of an input path.
///
/// `next`/`prev` form the circular ring over the path's vertices and stay
/// valid for the lifetime of the edge table. `next_in_lml` chains the edges of
/// one bound, starting at its local minimum. The `ael`/`sel` links are only
/// meaningful while the edge is threaded through that list.
#[derive(Debug, Clone)]
pub(crate) struct Edge {
    pub bot: IntPoint,
    pub curr: IntPoint,
    pub top: IntPoint,
    pub delta: IntPoint,
    /// Reciprocal slope `dx/dy`, or [`HORIZONTAL`].
    pub dx: f64,
    pub poly_type: PolyType,
    pub side: EdgeSide,
    /// `+1`/`-1` by orientation, `0` on open paths.
    pub wind_delta: i32,
    /// Winding count of the edge's own role.
    pub wind_cnt: i32,
    /// Winding count of the opposite role.
    pub wind_cnt2: i32,
    pub out_idx: Option<usize>,
    /// Synthetic closing edge of an open path; never swept.
    pub skip: bool,
    pub next: EdgeId,
    pub prev: EdgeId,
    pub next_in_lml: Option<EdgeId>,
    pub ael: Links,
    pub sel: Links,
}

impl Edge {
    /// Creates an unlinked edge starting at `pt`, ringed onto itself.
    pub fn new(id: EdgeId, pt: IntPoint) -> Self {
        Self {
            bot: IntPoint::default(),
            curr: pt,
            top: IntPoint::default(),
            delta: IntPoint::default(),
            dx: 0.0,
            poly_type: PolyType::Subject,
            side: EdgeSide::Left,
            wind_delta: 0,
            wind_cnt: 0,
            wind_cnt2: 0,
            out_idx: None,
            skip: false,
            next: id,
            prev: id,
            next_in_lml: None,
            ael: Links::default(),
            sel: Links::default(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn set_dx(&mut self) {
        self.delta = IntPoint::new(self.top.x - self.bot.x, self.top.y - self.bot.y);
        self.dx = if self.delta.y == 0 {
            HORIZONTAL
        } else {
            self.delta.x as f64 / self.delta.y as f64
        };
    }

    pub fn is_horizontal(&self) -> bool {
        self.delta.y == 0
    }

    /// X coordinate of the edge's supporting line at `y`.
    #[allow(clippy::cast_precision_loss)]
    pub fn top_x(&self, y: i64) -> i64 {
        if y == self.top.y {
            return self.top.x;
        }
        self.bot.x + round(self.dx * (y - self.bot.y) as f64)
    }

    pub fn links(&self, list: EdgeList) -> &Links {
        match list {
            EdgeList::Active => &self.ael,
            EdgeList::Sorted => &self.sel,
        }
    }

    pub fn links_mut(&mut self, list: EdgeList) -> &mut Links {
        match list {
            EdgeList::Active => &mut self.ael,
            EdgeList::Sorted => &mut self.sel,
        }
    }
}

/// Orders two edges that start at the same sweep position: `true` when `e2`
/// belongs left of `e1` in the active list.
pub(crate) fn e2_inserts_before_e1(e1: &Edge, e2: &Edge) -> bool {
    if e2.curr.x == e1.curr.x {
        if e2.top.y > e1.top.y {
            e2.top.x < e1.top_x(e2.top.y)
        } else {
            e1.top.x > e2.top_x(e1.top.y)
        }
    } else {
        e2.curr.x < e1.curr.x
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
    fn dx_and_top_x() {
        let e = edge((0, 10), (10, 0));
        assert!((e.dx + 1.0).abs() < f64::EPSILON);
        assert_eq!(e.top_x(5), 5);
        assert_eq!(e.top_x(0), 10);
        assert!(!e.is_horizontal());
    }

    #[test]
    fn horizontal_edge() {
        let e = edge((0, 3), (8, 3));
        assert!(e.is_horizontal());
        assert!((e.dx - HORIZONTAL).abs() < f64::EPSILON);
    }

    #[test]
    fn insertion_order_at_shared_bottom() {
        // Both start at (5, 10); the one leaning left goes first.
        let left = edge((5, 10), (0, 0));
        let right = edge((5, 10), (10, 0));
        assert!(e2_inserts_before_e1(&right, &left));
        assert!(!e2_inserts_before_e1(&left, &right));
    }
}
