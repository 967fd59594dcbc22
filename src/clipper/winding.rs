use super::edge::EdgeId;
use super::sweep::Sweep;
use super::{ClipType, PolyFillType, PolyType};

impl Sweep<'_> {
    /// Fill rule of the edge's own role.
    pub(super) fn own_fill(&self, e: EdgeId) -> PolyFillType {
        match self.edges[e].poly_type {
            PolyType::Subject => self.config.subj_fill,
            PolyType::Clip => self.config.clip_fill,
        }
    }

    /// Fill rule of the opposite role.
    pub(super) fn other_fill(&self, e: EdgeId) -> PolyFillType {
        match self.edges[e].poly_type {
            PolyType::Subject => self.config.clip_fill,
            PolyType::Clip => self.config.subj_fill,
        }
    }

    pub(super) fn is_even_odd_fill(&self, e: EdgeId) -> bool {
        self.own_fill(e) == PolyFillType::EvenOdd
    }

    fn is_even_odd_alt_fill(&self, e: EdgeId) -> bool {
        self.other_fill(e) == PolyFillType::EvenOdd
    }

    /// Derives `wind_cnt` and `wind_cnt2` of a newly inserted edge from the
    /// edges left of it in the AEL.
    pub(super) fn set_winding_count(&mut self, edge: EdgeId) {
        let poly_type = self.edges[edge].poly_type;
        let wind_delta = self.edges[edge].wind_delta;

        // Nearest closed edge of the same role to the left.
        let mut e = self.edges[edge].ael.prev;
        while let Some(id) = e {
            let other = &self.edges[id];
            if other.poly_type == poly_type && other.wind_delta != 0 {
                break;
            }
            e = other.ael.prev;
        }

        let (wind_cnt, wind_cnt2, mut cursor) = match e {
            None => {
                let wind_cnt = if wind_delta != 0 {
                    wind_delta
                } else if self.own_fill(edge) == PolyFillType::Negative {
                    -1
                } else {
                    1
                };
                (wind_cnt, 0, self.active)
            }
            Some(prev) if wind_delta == 0 && self.config.clip_type != ClipType::Union => {
                let prev = &self.edges[prev];
                (1, prev.wind_cnt2, prev.ael.next)
            }
            Some(prev) if self.is_even_odd_fill(edge) => {
                let wind_cnt = if wind_delta == 0 {
                    // An open edge is inside when an odd number of closed
                    // edges of its role lie to the left.
                    let mut inside = true;
                    let mut e2 = self.edges[prev].ael.prev;
                    while let Some(id) = e2 {
                        let other = &self.edges[id];
                        if other.poly_type == self.edges[prev].poly_type && other.wind_delta != 0 {
                            inside = !inside;
                        }
                        e2 = other.ael.prev;
                    }
                    i32::from(!inside)
                } else {
                    wind_delta
                };
                let prev = &self.edges[prev];
                (wind_cnt, prev.wind_cnt2, prev.ael.next)
            }
            Some(prev) => {
                let prev = &self.edges[prev];
                let wind_cnt = if prev.wind_cnt * prev.wind_delta < 0 {
                    // The previous edge heads toward zero: outside it.
                    if prev.wind_cnt.abs() > 1 {
                        if prev.wind_delta * wind_delta < 0 {
                            prev.wind_cnt
                        } else {
                            prev.wind_cnt + wind_delta
                        }
                    } else if wind_delta == 0 {
                        1
                    } else {
                        wind_delta
                    }
                } else if wind_delta == 0 {
                    if prev.wind_cnt < 0 {
                        prev.wind_cnt - 1
                    } else {
                        prev.wind_cnt + 1
                    }
                } else if prev.wind_delta * wind_delta < 0 {
                    prev.wind_cnt
                } else {
                    prev.wind_cnt + wind_delta
                };
                (wind_cnt, prev.wind_cnt2, prev.ael.next)
            }
        };

        let mut wind_cnt2 = wind_cnt2;
        let alt_even_odd = self.is_even_odd_alt_fill(edge);
        while let Some(id) = cursor {
            if id == edge {
                break;
            }
            let other = &self.edges[id];
            if alt_even_odd {
                if other.wind_delta != 0 {
                    wind_cnt2 = i32::from(wind_cnt2 == 0);
                }
            } else {
                wind_cnt2 += other.wind_delta;
            }
            cursor = other.ael.next;
        }

        let e = &mut self.edges[edge];
        e.wind_cnt = wind_cnt;
        e.wind_cnt2 = wind_cnt2;
    }

    /// Whether the edge bounds a region of the requested result.
    pub(super) fn is_contributing(&self, e: EdgeId) -> bool {
        let edge = &self.edges[e];
        let own_ok = match self.own_fill(e) {
            PolyFillType::EvenOdd => edge.wind_delta != 0 || edge.wind_cnt == 1,
            PolyFillType::NonZero => edge.wind_cnt.abs() == 1,
            PolyFillType::Positive => edge.wind_cnt == 1,
            PolyFillType::Negative => edge.wind_cnt == -1,
        };
        if !own_ok {
            return false;
        }

        let other = self.other_fill(e);
        match (self.config.clip_type, edge.poly_type) {
            (ClipType::Intersection, _) | (ClipType::Difference, PolyType::Clip) => {
                is_inside(other, edge.wind_cnt2)
            }
            (ClipType::Union | ClipType::Difference, _) => !is_inside(other, edge.wind_cnt2),
            (ClipType::Xor, _) => edge.wind_delta != 0 || !is_inside(other, edge.wind_cnt2),
        }
    }
}

/// Whether a winding count lies inside a region filled by `fill`.
pub(super) fn is_inside(fill: PolyFillType, wind_cnt: i32) -> bool {
    match fill {
        PolyFillType::EvenOdd | PolyFillType::NonZero => wind_cnt != 0,
        PolyFillType::Positive => wind_cnt > 0,
        PolyFillType::Negative => wind_cnt < 0,
    }
}

/// Winding count normalized so that `1` means "just inside" under `fill`.
pub(super) fn normalized_wind(fill: PolyFillType, wind_cnt: i32) -> i32 {
    match fill {
        PolyFillType::Positive => wind_cnt,
        PolyFillType::Negative => -wind_cnt,
        PolyFillType::EvenOdd | PolyFillType::NonZero => wind_cnt.abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_per_fill() {
        assert!(is_inside(PolyFillType::EvenOdd, 1));
        assert!(is_inside(PolyFillType::NonZero, -2));
        assert!(!is_inside(PolyFillType::Positive, -1));
        assert!(is_inside(PolyFillType::Negative, -1));
        assert!(!is_inside(PolyFillType::Negative, 0));
    }

    #[test]
    fn normalized_winding() {
        assert_eq!(normalized_wind(PolyFillType::Negative, -1), 1);
        assert_eq!(normalized_wind(PolyFillType::NonZero, -3), 3);
        assert_eq!(normalized_wind(PolyFillType::Positive, -1), -1);
    }
}
