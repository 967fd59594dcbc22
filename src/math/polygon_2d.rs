use super::{IntPoint, IntRect, Path, Paths, WideInt128};

/// Signed area of a closed path.
///
/// Positive for rings that run counter-clockwise in a Y-up frame, which is
/// when [`orientation`] returns `true`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn area(path: &[IntPoint]) -> f64 {
    let n = path.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut j = n - 1;
    for i in 0..n {
        sum += (path[j].x as f64 + path[i].x as f64) * (path[j].y as f64 - path[i].y as f64);
        j = i;
    }
    -sum * 0.5
}

/// Returns `true` when the path has non-negative [`area`].
///
/// Outer contours produced by the clipper are `true`, holes are `false`,
/// unless the solution was reversed.
#[must_use]
pub fn orientation(path: &[IntPoint]) -> bool {
    area(path) >= 0.0
}

/// Reverses the vertex order of a path in place.
pub fn reverse_path(path: &mut Path) {
    path.reverse();
}

/// Reverses every path in place.
pub fn reverse_paths(paths: &mut Paths) {
    for path in paths.iter_mut() {
        path.reverse();
    }
}

/// Classifies `pt` against a closed ring given as a vertex sequence.
///
/// Returns `0` when outside, `1` when inside and `-1` when on the boundary.
/// The cross term is evaluated in 128-bit arithmetic.
pub(crate) fn point_in_ring<I>(pt: IntPoint, ring: I) -> i32
where
    I: IntoIterator<Item = IntPoint>,
{
    let mut iter = ring.into_iter();
    let Some(first) = iter.next() else {
        return 0;
    };
    let mut result = 0;
    let mut ip = first;
    let mut done = false;
    while !done {
        let next = if let Some(p) = iter.next() {
            p
        } else {
            done = true;
            first
        };
        if next.y == pt.y && (next.x == pt.x || (ip.y == pt.y && ((next.x > pt.x) == (ip.x < pt.x)))) {
            return -1;
        }
        if (ip.y < pt.y) != (next.y < pt.y) {
            if ip.x >= pt.x && next.x > pt.x {
                result = 1 - result;
            } else if ip.x >= pt.x || next.x > pt.x {
                let d = WideInt128::product(ip.x - pt.x, next.y - pt.y)
                    - WideInt128::product(next.x - pt.x, ip.y - pt.y);
                if d.is_zero() {
                    return -1;
                }
                if (d.signum() > 0) == (next.y > ip.y) {
                    result = 1 - result;
                }
            }
        }
        ip = next;
    }
    result
}

/// Classifies a point against a closed path.
///
/// Returns `0` when outside, `1` when inside and `-1` when `pt` lies on the
/// boundary. Paths with fewer than three vertices contain nothing.
#[must_use]
pub fn point_in_polygon(pt: IntPoint, path: &[IntPoint]) -> i32 {
    if path.len() < 3 {
        return 0;
    }
    point_in_ring(pt, path.iter().copied())
}

/// Whether segments `pt1-pt2` and `pt2-pt3` are colinear.
pub(crate) fn slopes_equal3(pt1: IntPoint, pt2: IntPoint, pt3: IntPoint, full_range: bool) -> bool {
    slopes_equal4(pt1, pt2, pt2, pt3, full_range)
}

/// Whether segments `pt1-pt2` and `pt3-pt4` are parallel.
pub(crate) fn slopes_equal4(
    pt1: IntPoint,
    pt2: IntPoint,
    pt3: IntPoint,
    pt4: IntPoint,
    full_range: bool,
) -> bool {
    if full_range {
        WideInt128::product(pt1.y - pt2.y, pt3.x - pt4.x)
            == WideInt128::product(pt1.x - pt2.x, pt3.y - pt4.y)
    } else {
        (pt1.y - pt2.y) * (pt3.x - pt4.x) == (pt1.x - pt2.x) * (pt3.y - pt4.y)
    }
}

/// Whether `pt2` lies strictly between `pt1` and `pt3` on their common line.
pub(crate) fn pt2_is_between_pt1_and_pt3(pt1: IntPoint, pt2: IntPoint, pt3: IntPoint) -> bool {
    if pt1 == pt3 || pt1 == pt2 || pt3 == pt2 {
        false
    } else if pt1.x != pt3.x {
        (pt2.x > pt1.x) == (pt2.x < pt3.x)
    } else {
        (pt2.y > pt1.y) == (pt2.y < pt3.y)
    }
}

/// Bounding rectangle of all vertices, or `None` when there are none.
#[must_use]
pub fn bounds(paths: &[Path]) -> Option<IntRect> {
    let mut points = paths.iter().flatten();
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::path_from;
    use approx::assert_relative_eq;

    fn square() -> Path {
        path_from(&[(0, 0), (10, 0), (10, 10), (0, 10)])
    }

    #[test]
    fn area_of_square() {
        assert_relative_eq!(area(&square()), 100.0);
        assert!(orientation(&square()));
    }

    #[test]
    fn reversing_flips_orientation_and_area() {
        let mut paths = vec![square()];
        reverse_paths(&mut paths);
        assert!(!orientation(&paths[0]));
        assert_relative_eq!(area(&paths[0]), -100.0);
        reverse_paths(&mut paths);
        assert!(orientation(&paths[0]));
    }

    #[test]
    fn area_degenerate() {
        assert_relative_eq!(area(&path_from(&[(0, 0), (5, 5)])), 0.0);
        assert_relative_eq!(area(&[]), 0.0);
    }

    #[test]
    fn point_in_polygon_classification() {
        let sq = square();
        assert_eq!(point_in_polygon(IntPoint::new(5, 5), &sq), 1);
        assert_eq!(point_in_polygon(IntPoint::new(15, 5), &sq), 0);
        assert_eq!(point_in_polygon(IntPoint::new(10, 5), &sq), -1);
        assert_eq!(point_in_polygon(IntPoint::new(0, 0), &sq), -1);
        assert_eq!(point_in_polygon(IntPoint::new(5, 0), &sq), -1);
    }

    #[test]
    fn point_in_polygon_full_range() {
        let big = 0x3FFF_FFFF_FFFF_0000;
        let tri = path_from(&[(-big, -big), (big, -big), (0, big)]);
        assert_eq!(point_in_polygon(IntPoint::new(0, 0), &tri), 1);
        assert_eq!(point_in_polygon(IntPoint::new(big, big), &tri), 0);
    }

    #[test]
    fn slopes() {
        let a = IntPoint::new(0, 0);
        let b = IntPoint::new(5, 5);
        let c = IntPoint::new(10, 10);
        assert!(slopes_equal3(a, b, c, false));
        assert!(slopes_equal3(a, b, c, true));
        assert!(!slopes_equal3(a, b, IntPoint::new(10, 11), false));
    }

    #[test]
    fn between() {
        let a = IntPoint::new(0, 0);
        assert!(pt2_is_between_pt1_and_pt3(a, IntPoint::new(1, 0), IntPoint::new(2, 0)));
        assert!(!pt2_is_between_pt1_and_pt3(a, IntPoint::new(3, 0), IntPoint::new(2, 0)));
        assert!(pt2_is_between_pt1_and_pt3(a, IntPoint::new(0, 1), IntPoint::new(0, 2)));
    }

    #[test]
    fn bounds_of_paths() {
        let rect = bounds(&[square(), path_from(&[(-3, 4), (2, 20)])]).unwrap();
        assert_eq!(rect, IntRect { left: -3, top: 0, right: 10, bottom: 20 });
        assert!(bounds(&[]).is_none());
    }
}
