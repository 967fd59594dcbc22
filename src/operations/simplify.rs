use crate::clipper::{ClipType, Clipper, PolyFillType, PolyType};
use crate::error::Result;
use crate::math::{IntPoint, Path, Paths};

/// Proximity below which [`clean_polygon`] merges vertices by default,
/// a little over one diagonal unit.
pub const DEFAULT_CLEAN_DISTANCE: f64 = 1.415;

/// Removes self-intersections by unioning a path with itself under `fill`.
///
/// # Errors
///
/// Returns an error if the path has out-of-range coordinates or the sweep
/// fails.
pub fn simplify_polygon(path: &[IntPoint], fill: PolyFillType) -> Result<Paths> {
    let mut clipper = Clipper::new();
    clipper.add_path(path, PolyType::Subject, true)?;
    clipper.execute(ClipType::Union, fill, fill)
}

/// Like [`simplify_polygon`], over the union of several paths.
///
/// # Errors
///
/// See [`simplify_polygon`].
pub fn simplify_polygons(paths: &[Path], fill: PolyFillType) -> Result<Paths> {
    let mut clipper = Clipper::new();
    clipper.add_paths(paths, PolyType::Subject, true)?;
    clipper.execute(ClipType::Union, fill, fill)
}

#[allow(clippy::cast_precision_loss)]
fn points_are_close(pt1: IntPoint, pt2: IntPoint, dist_sqrd: f64) -> bool {
    let dx = pt1.x as f64 - pt2.x as f64;
    let dy = pt1.y as f64 - pt2.y as f64;
    dx * dx + dy * dy <= dist_sqrd
}

/// Squared distance of `pt` from the line through `ln1` and `ln2`.
#[allow(clippy::cast_precision_loss)]
fn distance_from_line_sqrd(pt: IntPoint, ln1: IntPoint, ln2: IntPoint) -> f64 {
    let a = (ln1.y - ln2.y) as f64;
    let b = (ln2.x - ln1.x) as f64;
    let c = a * pt.x as f64 + b * pt.y as f64 - (a * ln1.x as f64 + b * ln1.y as f64);
    (c * c) / (a * a + b * b)
}

/// Whether three points are within `dist_sqrd` of colinear. The distance is
/// measured for whichever point lies between the other two, so spikes are
/// caught too.
fn slopes_near_collinear(pt1: IntPoint, pt2: IntPoint, pt3: IntPoint, dist_sqrd: f64) -> bool {
    let between = |a: i64, b: i64, c: i64| (a > b) == (a < c);
    let (c1, c2, c3) = if (pt1.x - pt2.x).abs() > (pt1.y - pt2.y).abs() {
        (pt1.x, pt2.x, pt3.x)
    } else {
        (pt1.y, pt2.y, pt3.y)
    };
    if between(c1, c2, c3) {
        distance_from_line_sqrd(pt1, pt2, pt3) < dist_sqrd
    } else if between(c2, c1, c3) {
        distance_from_line_sqrd(pt2, pt1, pt3) < dist_sqrd
    } else {
        distance_from_line_sqrd(pt3, pt1, pt2) < dist_sqrd
    }
}

/// Ring of vertex indices that supports unlinking.
struct Ring {
    next: Vec<usize>,
    prev: Vec<usize>,
    checked: Vec<bool>,
}

impl Ring {
    fn new(n: usize) -> Self {
        Self {
            next: (0..n).map(|i| (i + 1) % n).collect(),
            prev: (0..n).map(|i| (i + n - 1) % n).collect(),
            checked: vec![false; n],
        }
    }

    /// Unlinks `op` and returns its predecessor, which needs re-checking.
    fn exclude(&mut self, op: usize) -> usize {
        let (prev, next) = (self.prev[op], self.next[op]);
        self.next[prev] = next;
        self.prev[next] = prev;
        self.checked[prev] = false;
        prev
    }
}

/// Removes vertices that are within `distance` of their neighbour, spikes
/// and near-colinear vertices. Returns an empty path when fewer than three
/// vertices survive.
#[must_use]
pub fn clean_polygon(path: &[IntPoint], distance: f64) -> Path {
    let n = path.len();
    if n == 0 {
        return Vec::new();
    }
    let dist_sqrd = distance * distance;
    let mut ring = Ring::new(n);
    let mut size = n;
    let mut op = 0;
    while !ring.checked[op] && ring.next[op] != ring.prev[op] {
        let (pt, prev_pt, next_pt) = (path[op], path[ring.prev[op]], path[ring.next[op]]);
        if points_are_close(pt, prev_pt, dist_sqrd) {
            op = ring.exclude(op);
            size -= 1;
        } else if points_are_close(prev_pt, next_pt, dist_sqrd) {
            ring.exclude(ring.next[op]);
            op = ring.exclude(op);
            size -= 2;
        } else if slopes_near_collinear(prev_pt, pt, next_pt, dist_sqrd) {
            op = ring.exclude(op);
            size -= 1;
        } else {
            ring.checked[op] = true;
            op = ring.next[op];
        }
    }

    if size < 3 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        out.push(path[op]);
        op = ring.next[op];
    }
    out
}

/// [`clean_polygon`] over every path; paths that vanish are kept as empty.
#[must_use]
pub fn clean_polygons(paths: &[Path], distance: f64) -> Paths {
    paths.iter().map(|path| clean_polygon(path, distance)).collect()
}
