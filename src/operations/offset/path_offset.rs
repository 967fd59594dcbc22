use std::f64::consts::PI;

use tracing::debug;

use crate::clipper::{ClipType, Clipper, PolyFillType, PolyType};
use crate::error::Result;
use crate::math::polygon_2d::{area, orientation, reverse_paths};
use crate::math::{path_from, round, IntPoint, Path, Paths, Vector2};

/// Offsets with a magnitude below this return the input unchanged.
const NEAR_ZERO: f64 = 1.0e-20;

/// Round joins are only emitted when consecutive normals are further apart
/// than this cosine (about 10 degrees).
const ROUND_MIN_COS: f64 = 0.985;

/// Upper bound on arc vertices per full turn.
const MAX_ARC_STEPS: f64 = 222.0;

/// Arc tolerance used when none is given, and for the circles that replace
/// single points under square and miter joins.
const DEFAULT_ARC_TOLERANCE: f64 = 0.25;

/// How convex corners are filled when offsetting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// Corners are cut off at distance `delta`.
    #[default]
    Square,
    /// Arcs of radius `delta`.
    Round,
    /// Sharp corners, squared off past the miter limit.
    Miter,
}

/// Settings of a [`PathOffset`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetOptions {
    pub join_type: JoinType,
    /// Miter limit (as a multiple of `delta`) for [`JoinType::Miter`], arc
    /// tolerance for [`JoinType::Round`]; unused for square joins.
    pub limit: f64,
    /// Drops empty paths and duplicate vertices and fixes orientation before
    /// offsetting.
    pub auto_fix: bool,
}

impl Default for OffsetOptions {
    fn default() -> Self {
        Self {
            join_type: JoinType::Square,
            limit: 0.0,
            auto_fix: true,
        }
    }
}

/// Grows (`delta > 0`) or shrinks (`delta < 0`) closed paths.
///
/// Outer contours must have positive [`area`] and holes negative, as the
/// clipper emits them; `auto_fix` repairs inputs that are wound the other way
/// round as a whole.
///
/// # Algorithm
///
/// 1. Compute the unit outward normal of every edge.
/// 2. Move each vertex out along the normals of its two edges; convex
///    corners get a miter point, a square bevel or an arc.
/// 3. Union the raw result with itself to remove the loops that reflex
///    corners and narrow parts produce.
#[derive(Debug, Clone)]
pub struct PathOffset {
    paths: Paths,
    delta: f64,
    options: OffsetOptions,
}

impl PathOffset {
    #[must_use]
    pub fn new(paths: Paths, delta: f64) -> Self {
        Self {
            paths,
            delta,
            options: OffsetOptions::default(),
        }
    }

    #[must_use]
    pub fn options(mut self, options: OffsetOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.options.join_type = join_type;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: f64) -> Self {
        self.options.limit = limit;
        self
    }

    /// Executes the offset.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`](crate::error::InputError) when an offset
    /// vertex leaves the coordinate range, and an
    /// [`InvariantError`](crate::error::InvariantError) if the clean-up union
    /// fails.
    pub fn execute(&self) -> Result<Paths> {
        let delta = self.delta;
        if delta.abs() < NEAR_ZERO {
            return Ok(self.paths.clone());
        }

        let mut paths = self.paths.clone();
        if self.options.auto_fix && !auto_fix(&mut paths) {
            return Ok(Vec::new());
        }

        let join_type = self.options.join_type;
        let limit = match join_type {
            JoinType::Round if self.options.limit <= 0.0 => DEFAULT_ARC_TOLERANCE.min(delta.abs()),
            JoinType::Round => self.options.limit.min(delta.abs()),
            JoinType::Miter => self.options.limit.max(2.0),
            JoinType::Square => 1.0,
        };
        debug!(paths = paths.len(), delta, ?join_type, limit, "offsetting paths");

        let corners = Corners {
            delta,
            join_type,
            limit,
            arc_tolerance: match join_type {
                JoinType::Round => limit,
                JoinType::Square | JoinType::Miter => DEFAULT_ARC_TOLERANCE.min(delta.abs()),
            },
            min_miter: if limit > 2.0 { 2.0 / (limit * limit) } else { 0.5 },
        };
        let raw: Paths = paths
            .iter()
            .filter_map(|path| corners.offset_path(path))
            .filter(|path| !path.is_empty())
            .collect();

        let mut clipper = Clipper::new();
        clipper.add_paths(&raw, PolyType::Subject, true)?;
        if delta > 0.0 {
            return clipper.execute(ClipType::Union, PolyFillType::Positive, PolyFillType::Positive);
        }

        // Shrinking: union inside a reversed enclosing rectangle, whose own
        // contour is then dropped from the result.
        let Some(r) = clipper.bounds() else {
            return Ok(Vec::new());
        };
        let outer = path_from(&[
            (r.left - 10, r.bottom + 10),
            (r.right + 10, r.bottom + 10),
            (r.right + 10, r.top - 10),
            (r.left - 10, r.top - 10),
        ]);
        clipper.add_path(&outer, PolyType::Subject, true)?;
        let mut clipper = clipper.reverse_solution(true);
        let mut result = clipper.execute(ClipType::Union, PolyFillType::Negative, PolyFillType::Negative)?;
        result.retain(|path| !path.contains(&outer[0]));
        Ok(result)
    }
}

/// Offsets closed paths by `delta`.
///
/// # Errors
///
/// See [`PathOffset::execute`].
pub fn offset_paths(paths: &[Path], delta: f64, join_type: JoinType, limit: f64, auto_fix: bool) -> Result<Paths> {
    PathOffset::new(paths.to_vec(), delta)
        .options(OffsetOptions {
            join_type,
            limit,
            auto_fix,
        })
        .execute()
}

/// Drops consecutive duplicates and reverses every path when the one holding
/// the bottom-most (then left-most) vertex runs the wrong way. Returns `false`
/// when no path has any vertex.
fn auto_fix(paths: &mut Paths) -> bool {
    let Some(first) = paths.iter().position(|p| !p.is_empty()) else {
        return false;
    };
    let mut bot_pt = paths[first][0];
    let mut bot_idx = first;
    for (i, path) in paths.iter_mut().enumerate().skip(first) {
        if path.len() < 3 {
            continue;
        }
        path.dedup();
        for &pt in path.iter() {
            if pt.y > bot_pt.y || (pt.y == bot_pt.y && pt.x < bot_pt.x) {
                bot_pt = pt;
                bot_idx = i;
            }
        }
    }
    if !orientation(&paths[bot_idx]) {
        reverse_paths(paths);
    }
    true
}

/// Unit normal of the edge `pt1 -> pt2`, pointing right of it in a Y-up frame.
#[allow(clippy::cast_precision_loss)]
fn unit_normal(pt1: IntPoint, pt2: IntPoint) -> Vector2 {
    if pt1 == pt2 {
        return Vector2::zeros();
    }
    let d = Vector2::new((pt2.x - pt1.x) as f64, (pt2.y - pt1.y) as f64).normalize();
    Vector2::new(d.y, -d.x)
}

#[allow(clippy::cast_precision_loss)]
fn offset_point(pt: IntPoint, normal: Vector2, delta: f64) -> IntPoint {
    IntPoint::new(
        round(pt.x as f64 + normal.x * delta),
        round(pt.y as f64 + normal.y * delta),
    )
}

/// Arc around `pt` from angle `a1` to `a2` with radius `r`, with vertices
/// close enough that no chord strays more than `limit` from the circle.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn build_arc(pt: IntPoint, a1: f64, a2: f64, r: f64, limit: f64) -> Path {
    let arc_frac = (a2 - a1).abs() / (2.0 * PI);
    let mut steps = (arc_frac * PI / (1.0 - limit / r.abs()).acos()) as i32;
    if steps < 2 {
        steps = 2;
    } else if steps > (MAX_ARC_STEPS * arc_frac) as i32 {
        steps = (MAX_ARC_STEPS * arc_frac) as i32;
    }
    let step = (a2 - a1) / f64::from(steps);
    let (s, c) = step.sin_cos();
    let mut v = Vector2::new(a1.cos(), a1.sin());
    let mut arc = Vec::with_capacity(steps.unsigned_abs() as usize + 1);
    for _ in 0..=steps {
        arc.push(IntPoint::new(pt.x + round(v.x * r), pt.y + round(v.y * r)));
        v = Vector2::new(v.x * c - s * v.y, v.x * s + v.y * c);
    }
    arc
}

/// Per-corner offset rules for one execute.
struct Corners {
    delta: f64,
    join_type: JoinType,
    limit: f64,
    /// Maximum distance of an arc chord from the true circle.
    arc_tolerance: f64,
    min_miter: f64,
}

impl Corners {
    /// Raw offset of one path, or `None` when the path disappears.
    fn offset_path(&self, path: &[IntPoint]) -> Option<Path> {
        let delta = self.delta;
        let mut len = path.len();
        if len > 1 && path[0] == path[len - 1] {
            len -= 1;
        }

        // Shrinking removes whole contours that are too small to survive.
        let a = area(path);
        let min_area = delta * delta * PI;
        if (delta < 0.0 && a > 0.0 && a < min_area) || (delta > 0.0 && a < 0.0 && -a < min_area) {
            return None;
        }
        if len == 0 || (len < 3 && delta <= 0.0) {
            return None;
        }
        if len == 1 {
            return Some(self.single_point(path[0]));
        }

        let path = &path[..len];
        let normals: Vec<Vector2> = (0..len)
            .map(|j| unit_normal(path[j], path[(j + 1) % len]))
            .collect();

        let mut out = Vec::with_capacity(len * 2);
        let mut k = len - 1;
        for j in 0..len {
            let (n_prev, n_next) = (normals[k], normals[j]);
            match self.join_type {
                JoinType::Miter => {
                    let r = 1.0 + n_next.dot(&n_prev);
                    if r >= self.min_miter {
                        self.miter(&mut out, path[j], n_prev, n_next, r);
                    } else {
                        self.square(&mut out, path[j], n_prev, n_next, self.limit);
                    }
                }
                JoinType::Square => self.square(&mut out, path[j], n_prev, n_next, 1.0),
                JoinType::Round => self.round(&mut out, path[j], n_prev, n_next),
            }
            k = j;
        }
        Some(out)
    }

    /// A lone vertex grows into a circle of radius `|delta|` whatever the
    /// join type.
    fn single_point(&self, pt: IntPoint) -> Path {
        build_arc(pt, 0.0, 2.0 * PI, self.delta.abs(), self.arc_tolerance)
    }

    /// Whether the corner turns away from the offset side.
    fn is_convex(&self, n_prev: Vector2, n_next: Vector2) -> bool {
        n_prev.perp(&n_next) * self.delta >= 0.0
    }

    /// Reflex corners are bridged through the vertex itself; the loop this
    /// creates is removed by the clean-up union.
    fn reflex(&self, out: &mut Path, pt: IntPoint, n_prev: Vector2, n_next: Vector2) {
        out.push(offset_point(pt, n_prev, self.delta));
        out.push(pt);
        out.push(offset_point(pt, n_next, self.delta));
    }

    #[allow(clippy::cast_possible_truncation)]
    fn square(&self, out: &mut Path, pt: IntPoint, n_prev: Vector2, n_next: Vector2, mul: f64) {
        if !self.is_convex(n_prev, n_next) {
            self.reflex(out, pt, n_prev, n_next);
            return;
        }
        let pt1 = offset_point(pt, n_prev, self.delta);
        let pt2 = offset_point(pt, n_next, self.delta);
        let a1 = n_prev.y.atan2(n_prev.x);
        let a2 = (-n_next.y).atan2(-n_next.x);
        let mut turn = (a2 - a1).abs();
        if turn > PI {
            turn = 2.0 * PI - turn;
        }
        let dx = ((PI - turn) / 4.0).tan() * (self.delta * mul).abs();
        out.push(IntPoint::new(
            (pt1.x as f64 - n_prev.y * dx) as i64,
            (pt1.y as f64 + n_prev.x * dx) as i64,
        ));
        out.push(IntPoint::new(
            (pt2.x as f64 + n_next.y * dx) as i64,
            (pt2.y as f64 - n_next.x * dx) as i64,
        ));
    }

    #[allow(clippy::cast_precision_loss)]
    fn miter(&self, out: &mut Path, pt: IntPoint, n_prev: Vector2, n_next: Vector2, r: f64) {
        if !self.is_convex(n_prev, n_next) {
            self.reflex(out, pt, n_prev, n_next);
            return;
        }
        let q = self.delta / r;
        let m = (n_prev + n_next) * q;
        out.push(IntPoint::new(
            round(pt.x as f64 + m.x),
            round(pt.y as f64 + m.y),
        ));
    }

    fn round(&self, out: &mut Path, pt: IntPoint, n_prev: Vector2, n_next: Vector2) {
        out.push(offset_point(pt, n_prev, self.delta));
        if self.is_convex(n_prev, n_next) {
            if n_next.dot(&n_prev) < ROUND_MIN_COS {
                let a1 = n_prev.y.atan2(n_prev.x);
                let mut a2 = n_next.y.atan2(n_next.x);
                if self.delta > 0.0 && a2 < a1 {
                    a2 += 2.0 * PI;
                } else if self.delta < 0.0 && a2 > a1 {
                    a2 -= 2.0 * PI;
                }
                out.extend(build_arc(pt, a1, a2, self.delta, self.arc_tolerance));
            }
        } else {
            out.push(pt);
        }
        out.push(offset_point(pt, n_next, self.delta));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x: i64, y: i64, size: i64) -> Path {
        path_from(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
    }

    fn total_area(paths: &Paths) -> f64 {
        paths.iter().map(|p| area(p)).sum()
    }

    #[test]
    fn normals_point_outward() {
        let n = unit_normal(IntPoint::new(0, 0), IntPoint::new(10, 0));
        assert_relative_eq!(n.x, 0.0);
        assert_relative_eq!(n.y, -1.0);
        assert_eq!(unit_normal(IntPoint::new(3, 3), IntPoint::new(3, 3)), Vector2::zeros());
    }

    #[test]
    fn full_arc_is_a_closed_circle() {
        let arc = build_arc(IntPoint::new(0, 0), 0.0, 2.0 * PI, 10.0, 0.25);
        assert!(arc.len() > 8);
        assert_eq!(arc[0], IntPoint::new(10, 0));
        assert_eq!(*arc.last().unwrap(), IntPoint::new(10, 0));
        assert!(arc.iter().all(|p| (p.x * p.x + p.y * p.y - 100).abs() <= 20));
    }

    #[test]
    fn miter_grows_square_exactly() {
        let out = offset_paths(&[square(0, 0, 10)], 1.0, JoinType::Miter, 2.0, true).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 4);
        assert_relative_eq!(area(&out[0]), 144.0);
    }

    #[test]
    fn shrinking_drops_the_enclosing_rectangle() {
        let out = offset_paths(&[square(0, 0, 10)], -1.0, JoinType::Miter, 2.0, true).unwrap();
        assert_eq!(out.len(), 1);
        assert_relative_eq!(area(&out[0]), 64.0);
        assert!(out[0].iter().all(|p| (1..=9).contains(&p.x) && (1..=9).contains(&p.y)));
    }

    #[test]
    fn offset_round_trip_restores_convex_polygon() {
        let grown = offset_paths(&[square(0, 0, 10)], 2.0, JoinType::Miter, 2.0, true).unwrap();
        let back = offset_paths(&grown, -2.0, JoinType::Miter, 2.0, true).unwrap();
        assert_eq!(back.len(), 1);
        assert_relative_eq!(area(&back[0]), 100.0);
    }

    #[test]
    fn area_is_monotonic_in_delta() {
        let base = vec![square(0, 0, 100)];
        let areas: Vec<f64> = [-20.0, -10.0, 0.0, 10.0, 20.0]
            .iter()
            .map(|&d| total_area(&offset_paths(&base, d, JoinType::Round, 0.25, true).unwrap()))
            .collect();
        assert!(areas.windows(2).all(|w| w[0] < w[1]), "{areas:?}");
        assert_relative_eq!(areas[2], 10_000.0);
    }

    #[test]
    fn round_corners_stay_within_the_circle() {
        let out = offset_paths(&[square(0, 0, 10)], 2.0, JoinType::Round, 0.25, true).unwrap();
        assert_eq!(out.len(), 1);
        let a = area(&out[0]);
        // 100 + 4 * 10 * 2 + pi * 4, less the arc chords.
        assert!(a > 150.0 && a < 180.0 + 4.0 * PI, "{a}");
    }

    #[test]
    fn wrongly_wound_input_is_fixed() {
        let mut reversed = square(0, 0, 10);
        reversed.reverse();
        let out = offset_paths(&[reversed], 1.0, JoinType::Square, 0.0, true).unwrap();
        assert_eq!(out.len(), 1);
        assert!(area(&out[0]) > 100.0);
    }

    #[test]
    fn single_point_becomes_a_circle_for_every_join_type() {
        let circle = PI * 10.0 * 10.0;
        for (join_type, limit) in [(JoinType::Miter, 2.0), (JoinType::Square, 0.0), (JoinType::Round, 0.25)] {
            let out = offset_paths(&[path_from(&[(0, 0)])], 10.0, join_type, limit, true).unwrap();
            assert_eq!(out.len(), 1, "{join_type:?}");
            assert!(out[0].len() >= 12, "{join_type:?}: {} vertices", out[0].len());
            let a = area(&out[0]);
            assert!(a > 0.95 * circle && a < 1.01 * circle, "{join_type:?}: area {a}");
        }
    }

    #[test]
    fn single_point_circle_follows_the_arc_tolerance() {
        let coarse = PathOffset::new(vec![path_from(&[(5, 5)])], 20.0)
            .join_type(JoinType::Round)
            .limit(2.0)
            .execute()
            .unwrap();
        let fine = PathOffset::new(vec![path_from(&[(5, 5)])], 20.0)
            .join_type(JoinType::Round)
            .limit(0.1)
            .execute()
            .unwrap();
        assert_eq!(coarse.len(), 1);
        assert_eq!(fine.len(), 1);
        assert!(coarse[0].len() < fine[0].len());
        assert!(area(&coarse[0]) < area(&fine[0]));
    }

    #[test]
    fn negligible_delta_returns_input() {
        let input = vec![square(0, 0, 10)];
        assert_eq!(PathOffset::new(input.clone(), 0.0).execute().unwrap(), input);
    }

    #[test]
    fn tiny_contours_vanish_when_shrunk() {
        let out = offset_paths(&[square(0, 0, 4)], -3.0, JoinType::Square, 0.0, true).unwrap();
        assert!(out.is_empty());
    }
}
