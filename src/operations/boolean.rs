use crate::clipper::{ClipType, Clipper, PolyFillType, PolyType};
use crate::error::Result;
use crate::math::{Path, Paths};

/// A boolean operation between two closed path sets sharing one fill rule.
#[derive(Debug, Clone, Copy)]
pub struct Boolean<'a> {
    subject: &'a [Path],
    clip: &'a [Path],
    fill: PolyFillType,
}

impl<'a> Boolean<'a> {
    #[must_use]
    pub fn new(subject: &'a [Path], clip: &'a [Path], fill: PolyFillType) -> Self {
        Self { subject, clip, fill }
    }

    /// Executes `clip_type` and returns outer contours with positive area and
    /// holes with negative area.
    ///
    /// # Errors
    ///
    /// Returns an error if any coordinate is out of range or the sweep fails.
    pub fn execute(&self, clip_type: ClipType) -> Result<Paths> {
        let mut clipper = Clipper::new();
        clipper.add_paths(self.subject, PolyType::Subject, true)?;
        clipper.add_paths(self.clip, PolyType::Clip, true)?;
        clipper.execute(clip_type, self.fill, self.fill)
    }
}

/// Region covered by `subject` or `clip`.
///
/// # Errors
///
/// See [`Boolean::execute`].
pub fn union(subject: &[Path], clip: &[Path], fill: PolyFillType) -> Result<Paths> {
    Boolean::new(subject, clip, fill).execute(ClipType::Union)
}

/// Region covered by both `subject` and `clip`.
///
/// # Errors
///
/// See [`Boolean::execute`].
pub fn intersection(subject: &[Path], clip: &[Path], fill: PolyFillType) -> Result<Paths> {
    Boolean::new(subject, clip, fill).execute(ClipType::Intersection)
}

/// Region covered by `subject` but not `clip`.
///
/// # Errors
///
/// See [`Boolean::execute`].
pub fn difference(subject: &[Path], clip: &[Path], fill: PolyFillType) -> Result<Paths> {
    Boolean::new(subject, clip, fill).execute(ClipType::Difference)
}

/// Region covered by exactly one of `subject` and `clip`.
///
/// # Errors
///
/// See [`Boolean::execute`].
pub fn xor(subject: &[Path], clip: &[Path], fill: PolyFillType) -> Result<Paths> {
    Boolean::new(subject, clip, fill).execute(ClipType::Xor)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::path_from;
    use crate::math::polygon_2d::{area, orientation, reverse_paths};
    use approx::assert_relative_eq;

    fn square(x: i64, y: i64, size: i64) -> Path {
        path_from(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
    }

    fn total_area(paths: &Paths) -> f64 {
        paths.iter().map(|p| area(p)).sum()
    }

    #[test]
    fn union_and_intersection_areas_add_up() {
        let triangle = vec![path_from(&[(0, 0), (20, 0), (0, 20)])];
        let sq = vec![square(5, 5, 10)];
        let fill = PolyFillType::NonZero;
        let u = union(&triangle, &sq, fill).unwrap();
        let i = intersection(&triangle, &sq, fill).unwrap();
        assert_relative_eq!(total_area(&i), 50.0);
        assert_relative_eq!(total_area(&u), 250.0);
        assert_relative_eq!(
            total_area(&u) + total_area(&i),
            total_area(&triangle) + total_area(&sq)
        );
    }

    #[test]
    fn self_operations() {
        let a = vec![square(0, 0, 10)];
        let fill = PolyFillType::EvenOdd;
        for out in [union(&a, &a, fill).unwrap(), intersection(&a, &a, fill).unwrap()] {
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].len(), 4);
            assert_relative_eq!(area(&out[0]), 100.0);
        }
        assert!(difference(&a, &a, fill).unwrap().is_empty());
    }

    #[test]
    fn difference_and_xor_of_overlapping_squares() {
        let a = vec![square(0, 0, 10)];
        let b = vec![square(5, 5, 10)];
        let fill = PolyFillType::EvenOdd;
        assert_relative_eq!(total_area(&difference(&a, &b, fill).unwrap()), 75.0);
        assert_relative_eq!(total_area(&difference(&b, &a, fill).unwrap()), 75.0);
        assert_relative_eq!(total_area(&xor(&a, &b, fill).unwrap()), 150.0);
    }

    #[test]
    fn reversing_flips_orientation() {
        let mut paths = union(&[square(0, 0, 10)], &[], PolyFillType::NonZero).unwrap();
        assert!(orientation(&paths[0]));
        reverse_paths(&mut paths);
        assert!(!orientation(&paths[0]));
        assert_relative_eq!(area(&paths[0]), -100.0);
    }

    #[test]
    fn star_fill_rules_differ_by_the_inner_pentagon() {
        // Pentagram over a circle of radius 100, drawn vertex 0, 2, 4, 1, 3.
        let star = vec![path_from(&[(0, 100), (59, -81), (-95, 31), (95, 31), (-59, -81)])];
        let even_odd = union(&star, &[], PolyFillType::EvenOdd).unwrap();
        let non_zero = union(&star, &[], PolyFillType::NonZero).unwrap();
        assert_eq!(non_zero.len(), 1);
        assert_eq!(non_zero[0].len(), 10);
        let pentagon = total_area(&non_zero) - total_area(&even_odd);
        // Inner pentagon of circumradius ~38.2 has an area of ~3469.
        assert!((3300.0..3650.0).contains(&pentagon), "{pentagon}");
    }

    #[test]
    fn star_outline_is_the_same_under_both_fill_rules() {
        // Traces the outline only, so it never crosses itself.
        let star = vec![path_from(&[
            (0, -100),
            (22, -30),
            (95, -30),
            (35, 10),
            (60, 80),
            (0, 35),
            (-60, 80),
            (-35, 10),
            (-95, -30),
            (-22, -30),
        ])];
        for fill in [PolyFillType::EvenOdd, PolyFillType::NonZero] {
            let out = union(&star, &star, fill).unwrap();
            assert_eq!(out.len(), 1, "{fill:?}");
            assert_eq!(out[0].len(), 10, "{fill:?}");
            assert_relative_eq!(area(&out[0]), 10_690.0);
        }
    }

    #[test]
    fn abutting_squares() {
        let a = vec![square(0, 0, 10)];
        let b = vec![square(10, 0, 10)];
        let fill = PolyFillType::NonZero;
        assert!(intersection(&a, &b, fill).unwrap().is_empty());
        let u = union(&a, &b, fill).unwrap();
        assert_eq!(u.len(), 1);
        assert_eq!(u[0].len(), 4);
        assert_relative_eq!(area(&u[0]), 200.0);
    }

    #[test]
    fn hole_nests_under_its_outer() {
        let mut clipper = Clipper::new();
        clipper
            .add_path(&square(0, 0, 20), PolyType::Subject, true)
            .unwrap();
        clipper
            .add_path(&square(5, 5, 10), PolyType::Clip, true)
            .unwrap();
        let tree = clipper
            .execute_tree(ClipType::Difference, PolyFillType::NonZero, PolyFillType::NonZero)
            .unwrap();
        assert_eq!(tree.total(), 2);
        let outer = tree.first().unwrap();
        let hole = tree.next(outer).unwrap();
        assert!(!tree.is_hole(outer));
        assert!(tree.is_hole(hole));
        assert_eq!(tree.node(hole).unwrap().parent(), Some(outer));
        assert_relative_eq!(area(tree.node(outer).unwrap().contour()), 400.0);
        assert_relative_eq!(area(tree.node(hole).unwrap().contour()), -100.0);
    }
}
