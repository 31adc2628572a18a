// Axis-aligned rectangle primitive.
//
// `Rect` stores a top-left corner and a size, with y growing downward as on
// a screen. Every mesh node and every obstacle is a `Rect`; the predicates
// here decide which nodes an obstacle hits (`intersects`), which nodes are
// adjacent (`touches`), and which node covers a query point
// (`contains_point`).
//
// Edge coincidence is compared with an absolute tolerance of `GEOM_EPSILON`
// map units, so rectangles produced by `from_corners` (whose `right()` may
// differ from the corner it was built from in the last bit) still abut.
// On integer-valued layouts this is identical to exact comparison.
//
// See also: `mesh.rs`, which builds ring pieces out of these predicates.

use serde::{Deserialize, Serialize};

/// Absolute tolerance for coordinate comparisons, in map units.
pub const GEOM_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Build from top-left `(x0, y0)` and bottom-right `(x1, y1)`. An
    /// inverted pair yields a zero-size (degenerate) rectangle.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x: x0,
            y: y0,
            w: (x1 - x0).max(0.0),
            h: (y1 - y0).max(0.0),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// True when either side has (near) zero length. Degenerate rectangles
    /// are never inserted into a mesh.
    pub fn is_degenerate(&self) -> bool {
        !(self.w > GEOM_EPSILON && self.h > GEOM_EPSILON)
    }

    /// Open rectangles overlap with positive area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() - GEOM_EPSILON
            && self.y < other.bottom() - GEOM_EPSILON
            && self.right() > other.x + GEOM_EPSILON
            && self.bottom() > other.y + GEOM_EPSILON
    }

    /// `other` lies entirely within `self`, shared boundary included.
    pub fn contains(&self, other: &Rect) -> bool {
        self.x <= other.x + GEOM_EPSILON
            && self.y <= other.y + GEOM_EPSILON
            && self.right() >= other.right() - GEOM_EPSILON
            && self.bottom() >= other.bottom() - GEOM_EPSILON
    }

    /// The closed rectangles share a boundary segment of positive length.
    ///
    /// Corner-only contact and overlapping interiors are both rejected.
    pub fn touches(&self, other: &Rect) -> bool {
        if self.intersects(other) {
            return false;
        }
        let abut_x = approx_eq(self.x, other.right()) || approx_eq(self.right(), other.x);
        let abut_y = approx_eq(self.y, other.bottom()) || approx_eq(self.bottom(), other.y);
        let overlap_y = self.bottom().min(other.bottom()) - self.y.max(other.y);
        let overlap_x = self.right().min(other.right()) - self.x.max(other.x);
        (abut_x && overlap_y > GEOM_EPSILON) || (abut_y && overlap_x > GEOM_EPSILON)
    }

    /// The closed rectangles share at least one point (edge or corner).
    pub fn meets(&self, other: &Rect) -> bool {
        self.x <= other.right() + GEOM_EPSILON
            && other.x <= self.right() + GEOM_EPSILON
            && self.y <= other.bottom() + GEOM_EPSILON
            && other.y <= self.bottom() + GEOM_EPSILON
    }

    /// Strict interior containment: points on the boundary belong to no
    /// rectangle.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.x < x && self.y < y && self.right() > x && self.bottom() > y
    }

    /// Overlap of two rectangles, or `None` when they do not intersect.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect::from_corners(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        ))
    }

    /// Smallest rectangle enclosing every input, or `None` for no input.
    pub fn bounding<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        let mut iter = rects.into_iter();
        let first = iter.next()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.right(), first.bottom());
        for r in iter {
            x0 = x0.min(r.x);
            y0 = y0.min(r.y);
            x1 = x1.max(r.right());
            y1 = y1.max(r.bottom());
        }
        Some(Rect::from_corners(x0, y0, x1, y1))
    }

    /// Euclidean distance between centers.
    pub fn distance_to(&self, other: &Rect) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }

    /// Manhattan distance between centers.
    pub fn manhattan_distance_to(&self, other: &Rect) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).abs() + (ay - by).abs()
    }
}

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= GEOM_EPSILON
}

/// Area of the union of `rects`, by coordinate compression. Quadratic in
/// the number of distinct edges per axis; meant for audits, not hot paths.
pub fn union_area(rects: &[Rect]) -> f64 {
    let live: Vec<&Rect> = rects.iter().filter(|r| !r.is_degenerate()).collect();
    if live.is_empty() {
        return 0.0;
    }
    let mut xs: Vec<f64> = live.iter().flat_map(|r| [r.x, r.right()]).collect();
    let mut ys: Vec<f64> = live.iter().flat_map(|r| [r.y, r.bottom()]).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();
    ys.sort_by(f64::total_cmp);
    ys.dedup();

    let mut area = 0.0;
    for xw in xs.windows(2) {
        for yw in ys.windows(2) {
            let (cx, cy) = ((xw[0] + xw[1]) / 2.0, (yw[0] + yw[1]) / 2.0);
            if live.iter().any(|r| r.contains_point(cx, cy)) {
                area += (xw[1] - xw[0]) * (yw[1] - yw[0]);
            }
        }
    }
    area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_and_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.center(), (25.0, 40.0));
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.area(), 1200.0);
    }

    #[test]
    fn degenerate_sizes() {
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_degenerate());
        assert!(Rect::new(0.0, 0.0, 5.0, 0.0).is_degenerate());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
        // Inverted corners clamp to zero size.
        assert!(Rect::from_corners(5.0, 0.0, 3.0, 4.0).is_degenerate());
    }

    #[test]
    fn intersects_requires_positive_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        // Shared edge only.
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 10.0, 10.0)));
        // Shared corner only.
        assert!(!a.intersects(&Rect::new(10.0, 10.0, 10.0, 10.0)));
        // Disjoint.
        assert!(!a.intersects(&Rect::new(20.0, 20.0, 1.0, 1.0)));
    }

    #[test]
    fn contains_is_inclusive() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.contains(&a));
        assert!(a.contains(&Rect::new(2.0, 2.0, 8.0, 8.0)));
        assert!(!a.contains(&Rect::new(2.0, 2.0, 9.0, 8.0)));
    }

    #[test]
    fn touches_needs_positive_length_edge() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        // Full shared edge on the east.
        assert!(a.touches(&Rect::new(10.0, 0.0, 5.0, 10.0)));
        // Partial shared edge on the south, wider neighbor.
        assert!(a.touches(&Rect::new(-5.0, 10.0, 30.0, 3.0)));
        // Smaller neighbor on the west.
        assert!(a.touches(&Rect::new(-2.0, 4.0, 2.0, 2.0)));
        // Corner only.
        assert!(!a.touches(&Rect::new(10.0, 10.0, 5.0, 5.0)));
        // Overlap is not touching.
        assert!(!a.touches(&Rect::new(5.0, 0.0, 10.0, 10.0)));
        // Collinear but separated.
        assert!(!a.touches(&Rect::new(10.0, 20.0, 5.0, 5.0)));
    }

    #[test]
    fn touches_is_symmetric() {
        let a = Rect::new(0.0, 0.0, 32.0, 32.0);
        let b = Rect::new(32.0, 8.0, 64.0, 8.0);
        assert!(a.touches(&b));
        assert!(b.touches(&a));
    }

    #[test]
    fn meets_includes_corners() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.meets(&Rect::new(10.0, 10.0, 1.0, 1.0)));
        assert!(a.meets(&Rect::new(10.0, 3.0, 1.0, 1.0)));
        assert!(!a.meets(&Rect::new(11.0, 3.0, 1.0, 1.0)));
    }

    #[test]
    fn contains_point_is_strict() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.contains_point(5.0, 5.0));
        assert!(!a.contains_point(0.0, 5.0));
        assert!(!a.contains_point(10.0, 5.0));
        assert!(!a.contains_point(5.0, 10.0));
    }

    #[test]
    fn intersection_and_bounding() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 2.0, 10.0, 4.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 2.0, 5.0, 4.0)));
        assert_eq!(a.intersection(&Rect::new(10.0, 0.0, 1.0, 1.0)), None);
        assert_eq!(Rect::bounding([&a, &b]), Some(Rect::new(0.0, 0.0, 15.0, 10.0)));
        assert_eq!(Rect::bounding(std::iter::empty::<&Rect>()), None);
    }

    #[test]
    fn distances_between_centers() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(3.0, 4.0, 2.0, 2.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(a.manhattan_distance_to(&b), 7.0);
    }

    #[test]
    fn union_area_counts_overlap_once() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 5.0, 10.0, 10.0),
            Rect::new(100.0, 100.0, 0.0, 4.0),
        ];
        assert_eq!(union_area(&rects), 175.0);
        assert_eq!(union_area(&[]), 0.0);
    }
}
