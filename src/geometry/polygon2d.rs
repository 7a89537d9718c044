//! Simple 2D polygon used for obstacle footprints.
//!
//! Vertices may be given in either winding order; the polygon is assumed to
//! be simple (non self-intersecting). Convexity is not required.

use itertools::Itertools;
use nalgebra::Vector2;

use crate::common::{PlannerError, PlannerResult, Point2D};

const EPSILON: f64 = 1e-9;

/// Closed polygon with a cached axis-aligned bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon2d {
    points: Vec<Point2D>,
    min: Point2D,
    max: Point2D,
}

impl Polygon2d {
    /// Build a polygon from its vertices (at least three)
    pub fn new(points: Vec<Point2D>) -> PlannerResult<Self> {
        if points.len() < 3 {
            return Err(PlannerError::InvalidParameter(format!(
                "polygon needs at least 3 vertices, got {}",
                points.len()
            )));
        }
        let (min_x, max_x) = points
            .iter()
            .map(|p| p.x)
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
            .unwrap_or((0.0, 0.0));
        let (min_y, max_y) = points
            .iter()
            .map(|p| p.y)
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
            .unwrap_or((0.0, 0.0));

        Ok(Self {
            points,
            min: Point2D::new(min_x, min_y),
            max: Point2D::new(max_x, max_y),
        })
    }

    /// Rectangle centred at `center` with its length axis along `heading`
    pub fn from_box(center: Point2D, heading: f64, length: f64, width: f64) -> PlannerResult<Self> {
        if length <= 0.0 || width <= 0.0 {
            return Err(PlannerError::InvalidParameter(format!(
                "box dimensions must be positive, got {} x {}",
                length, width
            )));
        }
        let (sin, cos) = heading.sin_cos();
        let hl = length / 2.0;
        let hw = width / 2.0;
        let corners = [(hl, hw), (-hl, hw), (-hl, -hw), (hl, -hw)]
            .iter()
            .map(|&(dx, dy)| {
                Point2D::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
            })
            .collect();
        Self::new(corners)
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Iterate over the closed edge loop
    pub fn edges(&self) -> impl Iterator<Item = (Point2D, Point2D)> + '_ {
        self.points
            .iter()
            .copied()
            .circular_tuple_windows::<(Point2D, Point2D)>()
    }

    /// Point containment (boundary counts as inside)
    pub fn contains_point(&self, p: Point2D) -> bool {
        if !self.bbox_contains(p, 0.0) {
            return false;
        }
        if self.edges().any(|(a, b)| point_segment_distance(p, a, b) < EPSILON) {
            return true;
        }

        // crossing number
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Whether the segment `from -> to` touches the polygon
    pub fn has_overlap(&self, from: Point2D, to: Point2D) -> bool {
        let seg_min = Point2D::new(from.x.min(to.x), from.y.min(to.y));
        let seg_max = Point2D::new(from.x.max(to.x), from.y.max(to.y));
        if seg_max.x < self.min.x
            || seg_min.x > self.max.x
            || seg_max.y < self.min.y
            || seg_min.y > self.max.y
        {
            return false;
        }

        self.contains_point(from)
            || self.contains_point(to)
            || self.edges().any(|(a, b)| segments_intersect(from, to, a, b))
    }

    /// Distance from a point to the polygon, zero when inside
    pub fn distance_to(&self, p: Point2D) -> f64 {
        if self.contains_point(p) {
            return 0.0;
        }
        self.edges()
            .map(|(a, b)| point_segment_distance(p, a, b))
            .fold(f64::INFINITY, f64::min)
    }

    fn bbox_contains(&self, p: Point2D, tolerance: f64) -> bool {
        p.x >= self.min.x - tolerance
            && p.x <= self.max.x + tolerance
            && p.y >= self.min.y - tolerance
            && p.y <= self.max.y + tolerance
    }
}

#[inline]
fn cross(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Check if point p lies within the bounding box of segment (a, b).
#[inline]
fn point_on_segment(p: Point2D, a: Point2D, b: Point2D) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Check if two line segments intersect, touching included.
pub fn segments_intersect(a1: Point2D, a2: Point2D, b1: Point2D, b2: Point2D) -> bool {
    let (va1, va2, vb1, vb2) = (a1.to_vector(), a2.to_vector(), b1.to_vector(), b2.to_vector());
    let d1 = cross(vb2 - vb1, va1 - vb1);
    let d2 = cross(vb2 - vb1, va2 - vb1);
    let d3 = cross(va2 - va1, vb1 - va1);
    let d4 = cross(va2 - va1, vb2 - va1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // collinear cases
    (d1.abs() < EPSILON && point_on_segment(a1, b1, b2))
        || (d2.abs() < EPSILON && point_on_segment(a2, b1, b2))
        || (d3.abs() < EPSILON && point_on_segment(b1, a1, a2))
        || (d4.abs() < EPSILON && point_on_segment(b2, a1, a2))
}

/// Distance from a point to the segment (a, b)
pub fn point_segment_distance(p: Point2D, a: Point2D, b: Point2D) -> f64 {
    let ab = b.to_vector() - a.to_vector();
    let ap = p.to_vector() - a.to_vector();
    let len_sq = ab.norm_squared();
    if len_sq < EPSILON * EPSILON {
        return ap.norm();
    }
    let t = (ap.dot(&ab) / len_sq).clamp(0.0, 1.0);
    (ap - ab * t).norm()
}
