//! Discretized reference line with road bounds.
//!
//! The reference is stored as densely sampled points (station, pose,
//! curvature, corridor half-widths); queries between samples interpolate
//! linearly and queries past either end extrapolate along the end heading.

use itertools::Itertools;

use crate::common::{normalize_angle, PlannerError, PlannerResult, Point2D, RoadBounds};
use crate::path_planning::cubic_spline_planner::calc_spline_course;

/// One sample of the reference line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub s: f64,
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub kappa: f64,
    pub left_bound: f64,
    pub right_bound: f64,
}

impl ReferencePoint {
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn bounds(&self) -> RoadBounds {
        RoadBounds::new(self.left_bound, self.right_bound)
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceLine {
    points: Vec<ReferencePoint>,
}

impl ReferenceLine {
    /// Build from pre-sampled points with strictly increasing stations
    pub fn new(points: Vec<ReferencePoint>) -> PlannerResult<Self> {
        if points.len() < 2 {
            return Err(PlannerError::InvalidReference(format!(
                "reference line needs at least 2 points, got {}",
                points.len()
            )));
        }
        if points.iter().tuple_windows().any(|(a, b)| b.s <= a.s) {
            return Err(PlannerError::InvalidReference(
                "reference stations must be strictly increasing".to_string(),
            ));
        }
        if points.iter().any(|p| p.left_bound < 0.0 || p.right_bound < 0.0) {
            return Err(PlannerError::InvalidReference(
                "road bounds must be non-negative half-widths".to_string(),
            ));
        }
        Ok(Self { points })
    }

    /// Smooth the waypoints with a cubic spline and sample every `resolution` metres.
    ///
    /// `left_width` and `right_width` are constant corridor half-widths; use
    /// [`ReferenceLine::with_bounds`] for station-dependent corridors.
    pub fn from_waypoints(
        x: &[f64],
        y: &[f64],
        resolution: f64,
        left_width: f64,
        right_width: f64,
    ) -> PlannerResult<Self> {
        let course = calc_spline_course(x, y, resolution)?;
        let points = (0..course.s.len())
            .map(|i| ReferencePoint {
                s: course.s[i],
                x: course.x[i],
                y: course.y[i],
                theta: course.yaw[i],
                kappa: course.curvature[i],
                left_bound: left_width,
                right_bound: right_width,
            })
            .collect();
        Self::new(points)
    }

    /// Replace the road bounds with `bounds(s)` evaluated at every sample
    pub fn with_bounds<F>(mut self, bounds: F) -> Self
    where
        F: Fn(f64) -> RoadBounds,
    {
        for p in &mut self.points {
            let b = bounds(p.s);
            p.left_bound = b.left_bound.max(0.0);
            p.right_bound = b.right_bound.max(0.0);
        }
        self
    }

    pub fn points(&self) -> &[ReferencePoint] {
        &self.points
    }

    pub fn start_station(&self) -> f64 {
        self.points[0].s
    }

    pub fn length(&self) -> f64 {
        self.points[self.points.len() - 1].s - self.points[0].s
    }

    /// Interpolated reference sample at station `s`; NaN yields the first sample
    pub fn evaluate_station(&self, s: f64) -> ReferencePoint {
        let first = &self.points[0];
        let last = &self.points[self.points.len() - 1];
        if s.is_nan() {
            return *first;
        }
        if s <= first.s {
            return extrapolate(first, s);
        }
        if s >= last.s {
            return extrapolate(last, s);
        }

        let upper = self.points.partition_point(|p| p.s <= s);
        let p0 = &self.points[upper - 1];
        let p1 = &self.points[upper];
        let ratio = (s - p0.s) / (p1.s - p0.s);
        let lerp = |a: f64, b: f64| a + (b - a) * ratio;

        ReferencePoint {
            s,
            x: lerp(p0.x, p1.x),
            y: lerp(p0.y, p1.y),
            theta: normalize_angle(p0.theta + normalize_angle(p1.theta - p0.theta) * ratio),
            kappa: lerp(p0.kappa, p1.kappa),
            left_bound: lerp(p0.left_bound, p1.left_bound),
            right_bound: lerp(p0.right_bound, p1.right_bound),
        }
    }

    /// World position at station `s` and lateral offset `l` (positive to the left)
    pub fn get_cartesian(&self, s: f64, l: f64) -> Point2D {
        let p = self.evaluate_station(s);
        Point2D::new(p.x - l * p.theta.sin(), p.y + l * p.theta.cos())
    }

    /// Station and signed lateral offset of the closest point on the reference
    pub fn get_projection(&self, point: Point2D) -> (f64, f64) {
        let last_segment = self.points.len() - 2;
        let mut best = (f64::INFINITY, 0.0, 0.0);

        for (i, (a, b)) in self.points.iter().tuple_windows().enumerate() {
            let seg = b.position().to_vector() - a.position().to_vector();
            let rel = point.to_vector() - a.position().to_vector();
            let len = seg.norm();
            let mut t = rel.dot(&seg) / (len * len);
            // the end segments extend past the sampled range
            if i != 0 {
                t = t.max(0.0);
            }
            if i != last_segment {
                t = t.min(1.0);
            }
            let foot = seg * t;
            let dist = (rel - foot).norm();
            if dist < best.0 {
                let l = (seg.x * rel.y - seg.y * rel.x) / len;
                best = (dist, a.s + t * len, l);
            }
        }
        (best.1, best.2)
    }
}

fn extrapolate(anchor: &ReferencePoint, s: f64) -> ReferencePoint {
    let ds = s - anchor.s;
    ReferencePoint {
        s,
        x: anchor.x + ds * anchor.theta.cos(),
        y: anchor.y + ds * anchor.theta.sin(),
        ..*anchor
    }
}
