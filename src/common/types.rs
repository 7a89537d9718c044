//! Common types used throughout cartesian_planner

use nalgebra::Vector2;

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Heading of the vector pointing from `self` to `other`
    pub fn heading_to(&self, other: &Point2D) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// 2D pose (position + orientation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Normalize an angle to [-pi, pi]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle;
    while a > std::f64::consts::PI {
        a -= 2.0 * std::f64::consts::PI;
    }
    while a < -std::f64::consts::PI {
        a += 2.0 * std::f64::consts::PI;
    }
    a
}

/// Road corridor at one station of the reference line.
///
/// Both bounds are half-widths measured from the reference line: `left_bound`
/// towards positive lateral offsets, `right_bound` towards negative ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadBounds {
    pub left_bound: f64,
    pub right_bound: f64,
}

impl RoadBounds {
    pub fn new(left_bound: f64, right_bound: f64) -> Self {
        Self { left_bound, right_bound }
    }

    /// Whether a lateral offset lies on the drivable road surface
    pub fn contains(&self, l: f64) -> bool {
        l >= -self.right_bound && l <= self.left_bound
    }

    /// Admissible lateral interval after shrinking both sides by `margin`.
    ///
    /// Returns `None` when the corridor is narrower than twice the margin.
    pub fn shrink(&self, margin: f64) -> Option<(f64, f64)> {
        let lb = -self.right_bound + margin;
        let ub = self.left_bound - margin;
        if ub < lb {
            None
        } else {
            Some((lb, ub))
        }
    }
}
