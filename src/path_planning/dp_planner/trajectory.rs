//! Time-stamped Cartesian trajectory produced by the planner

/// One sample of the seed trajectory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    /// Time since the start of the plan [s]
    pub time: f64,
    /// Achieved station along the reference line [m]
    pub s: f64,
    /// Lateral offset from the reference line [m]
    pub l: f64,
    pub x: f64,
    pub y: f64,
    /// Heading [rad]
    pub theta: f64,
    /// Speed towards the next sample [m/s]
    pub velocity: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscretizedTrajectory {
    points: Vec<TrajectoryPoint>,
}

impl DiscretizedTrajectory {
    pub fn new(points: Vec<TrajectoryPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrajectoryPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// Time span covered
    pub fn duration(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) => b.time - a.time,
            _ => 0.0,
        }
    }

    /// Cartesian path length
    pub fn total_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| ((w[1].x - w[0].x).powi(2) + (w[1].y - w[0].y).powi(2)).sqrt())
            .sum()
    }
}

impl<'a> IntoIterator for &'a DiscretizedTrajectory {
    type Item = &'a TrajectoryPoint;
    type IntoIter = std::slice::Iter<'a, TrajectoryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
