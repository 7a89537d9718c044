//! Static + dynamic obstacle world around a reference line

use crate::common::{PlannerError, PlannerResult, PlanningEnvironment, Point2D, RoadBounds};
use crate::geometry::Polygon2d;

use super::reference_line::ReferenceLine;

/// Obstacle whose footprint changes over time.
///
/// The footprint at a query time is the latest keyframe at or before it; the
/// obstacle does not exist before its first keyframe and keeps its last
/// footprint afterwards.
#[derive(Debug, Clone)]
pub struct DynamicObstacle {
    keyframes: Vec<(f64, Polygon2d)>,
}

impl DynamicObstacle {
    pub fn new(mut keyframes: Vec<(f64, Polygon2d)>) -> PlannerResult<Self> {
        if keyframes.is_empty() {
            return Err(PlannerError::InvalidParameter(
                "dynamic obstacle needs at least one keyframe".to_string(),
            ));
        }
        if keyframes.iter().any(|(t, _)| !t.is_finite()) {
            return Err(PlannerError::InvalidParameter(
                "dynamic obstacle keyframe times must be finite".to_string(),
            ));
        }
        keyframes.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { keyframes })
    }

    pub fn keyframes(&self) -> &[(f64, Polygon2d)] {
        &self.keyframes
    }

    /// Footprint active at `time`
    pub fn at(&self, time: f64) -> Option<&Polygon2d> {
        let idx = self.keyframes.partition_point(|(t, _)| *t <= time);
        if idx == 0 {
            None
        } else {
            Some(&self.keyframes[idx - 1].1)
        }
    }
}

/// Planning environment: reference line, static polygons, dynamic polygons
#[derive(Debug, Clone)]
pub struct Environment {
    reference: ReferenceLine,
    obstacles: Vec<Polygon2d>,
    dynamic_obstacles: Vec<DynamicObstacle>,
}

impl Environment {
    pub fn new(reference: ReferenceLine) -> Self {
        Self {
            reference,
            obstacles: Vec::new(),
            dynamic_obstacles: Vec::new(),
        }
    }

    pub fn with_obstacles(mut self, obstacles: Vec<Polygon2d>) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn add_obstacle(&mut self, obstacle: Polygon2d) {
        self.obstacles.push(obstacle);
    }

    pub fn add_dynamic_obstacle(&mut self, obstacle: DynamicObstacle) {
        self.dynamic_obstacles.push(obstacle);
    }

    pub fn reference(&self) -> &ReferenceLine {
        &self.reference
    }

    pub fn obstacles(&self) -> &[Polygon2d] {
        &self.obstacles
    }

    pub fn dynamic_obstacles(&self) -> &[DynamicObstacle] {
        &self.dynamic_obstacles
    }

    /// Every obstacle footprint present at `time`
    pub fn obstacles_at(&self, time: f64) -> impl Iterator<Item = &Polygon2d> + '_ {
        self.obstacles
            .iter()
            .chain(self.dynamic_obstacles.iter().filter_map(move |d| d.at(time)))
    }
}

impl PlanningEnvironment for Environment {
    fn evaluate_station(&self, s: f64) -> RoadBounds {
        self.reference.evaluate_station(s).bounds()
    }

    fn to_cartesian(&self, s: f64, l: f64) -> Point2D {
        self.reference.get_cartesian(s, l)
    }

    fn project(&self, point: Point2D) -> (f64, f64) {
        self.reference.get_projection(point)
    }

    fn check_collision(&self, from: Point2D, to: Point2D, time: f64) -> bool {
        self.obstacles_at(time).any(|o| o.has_overlap(from, to))
    }

    fn clearance(&self, point: Point2D, time: f64) -> f64 {
        self.obstacles_at(time)
            .map(|o| o.distance_to(point))
            .fold(f64::INFINITY, f64::min)
    }
}
