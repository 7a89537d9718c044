//! Common traits defining the planner's collaborator interfaces

use crate::common::types::*;
use crate::path_planning::DiscretizedTrajectory;

/// Read-only world model consumed by the planners.
///
/// Implementations must be `Sync`: the cells of one DP layer query them
/// concurrently. Station/lateral coordinates are measured along and
/// perpendicular to the reference line (positive lateral offsets to the left).
pub trait PlanningEnvironment: Sync {
    /// Road corridor half-widths at station `s`
    fn evaluate_station(&self, s: f64) -> RoadBounds;

    /// Map a (station, lateral offset) pair to world coordinates
    fn to_cartesian(&self, s: f64, l: f64) -> Point2D;

    /// Project a world point onto the reference line, returning (station, lateral offset)
    fn project(&self, point: Point2D) -> (f64, f64);

    /// Whether the segment `from -> to` at time `time` overlaps any obstacle
    fn check_collision(&self, from: Point2D, to: Point2D, time: f64) -> bool;

    /// Distance from `point` to the closest obstacle at time `time`
    ///
    /// Returns `f64::INFINITY` when there are no obstacles.
    fn clearance(&self, point: Point2D, time: f64) -> f64;
}

/// Trait for planners producing a time-parameterized seed trajectory
pub trait TrajectoryPlanner {
    /// Plan from the given start pose; `None` means no feasible trajectory this cycle
    fn plan_trajectory(&mut self, start: Pose2D) -> Option<DiscretizedTrajectory>;
}
