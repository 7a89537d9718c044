//! cartesian_planner - DP seed trajectory planning on curvy roads
//!
//! This crate provides the coarse search stage of a Cartesian on-road
//! trajectory planner: a reference-line road model, obstacle geometry and a
//! dynamic-programming planner that produces a collision-free seed trajectory.

// Core modules
pub mod common;
pub mod geometry;
pub mod utils;

// Planning modules
pub mod environment;
pub mod path_planning;

// Re-export common types for convenience
pub use common::{Point2D, Pose2D, RoadBounds};
pub use common::{PlanningEnvironment, TrajectoryPlanner};
pub use common::{PlannerError, PlannerResult};
pub use environment::{DynamicObstacle, Environment, ReferenceLine};
pub use geometry::Polygon2d;
pub use path_planning::{DiscretizedTrajectory, DpPlanner, DpPlannerConfig};
