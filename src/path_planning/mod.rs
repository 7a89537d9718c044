// Path Planning algorithms module

pub mod cubic_spline_planner;
pub mod dp_planner;

pub use cubic_spline_planner::{calc_spline_course, Spline2D, SplineCourse};
pub use dp_planner::{DiscretizedTrajectory, DpPlanner, DpPlannerConfig, TrajectoryPoint};
