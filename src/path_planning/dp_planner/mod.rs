//! DP Seed Planner Module
//!
//! Coarse trajectory search for on-road driving. The road is sampled as a
//! lattice of time layers, station increments and lateral positions between
//! the road bounds; a forward dynamic program picks the cheapest
//! collision-free chain and densifies it into a time-stamped Cartesian
//! trajectory, used as the initial guess of a downstream optimizer.
//!
//! # Components
//!
//! - `config`: planner parameters and cost weights, loadable from YAML
//! - `lattice`: time, station and lateral samples
//! - `interpolation`: segments between lattice states mapped to world coordinates
//! - `cost`: transition and collision costs
//! - `planner`: layer-by-layer search and path reconstruction
//! - `trajectory`: the densified output
//!
//! # Example
//!
//! ```no_run
//! use cartesian_planner::environment::{Environment, ReferenceLine};
//! use cartesian_planner::path_planning::dp_planner::{DpPlanner, DpPlannerConfig};
//!
//! let reference = ReferenceLine::from_waypoints(&[0.0, 200.0], &[0.0, 0.0], 1.0, 5.0, 5.0).unwrap();
//! let env = Environment::new(reference);
//!
//! let mut planner = DpPlanner::new(DpPlannerConfig::default(), &env).unwrap();
//! if let Some(trajectory) = planner.plan(0.0, 0.0, 0.0) {
//!     println!("{} points, cost {:?}", trajectory.len(), planner.last_cost());
//! }
//! ```

pub mod config;
pub mod cost;
pub mod interpolation;
pub mod lattice;
pub mod planner;
pub mod trajectory;

// Re-exports
pub use config::{DpCostWeights, DpPlannerConfig};
pub use cost::{CostEvaluator, NodeState, Transition};
pub use interpolation::{Segment, SegmentPoint, SegmentPoints};
pub use lattice::{linspace, Lattice};
pub use planner::{ChainNode, DpPlanner, StateCell, StateIndex};
pub use trajectory::{DiscretizedTrajectory, TrajectoryPoint};
