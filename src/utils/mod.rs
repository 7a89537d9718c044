//! Utility modules for cartesian_planner

pub mod visualization;

pub use visualization::{plot_scene, Visualizer, colors};
