//! Environment model: reference line geometry and obstacles

pub mod reference_line;
#[allow(clippy::module_inception)]
pub mod environment;

pub use environment::{DynamicObstacle, Environment};
pub use reference_line::{ReferenceLine, ReferencePoint};
