//! Common types, traits, and error definitions for cartesian_planner
//!
//! This module provides the foundational building blocks shared by the
//! environment model and the planners.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
