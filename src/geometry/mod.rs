//! Planar geometry helpers for obstacle footprints

pub mod polygon2d;

pub use polygon2d::{point_segment_distance, segments_intersect, Polygon2d};
