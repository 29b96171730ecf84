//! Spatial resolution: which storey, space and host an element belongs to.

pub mod resolver;

pub use resolver::{display_name, SpatialResolver, MAX_SPATIAL_DEPTH, UNASSIGNED};
