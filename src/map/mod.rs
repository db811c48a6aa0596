//! Geo-referenced raster maps exchanged with the mapping pipeline.

pub mod grid_map;

pub use grid_map::{GridMap, Rect2d};
