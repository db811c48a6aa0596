//! Geospatial warping of local grid maps.
//!
//! A warp runs through four stages: [`grid_adapter`] turns the map into a
//! source dataset, [`transform_builder`] sets up the projections,
//! [`grid_estimator`] sizes the destination and [`executor`] resamples into
//! it. [`MapWarper`] drives them.

pub mod executor;
pub mod grid_adapter;
pub mod grid_estimator;
pub mod transform_builder;
pub mod warper;

pub use executor::{ReadbackDepth, WarpExecutor, WarpedRaster, warped_roi};
pub use grid_adapter::{DatasetMeta, UtmZone, compute_dataset_meta, from_dataset, to_dataset};
pub use grid_estimator::{OutputGrid, estimate_output_grid};
pub use warper::{MapWarper, WarpStats};
