//! Core of an aerial mapping pipeline: a visual tracking adapter that turns
//! camera frames into poses and landmarks, and a warping engine that
//! reprojects local grid maps into a geodetic coordinate system.

pub mod config;
pub mod error;
pub mod geometry;
pub mod map;
pub mod ortho;
pub mod raster;
pub mod tracking;

pub use error::{Error, Result};
