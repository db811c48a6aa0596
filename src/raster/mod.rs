//! Compact in-memory raster engine: datasets, coordinate systems,
//! transformers, output-grid suggestion and chunked warping.

pub mod data_type;
pub mod dataset;
pub mod geo_transform;
pub mod srs;
pub mod suggest;
pub mod transformer;
pub mod warp;

pub use data_type::DataType;
pub use dataset::{MemDataset, RasterBand};
pub use geo_transform::GeoTransform;
pub use srs::{EPSG_ETRS89, EPSG_WEB_MERCATOR, EPSG_WGS84, SpatialRef};
pub use suggest::suggested_warp_output;
pub use transformer::{CoordTransform, GenImgProjTransformer, TransformerArgs};
pub use warp::{InitDest, ResamplingMethod, WarpOperation, WarpOptions};
