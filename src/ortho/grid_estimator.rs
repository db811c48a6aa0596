//! Destination grid sizing.

use tracing::debug;

use crate::error::Result;
use crate::raster::{GenImgProjTransformer, GeoTransform, MemDataset, suggested_warp_output};

/// Size and placement of the destination raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGrid {
    pub cols: usize,
    pub rows: usize,
    pub geo_transform: GeoTransform,
}

impl OutputGrid {
    /// Ground size of a destination pixel.
    pub fn resolution(&self) -> f64 {
        self.geo_transform.pixel_width().abs()
    }
}

/// Grid that fully contains `src` reprojected through `transformer`
/// (an [`extent_transformer`](crate::ortho::transform_builder::extent_transformer)).
pub fn estimate_output_grid(
    src: &MemDataset,
    transformer: &GenImgProjTransformer,
) -> Result<OutputGrid> {
    let (cols, rows, geo_transform) =
        suggested_warp_output(src.raster_x_size(), src.raster_y_size(), transformer)?;
    let grid = OutputGrid {
        cols,
        rows,
        geo_transform,
    };
    debug!(
        "Output grid {}x{} (source {}x{}), resolution {}",
        cols,
        rows,
        src.raster_x_size(),
        src.raster_y_size(),
        grid.resolution()
    );
    Ok(grid)
}
