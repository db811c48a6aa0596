//! Destination allocation, warping and band read-back.

use opencv::core::{Mat, Vector};
use opencv::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::WarperSettings;
use crate::error::{Error, Result};
use crate::map::Rect2d;
use crate::ortho::grid_estimator::OutputGrid;
use crate::ortho::transform_builder::reprojection_transformer;
use crate::raster::{
    DataType, GeoTransform, InitDest, MemDataset, ResamplingMethod, SpatialRef, WarpOperation,
    WarpOptions,
};

/// Pixel depth of the warped image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadbackDepth {
    /// Same depth as the source layer.
    #[default]
    MatchSource,
    /// 8 bits per channel; wider values saturate.
    Byte,
}

/// Warped multi-channel image with the geotransform it was written with.
#[derive(Debug)]
pub struct WarpedRaster {
    pub image: Mat,
    pub geo_transform: GeoTransform,
}

impl WarpedRaster {
    /// Region of interest and resolution of the warped image, see [`warped_roi`].
    pub fn roi(&self) -> (Rect2d, f64) {
        warped_roi(&self.geo_transform, self.image.rows(), self.image.cols())
    }
}

/// ROI and resolution of a warped raster of `rows` x `cols` pixels.
///
/// The origin is the lower-left corner. Width and height are one pixel short
/// of the raster extent, matching grid maps whose ROI spans pixel centres.
/// The resolution is the magnitude of the pixel width.
pub fn warped_roi(geo_transform: &GeoTransform, rows: i32, cols: i32) -> (Rect2d, f64) {
    let resolution = geo_transform.pixel_width().abs();
    let (origin_x, origin_y) = geo_transform.origin();
    let roi = Rect2d::new(
        origin_x,
        origin_y - f64::from(rows) * resolution,
        f64::from(cols) * resolution - resolution,
        f64::from(rows) * resolution - resolution,
    );
    (roi, resolution)
}

/// Runs a warp into a freshly allocated destination.
#[derive(Debug, Clone)]
pub struct WarpExecutor {
    resampling: ResamplingMethod,
    readback: ReadbackDepth,
    multithreaded: bool,
    memory_limit_bytes: usize,
}

impl WarpExecutor {
    pub fn new(settings: &WarperSettings) -> Self {
        Self {
            resampling: settings.resampling,
            readback: settings.readback,
            multithreaded: settings.multithreaded,
            memory_limit_bytes: settings.memory_limit_mb.max(1) * 1024 * 1024,
        }
    }

    /// In-memory destination sized by `grid`, with the source's band count
    /// and data type and the target projection.
    pub fn allocate_destination(
        &self,
        src: &MemDataset,
        grid: &OutputGrid,
        dst_srs: &SpatialRef,
    ) -> Result<MemDataset> {
        let mut dst =
            MemDataset::create(grid.cols, grid.rows, src.raster_count(), src.data_type())?;
        dst.set_projection(dst_srs.clone());
        dst.set_geo_transform(grid.geo_transform);
        Ok(dst)
    }

    /// Warp `src` over the whole of `dst`.
    pub fn warp(&self, src: &MemDataset, dst: &mut MemDataset) -> Result<()> {
        let transformer = reprojection_transformer(src, dst)?;
        let mut options = WarpOptions::new(transformer);
        options.resampling = self.resampling;
        options.init_dest = InitDest::NoData;
        options.multithreaded = self.multithreaded;
        options.memory_limit_bytes = self.memory_limit_bytes;
        // The last channel of a multi-channel layer is its alpha.
        let alpha = (src.raster_count() > 1).then(|| src.raster_count() - 1);
        options.src_alpha_band = alpha;
        options.dst_alpha_band = alpha;

        let operation = WarpOperation::new(options)?;
        let (cols, rows) = (dst.raster_x_size(), dst.raster_y_size());
        operation.chunk_and_warp_image(src, dst, 0, 0, cols, rows)
    }

    /// Read every band back and interleave them into one image.
    pub fn read_back(&self, dst: &MemDataset) -> Result<Mat> {
        let depth = match self.readback {
            ReadbackDepth::MatchSource => dst.data_type(),
            ReadbackDepth::Byte => DataType::Byte,
        };

        let mut channels = Vector::<Mat>::new();
        for band in dst.bands() {
            channels.push(band.read_into_mat(depth)?);
        }

        let mut image = Mat::default();
        opencv::core::merge(&channels, &mut image)?;
        Ok(image)
    }

    /// Allocate, warp and read back.
    pub fn execute(
        &self,
        src: &MemDataset,
        grid: &OutputGrid,
        dst_srs: &SpatialRef,
    ) -> Result<WarpedRaster> {
        let mut dst = self.allocate_destination(src, grid, dst_srs)?;
        self.warp(src, &mut dst)?;
        let image = self.read_back(&dst)?;

        let geo_transform = dst.geo_transform().ok_or_else(|| {
            Error::WarpFailed("destination lost its geotransform".into())
        })?;
        debug!(
            "Warped {} band(s) into {}x{} {:?} image",
            dst.raster_count(),
            image.cols(),
            image.rows(),
            self.readback
        );
        Ok(WarpedRaster {
            image,
            geo_transform,
        })
    }
}
