//! Reprojection of local grid maps into a target coordinate system.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use nalgebra::MatrixXx3;
use tracing::info;

use crate::config::WarperSettings;
use crate::error::Result;
use crate::map::GridMap;
use crate::ortho::executor::WarpExecutor;
use crate::ortho::grid_adapter::{UtmZone, from_dataset, to_dataset};
use crate::ortho::grid_estimator::estimate_output_grid;
use crate::ortho::transform_builder::{extent_transformer, target_spatial_ref};
use crate::raster::{CoordTransform, MemDataset};

/// Counters over the lifetime of a [`MapWarper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WarpStats {
    /// Completed warps.
    pub warps: u64,
    /// Source and destination datasets created.
    pub datasets_allocated: u64,
}

/// Warps grid maps into the EPSG code it was configured with.
///
/// The target is fixed at construction; [`MapWarper::warp_map_to`] takes one
/// explicitly instead.
pub struct MapWarper {
    settings: WarperSettings,
    executor: WarpExecutor,
    warps: AtomicU64,
    datasets_allocated: AtomicU64,
}

impl MapWarper {
    pub fn new(settings: WarperSettings) -> Self {
        let executor = WarpExecutor::new(&settings);
        Self {
            settings,
            executor,
            warps: AtomicU64::new(0),
            datasets_allocated: AtomicU64::new(0),
        }
    }

    pub fn with_target_epsg(epsg: u32) -> Self {
        Self::new(WarperSettings::new(epsg))
    }

    pub fn settings(&self) -> &WarperSettings {
        &self.settings
    }

    pub fn target_epsg(&self) -> u32 {
        self.settings.target_epsg
    }

    pub fn stats(&self) -> WarpStats {
        WarpStats {
            warps: self.warps.load(Ordering::Relaxed),
            datasets_allocated: self.datasets_allocated.load(Ordering::Relaxed),
        }
    }

    /// Warp `map`, whose coordinates are in `zone`, into the configured target.
    pub fn warp_map(&self, map: &GridMap, zone: impl Into<UtmZone>) -> Result<GridMap> {
        self.warp_map_to(map, zone, self.settings.target_epsg)
    }

    /// Warp `map` into `target_epsg`.
    ///
    /// Fails with `InvalidConfiguration` for an EPSG of 0 and with
    /// `UnsupportedInput` for maps without exactly one layer, both before
    /// any dataset is allocated.
    pub fn warp_map_to(
        &self,
        map: &GridMap,
        zone: impl Into<UtmZone>,
        target_epsg: u32,
    ) -> Result<GridMap> {
        let created_before = MemDataset::created_on_current_thread();
        let result = self.warp_into(map, zone.into(), target_epsg);
        let created = MemDataset::created_on_current_thread() - created_before;
        self.datasets_allocated.fetch_add(created, Ordering::Relaxed);
        result
    }

    fn warp_into(&self, map: &GridMap, zone: UtmZone, target_epsg: u32) -> Result<GridMap> {
        let started = Instant::now();
        let dst_srs = target_spatial_ref(target_epsg)?;

        let (src, meta) = to_dataset(map, zone)?;

        let projector = extent_transformer(&src, &dst_srs)?;
        let grid = estimate_output_grid(&src, &projector)?;

        let warped = self.executor.execute(&src, &grid, &dst_srs)?;

        let (roi, resolution) = warped.roi();
        self.warps.fetch_add(1, Ordering::Relaxed);
        info!(
            "Warped {}x{} {} map from zone {} to {}: {}x{} at resolution {} ({:.1} ms)",
            meta.cols,
            meta.rows,
            meta.data_type,
            zone,
            dst_srs,
            grid.cols,
            grid.rows,
            resolution,
            started.elapsed().as_secs_f64() * 1e3
        );
        Ok(from_dataset(warped.image, roi, resolution))
    }

    /// Reproject points given in `zone` (x, y, z rows) into the configured
    /// target. Heights are passed through.
    pub fn warp_points(
        &self,
        points: &MatrixXx3<f64>,
        zone: impl Into<UtmZone>,
    ) -> Result<MatrixXx3<f64>> {
        let dst_srs = target_spatial_ref(self.settings.target_epsg)?;
        let src_srs = zone.into().spatial_ref()?;
        let transform = CoordTransform::new(&src_srs, &dst_srs)?;

        let mut out = points.clone();
        for mut row in out.row_iter_mut() {
            let (x, y) = transform.transform(row[0], row[1])?;
            row[0] = x;
            row[1] = y;
        }
        Ok(out)
    }
}
