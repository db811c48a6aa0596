//! Chunked resampling warp between two in-memory datasets.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::raster::dataset::{MemDataset, RasterBand};
use crate::raster::transformer::{GenImgProjTransformer, TransformerArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingMethod {
    #[default]
    Nearest,
    /// Falls back to nearest at edges, no-data and transparent pixels.
    Bilinear,
}

/// How the destination window is initialised before warping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InitDest {
    /// Band no-data value (NaN for float bands, 0 otherwise when unset).
    #[default]
    NoData,
    Value(f64),
}

#[derive(Debug, Clone)]
pub struct WarpOptions {
    pub transformer: TransformerArgs,
    pub resampling: ResamplingMethod,
    pub init_dest: InitDest,
    pub multithreaded: bool,
    /// Working memory for one chunk of destination rows.
    pub memory_limit_bytes: usize,
    /// Zero-based band whose zero values mark transparent source pixels.
    pub src_alpha_band: Option<usize>,
    /// Zero-based band receiving coverage: 0 where nothing landed, the
    /// source alpha (or [`OPAQUE_ALPHA`]) where a pixel was written.
    pub dst_alpha_band: Option<usize>,
}

/// Destination alpha written when the source carries no alpha band.
pub const OPAQUE_ALPHA: f64 = 255.0;

impl WarpOptions {
    pub fn new(transformer: TransformerArgs) -> Self {
        Self {
            transformer,
            resampling: ResamplingMethod::default(),
            init_dest: InitDest::default(),
            multithreaded: true,
            memory_limit_bytes: 64 * 1024 * 1024,
            src_alpha_band: None,
            dst_alpha_band: None,
        }
    }
}

/// Warped values of one destination row: `bands` values per pixel, `None`
/// where no source pixel contributes.
type RowSamples = Vec<Option<Vec<f64>>>;

pub struct WarpOperation {
    options: WarpOptions,
}

impl WarpOperation {
    pub fn new(options: WarpOptions) -> Result<Self> {
        if options.memory_limit_bytes == 0 {
            return Err(Error::InvalidConfiguration(
                "warp memory limit must be positive".into(),
            ));
        }
        // Fail early on unusable geotransforms or projections.
        GenImgProjTransformer::new(options.transformer.clone())?;
        if options.transformer.dst_geo_transform.is_none() {
            return Err(Error::InvalidConfiguration(
                "warp transformer needs a destination geotransform".into(),
            ));
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &WarpOptions {
        &self.options
    }

    /// Warp the destination window `(x_off, y_off, x_size, y_size)` in chunks
    /// of rows bounded by the memory limit.
    pub fn chunk_and_warp_image(
        &self,
        src: &MemDataset,
        dst: &mut MemDataset,
        x_off: usize,
        y_off: usize,
        x_size: usize,
        y_size: usize,
    ) -> Result<()> {
        self.validate(src, dst, x_off, y_off, x_size, y_size)?;
        if x_size == 0 || y_size == 0 {
            return Ok(());
        }

        self.init_destination(dst, x_off, y_off, x_size, y_size);

        let band_count = src.raster_count();
        let row_bytes = x_size * band_count * (std::mem::size_of::<f64>() + 1);
        let chunk_rows = (self.options.memory_limit_bytes / row_bytes.max(1)).clamp(1, y_size);

        let mut chunks = 0;
        let mut row = y_off;
        while row < y_off + y_size {
            let end = (row + chunk_rows).min(y_off + y_size);
            let samples = self.warp_rows(src, row..end, x_off, x_size)?;
            write_rows(dst.bands_mut(), row, x_off, samples);
            row = end;
            chunks += 1;
        }

        debug!(
            "Warped {}x{} window in {} chunk(s) of up to {} rows",
            x_size, y_size, chunks, chunk_rows
        );
        Ok(())
    }

    fn validate(
        &self,
        src: &MemDataset,
        dst: &MemDataset,
        x_off: usize,
        y_off: usize,
        x_size: usize,
        y_size: usize,
    ) -> Result<()> {
        if src.raster_count() != dst.raster_count() {
            return Err(Error::WarpFailed(format!(
                "source has {} bands, destination {}",
                src.raster_count(),
                dst.raster_count()
            )));
        }
        if x_off + x_size > dst.raster_x_size() || y_off + y_size > dst.raster_y_size() {
            return Err(Error::WarpFailed(format!(
                "window {x_off},{y_off} {x_size}x{y_size} exceeds destination {}x{}",
                dst.raster_x_size(),
                dst.raster_y_size()
            )));
        }
        for (name, alpha) in [
            ("source", self.options.src_alpha_band),
            ("destination", self.options.dst_alpha_band),
        ] {
            if let Some(band) = alpha
                && band >= src.raster_count()
            {
                return Err(Error::WarpFailed(format!(
                    "{name} alpha band {band} out of range"
                )));
            }
        }
        Ok(())
    }

    fn init_destination(
        &self,
        dst: &mut MemDataset,
        x_off: usize,
        y_off: usize,
        x_size: usize,
        y_size: usize,
    ) {
        for (index, band) in dst.bands_mut().iter_mut().enumerate() {
            if self.options.dst_alpha_band == Some(index) {
                band.fill_window(x_off, y_off, x_size, y_size, 0.0);
                continue;
            }
            let value = match self.options.init_dest {
                InitDest::NoData => {
                    let nd = band
                        .no_data()
                        .unwrap_or_else(|| band.data_type().default_no_data());
                    band.set_no_data(Some(nd));
                    nd
                }
                InitDest::Value(v) => v,
            };
            band.fill_window(x_off, y_off, x_size, y_size, value);
        }
    }

    fn warp_rows(
        &self,
        src: &MemDataset,
        rows: Range<usize>,
        x_off: usize,
        x_size: usize,
    ) -> Result<Vec<RowSamples>> {
        if self.options.multithreaded {
            // Each worker owns its transformer.
            rows.into_par_iter()
                .map_init(
                    || GenImgProjTransformer::new(self.options.transformer.clone()),
                    |transformer, row| match transformer {
                        Ok(t) => Ok(self.warp_row(src, t, row, x_off, x_size)),
                        Err(e) => Err(Error::WarpFailed(e.to_string())),
                    },
                )
                .collect()
        } else {
            let transformer = GenImgProjTransformer::new(self.options.transformer.clone())?;
            Ok(rows
                .map(|row| self.warp_row(src, &transformer, row, x_off, x_size))
                .collect())
        }
    }

    fn warp_row(
        &self,
        src: &MemDataset,
        transformer: &GenImgProjTransformer,
        row: usize,
        x_off: usize,
        x_size: usize,
    ) -> RowSamples {
        (x_off..x_off + x_size)
            .map(|col| {
                // Sample at the destination pixel centre.
                let (sx, sy) = transformer
                    .dst_to_src(col as f64 + 0.5, row as f64 + 0.5)
                    .ok()?;
                let values = match self.options.resampling {
                    ResamplingMethod::Nearest => self.sample_nearest(src, sx, sy),
                    ResamplingMethod::Bilinear => self
                        .sample_bilinear(src, sx, sy)
                        .or_else(|| self.sample_nearest(src, sx, sy)),
                }?;
                Some(self.mark_coverage(values))
            })
            .collect()
    }

    fn mark_coverage(&self, mut values: Vec<f64>) -> Vec<f64> {
        if let Some(dst_alpha) = self.options.dst_alpha_band {
            values[dst_alpha] = match self.options.src_alpha_band {
                Some(src_alpha) => values[src_alpha],
                None => OPAQUE_ALPHA,
            };
        }
        values
    }

    fn sample_nearest(&self, src: &MemDataset, sx: f64, sy: f64) -> Option<Vec<f64>> {
        let col = pixel_index(sx, src.raster_x_size())?;
        let row = pixel_index(sy, src.raster_y_size())?;
        self.read_pixel(src, col, row)
    }

    fn sample_bilinear(&self, src: &MemDataset, sx: f64, sy: f64) -> Option<Vec<f64>> {
        // Neighbourhood of pixel centres around (sx, sy).
        let (px, py) = (sx - 0.5, sy - 0.5);
        let (x0, y0) = (px.floor(), py.floor());
        let (fx, fy) = (px - x0, py - y0);
        let col0 = pixel_index(x0, src.raster_x_size())?;
        let row0 = pixel_index(y0, src.raster_y_size())?;
        let col1 = pixel_index(x0 + 1.0, src.raster_x_size())?;
        let row1 = pixel_index(y0 + 1.0, src.raster_y_size())?;

        let p00 = self.read_pixel(src, col0, row0)?;
        let p10 = self.read_pixel(src, col1, row0)?;
        let p01 = self.read_pixel(src, col0, row1)?;
        let p11 = self.read_pixel(src, col1, row1)?;

        Some(
            (0..p00.len())
                .map(|b| {
                    let top = p00[b] * (1.0 - fx) + p10[b] * fx;
                    let bottom = p01[b] * (1.0 - fx) + p11[b] * fx;
                    top * (1.0 - fy) + bottom * fy
                })
                .collect(),
        )
    }

    /// All band values of a source pixel, `None` if it is transparent or
    /// any band holds no-data.
    fn read_pixel(&self, src: &MemDataset, col: usize, row: usize) -> Option<Vec<f64>> {
        if let Some(alpha) = self.options.src_alpha_band
            && src.band(alpha)?.get(col, row) == 0.0
        {
            return None;
        }
        src.bands()
            .iter()
            .map(|band| {
                let v = band.get(col, row);
                (!band.is_no_data(v)).then_some(v)
            })
            .collect()
    }
}

fn pixel_index(coord: f64, size: usize) -> Option<usize> {
    if !coord.is_finite() || coord < 0.0 {
        return None;
    }
    let idx = coord.floor() as usize;
    (idx < size).then_some(idx)
}

fn write_rows(bands: &mut [RasterBand], first_row: usize, x_off: usize, rows: Vec<RowSamples>) {
    for (i, samples) in rows.into_iter().enumerate() {
        let row = first_row + i;
        for (j, pixel) in samples.into_iter().enumerate() {
            let Some(values) = pixel else { continue };
            for (band, value) in bands.iter_mut().zip(values) {
                band.set(x_off + j, row, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::data_type::DataType;
    use crate::raster::geo_transform::GeoTransform;
    use crate::raster::srs::SpatialRef;
    use crate::raster::suggest::suggested_warp_output;

    /// 4x4 source whose pixel (c, r) holds 10 * r + c.
    fn ramp_source(bands: usize) -> MemDataset {
        let mut src = MemDataset::create(4, 4, bands, DataType::Float32).unwrap();
        src.set_geo_transform(GeoTransform::north_up(500_000.0, 5_761_000.0, 1.0));
        src.set_projection(SpatialRef::utm(32, true).unwrap());
        for b in 0..bands {
            let band = src.band_mut(b).unwrap();
            for r in 0..4 {
                for c in 0..4 {
                    band.set(c, r, (10 * r + c) as f64);
                }
            }
        }
        src
    }

    fn options(dst_gt: GeoTransform) -> WarpOptions {
        let utm = SpatialRef::utm(32, true).unwrap();
        WarpOptions::new(TransformerArgs {
            src_geo_transform: GeoTransform::north_up(500_000.0, 5_761_000.0, 1.0),
            src_srs: utm.clone(),
            dst_srs: utm,
            dst_geo_transform: Some(dst_gt),
        })
    }

    fn destination(cols: usize, rows: usize, bands: usize, gt: GeoTransform) -> MemDataset {
        let mut dst = MemDataset::create(cols, rows, bands, DataType::Float32).unwrap();
        dst.set_geo_transform(gt);
        dst
    }

    #[test]
    fn test_identity_warp_copies_pixels() {
        let src = ramp_source(1);
        let gt = GeoTransform::north_up(500_000.0, 5_761_000.0, 1.0);
        let mut dst = destination(4, 4, 1, gt);

        let op = WarpOperation::new(options(gt)).unwrap();
        op.chunk_and_warp_image(&src, &mut dst, 0, 0, 4, 4).unwrap();

        assert_eq!(dst.band(0).unwrap().values(), src.band(0).unwrap().values());
    }

    #[test]
    fn test_uncovered_pixels_are_no_data() {
        let src = ramp_source(1);
        // Destination starts two pixels west of the source.
        let gt = GeoTransform::north_up(499_998.0, 5_761_000.0, 1.0);
        let mut dst = destination(6, 4, 1, gt);

        let op = WarpOperation::new(options(gt)).unwrap();
        op.chunk_and_warp_image(&src, &mut dst, 0, 0, 6, 4).unwrap();

        let band = dst.band(0).unwrap();
        assert!(band.get(0, 0).is_nan());
        assert!(band.get(1, 3).is_nan());
        assert_eq!(band.get(2, 0), 0.0);
        assert_eq!(band.get(5, 3), 33.0);
        assert!(band.no_data().unwrap().is_nan());
    }

    #[test]
    fn test_single_row_chunks_match_parallel() {
        let src = ramp_source(2);
        let gt = GeoTransform::north_up(500_000.0, 5_761_000.0, 0.5);

        let mut serial = destination(8, 8, 2, gt);
        let mut opts = options(gt);
        opts.multithreaded = false;
        opts.memory_limit_bytes = 1;
        WarpOperation::new(opts)
            .unwrap()
            .chunk_and_warp_image(&src, &mut serial, 0, 0, 8, 8)
            .unwrap();

        let mut parallel = destination(8, 8, 2, gt);
        WarpOperation::new(options(gt))
            .unwrap()
            .chunk_and_warp_image(&src, &mut parallel, 0, 0, 8, 8)
            .unwrap();

        for b in 0..2 {
            assert_eq!(
                serial.band(b).unwrap().values(),
                parallel.band(b).unwrap().values()
            );
        }
        // Half-size pixels: destination (3, 5) samples source (1, 2).
        assert_eq!(serial.band(0).unwrap().get(3, 5), 21.0);
    }

    #[test]
    fn test_transparent_source_pixels_are_skipped() {
        let mut src = ramp_source(2);
        // Second band is alpha; make source pixel (1, 1) transparent.
        src.band_mut(1).unwrap().set(1, 1, 0.0);
        let gt = GeoTransform::north_up(500_000.0, 5_761_000.0, 1.0);
        let mut dst = destination(4, 4, 2, gt);

        let mut opts = options(gt);
        opts.src_alpha_band = Some(1);
        opts.dst_alpha_band = Some(1);
        WarpOperation::new(opts)
            .unwrap()
            .chunk_and_warp_image(&src, &mut dst, 0, 0, 4, 4)
            .unwrap();

        assert!(dst.band(0).unwrap().get(1, 1).is_nan());
        // Pixel (0, 0) has alpha 0 in the ramp as well.
        assert!(dst.band(0).unwrap().get(0, 0).is_nan());
        assert_eq!(dst.band(0).unwrap().get(2, 1), 12.0);
    }

    #[test]
    fn test_destination_alpha_marks_coverage() {
        let src = ramp_source(2);
        // Destination starts one pixel west of the source.
        let gt = GeoTransform::north_up(499_999.0, 5_761_000.0, 1.0);
        let mut dst = destination(5, 4, 2, gt);

        let mut opts = options(gt);
        opts.dst_alpha_band = Some(1);
        WarpOperation::new(opts)
            .unwrap()
            .chunk_and_warp_image(&src, &mut dst, 0, 0, 5, 4)
            .unwrap();

        let alpha = dst.band(1).unwrap();
        for r in 0..4 {
            assert_eq!(alpha.get(0, r), 0.0);
            for c in 1..5 {
                assert_eq!(alpha.get(c, r), OPAQUE_ALPHA);
            }
        }
        assert_eq!(dst.band(0).unwrap().get(2, 1), 11.0);
    }

    #[test]
    fn test_destination_alpha_copies_source_alpha() {
        let mut src = ramp_source(2);
        src.band_mut(1).unwrap().set(3, 3, 128.0);
        let gt = GeoTransform::north_up(500_000.0, 5_761_000.0, 1.0);
        let mut dst = destination(4, 4, 2, gt);

        let mut opts = options(gt);
        opts.src_alpha_band = Some(1);
        opts.dst_alpha_band = Some(1);
        WarpOperation::new(opts)
            .unwrap()
            .chunk_and_warp_image(&src, &mut dst, 0, 0, 4, 4)
            .unwrap();

        let alpha = dst.band(1).unwrap();
        // Transparent source pixel leaves the initial coverage of 0.
        assert_eq!(alpha.get(0, 0), 0.0);
        assert_eq!(alpha.get(3, 3), 128.0);
        assert_eq!(alpha.get(2, 1), 12.0);
    }

    #[test]
    fn test_reprojection_between_utm_zones_keeps_values() {
        // 40x40 pixels of 10 m near the eastern edge of zone 32: west half
        // holds 50, east half 200.
        let utm32 = SpatialRef::utm(32, true).unwrap();
        let utm33 = SpatialRef::utm(33, true).unwrap();
        let src_gt = GeoTransform::north_up(700_000.0, 5_761_000.0, 10.0);
        let mut src = MemDataset::create(40, 40, 1, DataType::Byte).unwrap();
        src.set_geo_transform(src_gt);
        src.set_projection(utm32.clone());
        let band = src.band_mut(0).unwrap();
        for r in 0..40 {
            for c in 0..40 {
                band.set(c, r, if c < 20 { 50.0 } else { 200.0 });
            }
        }

        let mut args = TransformerArgs {
            src_geo_transform: src_gt,
            src_srs: utm32,
            dst_srs: utm33.clone(),
            dst_geo_transform: None,
        };
        let extent = GenImgProjTransformer::new(args.clone()).unwrap();
        let (cols, rows, dst_gt) = suggested_warp_output(40, 40, &extent).unwrap();
        assert!(cols > 40 && rows > 40);

        let mut dst = MemDataset::create(cols, rows, 1, DataType::Byte).unwrap();
        dst.set_geo_transform(dst_gt);
        dst.set_projection(utm33);
        args.dst_geo_transform = Some(dst_gt);
        WarpOperation::new(WarpOptions::new(args))
            .unwrap()
            .chunk_and_warp_image(&src, &mut dst, 0, 0, cols, rows)
            .unwrap();

        let band = dst.band(0).unwrap();
        // The footprint is rotated between zones, so the corners stay empty.
        for (c, r) in [(0, 0), (cols - 1, 0), (0, rows - 1), (cols - 1, rows - 1)] {
            assert_eq!(band.get(c, r), 0.0, "corner ({c}, {r})");
        }

        let west = band.values().iter().filter(|&&v| v == 50.0).count();
        let east = band.values().iter().filter(|&&v| v == 200.0).count();
        let other = band
            .values()
            .iter()
            .filter(|&&v| v != 0.0 && v != 50.0 && v != 200.0)
            .count();
        assert_eq!(other, 0);
        assert!((west + east).abs_diff(1600) < 80, "{} valid", west + east);
        assert!(west.abs_diff(800) < 80 && east.abs_diff(800) < 80);

        // Across the middle row the west half precedes the east half.
        let middle: Vec<f64> = (0..cols)
            .map(|c| band.get(c, rows / 2))
            .filter(|&v| v != 0.0)
            .collect();
        assert_eq!(middle.first(), Some(&50.0));
        assert_eq!(middle.last(), Some(&200.0));
    }

    #[test]
    fn test_bilinear_interpolates_interior() {
        let src = ramp_source(1);
        // Destination pixel centres fall on source pixel corners.
        let gt = GeoTransform::north_up(500_000.5, 5_760_999.5, 1.0);
        let mut dst = destination(3, 3, 1, gt);

        let mut opts = options(gt);
        opts.resampling = ResamplingMethod::Bilinear;
        WarpOperation::new(opts)
            .unwrap()
            .chunk_and_warp_image(&src, &mut dst, 0, 0, 3, 3)
            .unwrap();

        // Mean of 0, 1, 10, 11.
        assert_eq!(dst.band(0).unwrap().get(0, 0), 5.5);
    }

    #[test]
    fn test_rejects_mismatched_bands_and_windows() {
        let src = ramp_source(1);
        let gt = GeoTransform::north_up(500_000.0, 5_761_000.0, 1.0);
        let op = WarpOperation::new(options(gt)).unwrap();

        let mut two_bands = destination(4, 4, 2, gt);
        assert!(matches!(
            op.chunk_and_warp_image(&src, &mut two_bands, 0, 0, 4, 4),
            Err(Error::WarpFailed(_))
        ));

        let mut dst = destination(4, 4, 1, gt);
        assert!(op.chunk_and_warp_image(&src, &mut dst, 2, 0, 4, 4).is_err());
    }
}
