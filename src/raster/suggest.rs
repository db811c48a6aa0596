//! Output extent and resolution suggestion for a warp.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::raster::geo_transform::GeoTransform;
use crate::raster::transformer::GenImgProjTransformer;

/// Samples per raster edge.
const EDGE_STEPS: usize = 20;
/// Samples per axis of the interior grid used when edge points fail.
const GRID_STEPS: usize = 10;

/// Suggested destination grid: `(cols, rows, geotransform)`.
///
/// `transformer` must map source pixel/line to destination georeferenced
/// coordinates (no destination grid). The source outline is sampled along
/// its edges; if any edge point fails to transform, an interior grid is
/// sampled as well. Pixels are square, sized so the source diagonal keeps its
/// pixel count.
pub fn suggested_warp_output(
    src_cols: usize,
    src_rows: usize,
    transformer: &GenImgProjTransformer,
) -> Result<(usize, usize, GeoTransform)> {
    if transformer.has_destination_grid() {
        return Err(Error::WarpEstimationFailed(
            "extent estimation needs a transformer into georeferenced coordinates".into(),
        ));
    }
    if src_cols == 0 || src_rows == 0 {
        return Err(Error::WarpEstimationFailed("source raster is empty".into()));
    }

    let (w, h) = (src_cols as f64, src_rows as f64);
    let mut samples = Vec::with_capacity(4 * (EDGE_STEPS + 1));
    for i in 0..=EDGE_STEPS {
        let t = i as f64 / EDGE_STEPS as f64;
        samples.push((t * w, 0.0));
        samples.push((t * w, h));
        samples.push((0.0, t * h));
        samples.push((w, t * h));
    }

    let mut points = Vec::with_capacity(samples.len());
    let mut failed = 0usize;
    for (col, row) in samples {
        match transformer.src_to_dst(col, row) {
            Ok(p) => points.push(p),
            Err(_) => failed += 1,
        }
    }

    if failed > 0 {
        warn!(
            "{} of {} edge points failed to transform, sampling the interior",
            failed,
            failed + points.len()
        );
        for i in 0..=GRID_STEPS {
            for j in 0..=GRID_STEPS {
                let col = i as f64 / GRID_STEPS as f64 * w;
                let row = j as f64 / GRID_STEPS as f64 * h;
                if let Ok(p) = transformer.src_to_dst(col, row) {
                    points.push(p);
                }
            }
        }
    }

    if points.is_empty() {
        return Err(Error::WarpEstimationFailed(
            "no source point could be transformed".into(),
        ));
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(x, y) in &points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    let src_diagonal = (w * w + h * h).sqrt();
    let dst_diagonal = match (
        transformer.src_to_dst(0.0, 0.0),
        transformer.src_to_dst(w, h),
    ) {
        (Ok((x0, y0)), Ok((x1, y1))) => ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt(),
        _ => ((max_x - min_x).powi(2) + (max_y - min_y).powi(2)).sqrt(),
    };
    let pixel_size = dst_diagonal / src_diagonal;
    if !pixel_size.is_finite() || pixel_size <= 0.0 {
        return Err(Error::WarpEstimationFailed(format!(
            "degenerate output pixel size {pixel_size}"
        )));
    }

    let cols = (((max_x - min_x) / pixel_size + 0.5) as usize).max(1);
    let rows = (((max_y - min_y) / pixel_size + 0.5) as usize).max(1);
    let gt = GeoTransform::north_up(min_x, max_y, pixel_size);

    debug!(
        "Suggested warp output {}x{} at {:.6} per pixel, origin ({:.3}, {:.3})",
        cols, rows, pixel_size, min_x, max_y
    );
    Ok((cols, rows, gt))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::raster::srs::{EPSG_WGS84, SpatialRef};
    use crate::raster::transformer::TransformerArgs;

    fn extent_transformer(gt: GeoTransform, dst_epsg: u32) -> GenImgProjTransformer {
        GenImgProjTransformer::new(TransformerArgs {
            src_geo_transform: gt,
            src_srs: SpatialRef::utm(32, true).unwrap(),
            dst_srs: SpatialRef::from_epsg(dst_epsg).unwrap(),
            dst_geo_transform: None,
        })
        .unwrap()
    }

    #[test]
    fn test_same_crs_keeps_grid() {
        let gt = GeoTransform::north_up(500_000.0, 5_761_000.0, 0.5);
        let t = extent_transformer(gt, 32632);

        let (cols, rows, out) = suggested_warp_output(40, 30, &t).unwrap();
        assert_eq!((cols, rows), (40, 30));
        assert_relative_eq!(out.pixel_width(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(out.pixel_height(), -0.5, epsilon = 1e-12);
        assert_eq!(out.origin(), (500_000.0, 5_761_000.0));
    }

    #[test]
    fn test_single_pixel() {
        let gt = GeoTransform::north_up(500_000.0, 5_761_000.0, 2.0);
        let t = extent_transformer(gt, 32632);

        let (cols, rows, out) = suggested_warp_output(1, 1, &t).unwrap();
        assert_eq!((cols, rows), (1, 1));
        assert_relative_eq!(out.pixel_width(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_geographic_target_contains_source() {
        let gt = GeoTransform::north_up(500_000.0, 5_761_000.0, 10.0);
        let t = extent_transformer(gt, EPSG_WGS84);

        let (cols, rows, out) = suggested_warp_output(100, 100, &t).unwrap();
        assert!(cols > 0 && rows > 0);
        let (lon0, lat0) = out.origin();
        assert!((8.9..9.1).contains(&lon0));
        assert!((51.9..52.1).contains(&lat0));
        // 10 m pixels are roughly 1e-4 degrees.
        assert!(out.pixel_width() > 5e-5 && out.pixel_width() < 2e-4);
    }

    #[test]
    fn test_rejects_destination_grid() {
        let utm = SpatialRef::utm(32, true).unwrap();
        let t = GenImgProjTransformer::new(TransformerArgs {
            src_geo_transform: GeoTransform::north_up(0.0, 0.0, 1.0),
            src_srs: utm.clone(),
            dst_srs: utm,
            dst_geo_transform: Some(GeoTransform::north_up(0.0, 0.0, 1.0)),
        })
        .unwrap();
        assert!(matches!(
            suggested_warp_output(4, 4, &t),
            Err(Error::WarpEstimationFailed(_))
        ));
    }
}
