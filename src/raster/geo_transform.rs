//! Affine mapping between pixel/line and georeferenced coordinates.

/// Six coefficients `[x0, px_w, rot_x, y0, rot_y, px_h]`:
///
/// ```text
/// X = x0 + col * px_w + row * rot_x
/// Y = y0 + col * rot_y + row * px_h
/// ```
///
/// North-up rasters have zero rotation and a negative `px_h`, so row 0 is the
/// top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// North-up transform with square pixels of `resolution` world units.
    pub fn north_up(origin_x: f64, origin_y: f64, resolution: f64) -> Self {
        GeoTransform([origin_x, resolution, 0.0, origin_y, 0.0, -resolution])
    }

    pub fn coefficients(&self) -> [f64; 6] {
        self.0
    }

    /// Pixel/line → georeferenced coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let g = &self.0;
        (
            g[0] + col * g[1] + row * g[2],
            g[3] + col * g[4] + row * g[5],
        )
    }

    /// Inverse transform, `None` for a singular one.
    pub fn invert(&self) -> Option<GeoTransform> {
        let g = &self.0;
        let det = g[1] * g[5] - g[2] * g[4];
        if det.abs() < 1e-15 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(GeoTransform([
            (g[2] * g[3] - g[0] * g[5]) * inv_det,
            g[5] * inv_det,
            -g[2] * inv_det,
            (-g[1] * g[3] + g[0] * g[4]) * inv_det,
            -g[4] * inv_det,
            g[1] * inv_det,
        ]))
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    pub fn pixel_width(&self) -> f64 {
        self.0[1]
    }

    /// Negative for north-up rasters.
    pub fn pixel_height(&self) -> f64 {
        self.0[5]
    }

    pub fn is_north_up(&self) -> bool {
        self.0[2] == 0.0 && self.0[4] == 0.0
    }
}
