//! Rectangular geo-referenced raster with named data layers.

use opencv::core::Mat;
use opencv::prelude::*;

/// Axis-aligned rectangle in world units. `(x, y)` is the lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect2d {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect2d {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Upper edge (largest y).
    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Raster covering `roi` at a uniform `resolution` (world units per pixel).
///
/// Layers keep insertion order; row 0 of every layer is the northern edge.
#[derive(Debug)]
pub struct GridMap {
    roi: Rect2d,
    resolution: f64,
    layers: Vec<(String, Mat)>,
}

impl GridMap {
    pub fn new(roi: Rect2d, resolution: f64) -> Self {
        Self {
            roi,
            resolution,
            layers: Vec::new(),
        }
    }

    /// Add a layer, replacing any layer of the same name.
    pub fn add(&mut self, name: impl Into<String>, data: Mat) {
        let name = name.into();
        match self.layers.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = data,
            None => self.layers.push((name, data)),
        }
    }

    pub fn layer(&self, name: &str) -> Option<&Mat> {
        self.layers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data)
    }

    /// First layer in insertion order.
    pub fn first_layer(&self) -> Option<(&str, &Mat)> {
        self.layers.first().map(|(n, data)| (n.as_str(), data))
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn roi(&self) -> Rect2d {
        self.roi
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// `(rows, cols)` of the first layer, `(0, 0)` for an empty map.
    pub fn size(&self) -> (i32, i32) {
        self.layers
            .first()
            .map(|(_, data)| (data.rows(), data.cols()))
            .unwrap_or((0, 0))
    }
}

#[cfg(test)]
mod tests {
    use opencv::core::{CV_8UC1, CV_32FC1, Scalar};

    use super::*;

    fn layer(rows: i32, cols: i32, typ: i32, value: f64) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, typ, Scalar::all(value)).unwrap()
    }

    #[test]
    fn test_layers_keep_insertion_order() {
        let mut map = GridMap::new(Rect2d::new(10.0, 20.0, 4.0, 2.0), 0.5);
        map.add("elevation", layer(4, 8, CV_32FC1, 1.0));
        map.add("data", layer(4, 8, CV_8UC1, 3.0));

        assert_eq!(map.layer_names(), vec!["elevation", "data"]);
        assert_eq!(map.num_layers(), 2);
        assert_eq!(map.first_layer().unwrap().0, "elevation");
        assert_eq!(map.size(), (4, 8));
    }

    #[test]
    fn test_add_replaces_same_name() {
        let mut map = GridMap::new(Rect2d::default(), 1.0);
        map.add("data", layer(2, 2, CV_8UC1, 1.0));
        map.add("data", layer(3, 5, CV_8UC1, 7.0));

        assert_eq!(map.num_layers(), 1);
        let data = map.layer("data").unwrap();
        assert_eq!(*data.at_2d::<u8>(0, 0).unwrap(), 7);
        assert_eq!(map.size(), (3, 5));
        assert!(map.layer("missing").is_none());
    }

    #[test]
    fn test_rect_edges() {
        let roi = Rect2d::new(100.0, 200.0, 30.0, 40.0);
        assert_eq!(roi.top(), 240.0);
        assert_eq!(roi.right(), 130.0);
        assert_eq!(GridMap::new(roi, 1.0).size(), (0, 0));
    }
}
