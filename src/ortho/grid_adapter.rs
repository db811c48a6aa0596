//! Conversion between grid maps and raster datasets.

use std::fmt;

use opencv::core::Mat;
use opencv::prelude::*;

use crate::error::{Error, Result};
use crate::map::{GridMap, Rect2d};
use crate::raster::{DataType, GeoTransform, MemDataset, SpatialRef};

/// Name of the single layer of a warped map.
pub const WARPED_LAYER: &str = "data";

/// UTM zone of a grid map's local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtmZone {
    pub number: u8,
    pub north: bool,
}

impl UtmZone {
    pub fn new(number: u8, north: bool) -> Self {
        Self { number, north }
    }

    /// WGS84 / UTM EPSG code of the zone.
    pub fn epsg(&self) -> Result<u32> {
        if !(1..=60).contains(&self.number) {
            return Err(Error::UnsupportedInput(format!(
                "UTM zone {} out of range 1..=60",
                self.number
            )));
        }
        let base = if self.north { 32600 } else { 32700 };
        Ok(base + u32::from(self.number))
    }

    pub fn spatial_ref(&self) -> Result<SpatialRef> {
        SpatialRef::from_epsg(self.epsg()?)
    }
}

/// Bare zone numbers are northern hemisphere.
impl From<u8> for UtmZone {
    fn from(number: u8) -> Self {
        Self::new(number, true)
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, if self.north { 'N' } else { 'S' })
    }
}

/// Layout of the source dataset built from a grid map.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetMeta {
    pub data_type: DataType,
    pub band_count: usize,
    pub cols: usize,
    pub rows: usize,
    pub zone: UtmZone,
    pub geo_transform: GeoTransform,
}

fn single_layer(map: &GridMap) -> Result<&Mat> {
    match map.num_layers() {
        1 => map
            .first_layer()
            .map(|(_, data)| data)
            .ok_or_else(|| Error::UnsupportedInput("grid map has no data layer".into())),
        0 => Err(Error::UnsupportedInput("grid map has no data layer".into())),
        n => Err(Error::UnsupportedInput(format!(
            "grid map has {n} layers ({}), only one is supported",
            map.layer_names().join(", ")
        ))),
    }
}

/// Check that `map` can be warped and derive the dataset layout.
pub fn compute_dataset_meta(map: &GridMap, zone: UtmZone) -> Result<DatasetMeta> {
    let data = single_layer(map)?;
    if data.empty() {
        return Err(Error::UnsupportedInput("grid map layer is empty".into()));
    }
    let resolution = map.resolution();
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(Error::UnsupportedInput(format!(
            "grid map resolution must be positive, got {resolution}"
        )));
    }
    zone.epsg()?;

    let roi = map.roi();
    Ok(DatasetMeta {
        data_type: DataType::from_cv_depth(data.depth())?,
        band_count: data.channels() as usize,
        cols: data.cols() as usize,
        rows: data.rows() as usize,
        zone,
        geo_transform: GeoTransform::north_up(roi.x, roi.top(), resolution),
    })
}

/// In-memory dataset holding a copy of the map's single layer, georeferenced
/// in `zone`.
pub fn to_dataset(map: &GridMap, zone: UtmZone) -> Result<(MemDataset, DatasetMeta)> {
    let meta = compute_dataset_meta(map, zone)?;
    let data = single_layer(map)?;

    let mut dataset = MemDataset::from_mat(data)?;
    dataset.set_projection(zone.spatial_ref()?);
    dataset.set_geo_transform(meta.geo_transform);
    Ok((dataset, meta))
}

/// Grid map with a single [`WARPED_LAYER`] holding `image`.
pub fn from_dataset(image: Mat, roi: Rect2d, resolution: f64) -> GridMap {
    let mut map = GridMap::new(roi, resolution);
    map.add(WARPED_LAYER, image);
    map
}
