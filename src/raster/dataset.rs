//! In-memory raster datasets.

use std::cell::Cell;

use opencv::core::{Mat, Scalar};
use opencv::prelude::*;

use crate::error::{Error, Result};
use crate::raster::data_type::DataType;
use crate::raster::geo_transform::GeoTransform;
use crate::raster::srs::SpatialRef;

/// One band of a [`MemDataset`], stored row-major.
///
/// Values are kept as `f64` but always lie in the range of `data_type`.
#[derive(Debug, Clone)]
pub struct RasterBand {
    data_type: DataType,
    cols: usize,
    rows: usize,
    values: Vec<f64>,
    no_data: Option<f64>,
}

impl RasterBand {
    fn new(data_type: DataType, cols: usize, rows: usize) -> Self {
        Self {
            data_type,
            cols,
            rows,
            values: vec![0.0; cols * rows],
            no_data: None,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn no_data(&self) -> Option<f64> {
        self.no_data
    }

    pub fn set_no_data(&mut self, value: Option<f64>) {
        self.no_data = value;
    }

    /// True if `value` equals the band's no-data value (NaN matches NaN).
    pub fn is_no_data(&self, value: f64) -> bool {
        match self.no_data {
            Some(nd) if nd.is_nan() => value.is_nan(),
            Some(nd) => value == nd,
            None => false,
        }
    }

    pub fn get(&self, col: usize, row: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn set(&mut self, col: usize, row: usize, value: f64) {
        self.values[row * self.cols + col] = self.data_type.saturate(value);
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Fill a window with `value`.
    pub(crate) fn fill_window(
        &mut self,
        x_off: usize,
        y_off: usize,
        x_size: usize,
        y_size: usize,
        value: f64,
    ) {
        let value = self.data_type.saturate(value);
        for row in y_off..y_off + y_size {
            let start = row * self.cols + x_off;
            self.values[start..start + x_size].fill(value);
        }
    }

    /// Read the whole band into a single-channel `Mat` of `buf_type`,
    /// converting with saturation.
    pub fn read_into_mat(&self, buf_type: DataType) -> Result<Mat> {
        let mut mat = Mat::new_rows_cols_with_default(
            self.rows as i32,
            self.cols as i32,
            buf_type.cv_type(),
            Scalar::all(0.0),
        )?;
        let bytes = buf_type.encode(&self.values);
        mat.data_bytes_mut()?.copy_from_slice(&bytes);
        Ok(mat)
    }
}

thread_local! {
    static CREATED_ON_THREAD: Cell<u64> = const { Cell::new(0) };
}

/// Raster held entirely in memory, released when dropped.
#[derive(Debug)]
pub struct MemDataset {
    cols: usize,
    rows: usize,
    bands: Vec<RasterBand>,
    projection: Option<SpatialRef>,
    geo_transform: Option<GeoTransform>,
}

impl MemDataset {
    /// Zero-filled dataset without projection or geotransform.
    pub fn create(
        cols: usize,
        rows: usize,
        band_count: usize,
        data_type: DataType,
    ) -> Result<Self> {
        if cols == 0 || rows == 0 || band_count == 0 {
            return Err(Error::UnsupportedInput(format!(
                "cannot create a {cols}x{rows} dataset with {band_count} bands"
            )));
        }
        CREATED_ON_THREAD.with(|n| n.set(n.get() + 1));
        Ok(Self {
            cols,
            rows,
            bands: (0..band_count)
                .map(|_| RasterBand::new(data_type, cols, rows))
                .collect(),
            projection: None,
            geo_transform: None,
        })
    }

    /// Datasets successfully created by the calling thread so far.
    pub fn created_on_current_thread() -> u64 {
        CREATED_ON_THREAD.with(Cell::get)
    }

    /// Dataset with one band per channel of `image`.
    pub fn from_mat(image: &impl MatTraitConst) -> Result<Self> {
        let data_type = DataType::from_cv_depth(image.depth())?;
        let channels = image.channels() as usize;
        let mut dataset = Self::create(
            image.cols() as usize,
            image.rows() as usize,
            channels,
            data_type,
        )?;

        let interleaved = if image.is_continuous() {
            data_type.decode(image.data_bytes()?)
        } else {
            // ROI views are strided; cloning packs them.
            data_type.decode(image.try_clone()?.data_bytes()?)
        };
        for (i, value) in interleaved.into_iter().enumerate() {
            dataset.bands[i % channels].values[i / channels] = value;
        }
        Ok(dataset)
    }

    pub fn raster_x_size(&self) -> usize {
        self.cols
    }

    pub fn raster_y_size(&self) -> usize {
        self.rows
    }

    pub fn raster_count(&self) -> usize {
        self.bands.len()
    }

    /// Data type of the first band.
    pub fn data_type(&self) -> DataType {
        self.bands[0].data_type
    }

    pub fn band(&self, index: usize) -> Option<&RasterBand> {
        self.bands.get(index)
    }

    pub fn band_mut(&mut self, index: usize) -> Option<&mut RasterBand> {
        self.bands.get_mut(index)
    }

    pub fn bands(&self) -> &[RasterBand] {
        &self.bands
    }

    pub(crate) fn bands_mut(&mut self) -> &mut [RasterBand] {
        &mut self.bands
    }

    pub fn projection(&self) -> Option<&SpatialRef> {
        self.projection.as_ref()
    }

    pub fn set_projection(&mut self, srs: SpatialRef) {
        self.projection = Some(srs);
    }

    pub fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    pub fn set_geo_transform(&mut self, gt: GeoTransform) {
        self.geo_transform = Some(gt);
    }
}
