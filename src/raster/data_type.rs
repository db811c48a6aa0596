//! Pixel data types of raster bands and their OpenCV counterparts.

use std::fmt;

use opencv::core::{
    CV_8U, CV_8UC1, CV_16S, CV_16SC1, CV_16U, CV_16UC1, CV_32F, CV_32FC1, CV_32S, CV_32SC1,
    CV_64F, CV_64FC1,
};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Byte,
    UInt16,
    Int16,
    Int32,
    Float32,
    Float64,
}

impl DataType {
    /// Map an OpenCV depth (`CV_8U`, `CV_16U`, ...) to a band type.
    pub fn from_cv_depth(depth: i32) -> Result<Self> {
        match depth {
            CV_8U => Ok(DataType::Byte),
            CV_16U => Ok(DataType::UInt16),
            CV_16S => Ok(DataType::Int16),
            CV_32S => Ok(DataType::Int32),
            CV_32F => Ok(DataType::Float32),
            CV_64F => Ok(DataType::Float64),
            other => Err(Error::UnsupportedInput(format!(
                "pixel depth {other} has no raster band type"
            ))),
        }
    }

    pub fn cv_depth(self) -> i32 {
        match self {
            DataType::Byte => CV_8U,
            DataType::UInt16 => CV_16U,
            DataType::Int16 => CV_16S,
            DataType::Int32 => CV_32S,
            DataType::Float32 => CV_32F,
            DataType::Float64 => CV_64F,
        }
    }

    /// Single-channel OpenCV matrix type for this band type.
    pub fn cv_type(self) -> i32 {
        match self {
            DataType::Byte => CV_8UC1,
            DataType::UInt16 => CV_16UC1,
            DataType::Int16 => CV_16SC1,
            DataType::Int32 => CV_32SC1,
            DataType::Float32 => CV_32FC1,
            DataType::Float64 => CV_64FC1,
        }
    }

    pub fn size_bytes(self) -> usize {
        match self {
            DataType::Byte => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::Int32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Value written into pixels no source pixel maps to.
    pub fn default_no_data(self) -> f64 {
        if self.is_float() { f64::NAN } else { 0.0 }
    }

    /// Saturating conversion of `value` into the range of this type.
    /// Integer types round to nearest and map NaN to 0.
    pub fn saturate(self, value: f64) -> f64 {
        let (min, max) = match self {
            DataType::Byte => (u8::MIN as f64, u8::MAX as f64),
            DataType::UInt16 => (u16::MIN as f64, u16::MAX as f64),
            DataType::Int16 => (i16::MIN as f64, i16::MAX as f64),
            DataType::Int32 => (i32::MIN as f64, i32::MAX as f64),
            DataType::Float32 => return value as f32 as f64,
            DataType::Float64 => return value,
        };
        if value.is_nan() {
            return 0.0;
        }
        value.round().clamp(min, max)
    }

    /// Decode native-endian pixel bytes of this type.
    pub(crate) fn decode(self, bytes: &[u8]) -> Vec<f64> {
        match self {
            DataType::Byte => bytes.iter().map(|&b| f64::from(b)).collect(),
            DataType::UInt16 => decode_with(bytes, |b| f64::from(u16::from_ne_bytes(b))),
            DataType::Int16 => decode_with(bytes, |b| f64::from(i16::from_ne_bytes(b))),
            DataType::Int32 => decode_with(bytes, |b| f64::from(i32::from_ne_bytes(b))),
            DataType::Float32 => decode_with(bytes, |b| f64::from(f32::from_ne_bytes(b))),
            DataType::Float64 => decode_with(bytes, f64::from_ne_bytes),
        }
    }

    /// Encode values as native-endian pixel bytes, saturating first.
    pub(crate) fn encode(self, values: &[f64]) -> Vec<u8> {
        let mut out = Vec::with_capacity(values.len() * self.size_bytes());
        for &v in values {
            let v = self.saturate(v);
            match self {
                DataType::Byte => out.push(v as u8),
                DataType::UInt16 => out.extend_from_slice(&(v as u16).to_ne_bytes()),
                DataType::Int16 => out.extend_from_slice(&(v as i16).to_ne_bytes()),
                DataType::Int32 => out.extend_from_slice(&(v as i32).to_ne_bytes()),
                DataType::Float32 => out.extend_from_slice(&(v as f32).to_ne_bytes()),
                DataType::Float64 => out.extend_from_slice(&v.to_ne_bytes()),
            }
        }
        out
    }
}

fn decode_with<const N: usize>(bytes: &[u8], f: impl Fn([u8; N]) -> f64) -> Vec<f64> {
    bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut raw = [0u8; N];
            raw.copy_from_slice(chunk);
            f(raw)
        })
        .collect()
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Byte => "Byte",
            DataType::UInt16 => "UInt16",
            DataType::Int16 => "Int16",
            DataType::Int32 => "Int32",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
        };
        write!(f, "{name}")
    }
}
