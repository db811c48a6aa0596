//! Conversions between nalgebra matrices and OpenCV `Mat`.

use nalgebra::Matrix4;
use opencv::core::{CV_64F, Mat};
use opencv::prelude::*;

use crate::error::{Error, Result};

/// Convert a 4x4 nalgebra matrix into a 4x4 `CV_64F` Mat, entry for entry.
pub fn matrix4_to_mat(m: &Matrix4<f64>) -> Result<Mat> {
    let mut rows = [[0.0f64; 4]; 4];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = m[(r, c)];
        }
    }
    Ok(Mat::from_slice_2d(&rows)?)
}

/// Convert a 4x4 single-channel Mat (`CV_32F` or `CV_64F`) into a nalgebra matrix.
pub fn mat_to_matrix4(mat: &Mat) -> Result<Matrix4<f64>> {
    if mat.rows() != 4 || mat.cols() != 4 || mat.channels() != 1 {
        return Err(Error::UnsupportedInput(format!(
            "expected a 4x4 single-channel matrix, got {}x{}x{}",
            mat.rows(),
            mat.cols(),
            mat.channels()
        )));
    }

    let converted;
    let mat = if mat.depth() == CV_64F {
        mat
    } else {
        let mut tmp = Mat::default();
        mat.convert_to(&mut tmp, CV_64F, 1.0, 0.0)?;
        converted = tmp;
        &converted
    };

    let mut out = Matrix4::zeros();
    for r in 0..4 {
        for c in 0..4 {
            out[(r, c)] = *mat.at_2d::<f64>(r as i32, c as i32)?;
        }
    }
    Ok(out)
}
