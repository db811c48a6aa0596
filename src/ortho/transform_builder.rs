//! Transformers for extent estimation and source → destination reprojection.

use crate::error::{Error, Result};
use crate::raster::{GenImgProjTransformer, GeoTransform, MemDataset, SpatialRef, TransformerArgs};

/// Spatial reference for a configured target EPSG code. 0 means unset.
pub fn target_spatial_ref(epsg: u32) -> Result<SpatialRef> {
    if epsg == 0 {
        return Err(Error::InvalidConfiguration("target EPSG was not set".into()));
    }
    SpatialRef::from_epsg(epsg)
}

fn georeferencing(src: &MemDataset) -> Result<(SpatialRef, GeoTransform)> {
    let srs = src.projection().cloned().ok_or_else(|| {
        Error::InvalidConfiguration("source dataset has no projection".into())
    })?;
    let gt = src.geo_transform().ok_or_else(|| {
        Error::InvalidConfiguration("source dataset has no geotransform".into())
    })?;
    Ok((srs, gt))
}

/// Source pixel/line → target georeferenced coordinates, for sizing the
/// destination before it exists.
pub fn extent_transformer(
    src: &MemDataset,
    dst_srs: &SpatialRef,
) -> Result<GenImgProjTransformer> {
    let (src_srs, src_geo_transform) = georeferencing(src)?;
    GenImgProjTransformer::new(TransformerArgs {
        src_geo_transform,
        src_srs,
        dst_srs: dst_srs.clone(),
        dst_geo_transform: None,
    })
}

/// Source pixel/line ↔ destination pixel/line for the warp itself.
///
/// Returns the arguments rather than the transformer so each warp worker can
/// build its own.
pub fn reprojection_transformer(src: &MemDataset, dst: &MemDataset) -> Result<TransformerArgs> {
    let (src_srs, src_geo_transform) = georeferencing(src)?;
    let (dst_srs, dst_geo_transform) = georeferencing(dst).map_err(|_| {
        Error::InvalidConfiguration("destination dataset is not georeferenced".into())
    })?;
    let args = TransformerArgs {
        src_geo_transform,
        src_srs,
        dst_srs,
        dst_geo_transform: Some(dst_geo_transform),
    };
    // Validate projections and geotransforms up front.
    GenImgProjTransformer::new(args.clone())?;
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::DataType;

    fn utm_dataset() -> MemDataset {
        let mut ds = MemDataset::create(2, 2, 1, DataType::Byte).unwrap();
        ds.set_projection(SpatialRef::utm(32, true).unwrap());
        ds.set_geo_transform(GeoTransform::north_up(500_000.0, 5_761_000.0, 1.0));
        ds
    }

    #[test]
    fn test_unset_epsg_is_invalid_configuration() {
        assert!(matches!(
            target_spatial_ref(0),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(target_spatial_ref(1), Err(Error::UnsupportedCrs(1))));
        assert_eq!(target_spatial_ref(32632).unwrap().epsg(), Some(32632));
    }

    #[test]
    fn test_source_without_projection() {
        let mut ds = MemDataset::create(2, 2, 1, DataType::Byte).unwrap();
        ds.set_geo_transform(GeoTransform::north_up(0.0, 0.0, 1.0));
        let dst_srs = SpatialRef::utm(32, true).unwrap();
        assert!(matches!(
            extent_transformer(&ds, &dst_srs),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_extent_and_reprojection() {
        let src = utm_dataset();
        let extent = extent_transformer(&src, src.projection().unwrap()).unwrap();
        assert!(!extent.has_destination_grid());
        assert_eq!(extent.src_to_dst(1.0, 1.0).unwrap(), (500_001.0, 5_760_999.0));

        let dst = utm_dataset();
        let args = reprojection_transformer(&src, &dst).unwrap();
        assert_eq!(args.dst_geo_transform, dst.geo_transform());

        let bare = MemDataset::create(2, 2, 1, DataType::Byte).unwrap();
        assert!(reprojection_transformer(&src, &bare).is_err());
    }
}
