//! Point transformations between coordinate systems and raster grids.

use std::fmt;

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::error::{Error, Result};
use crate::raster::geo_transform::GeoTransform;
use crate::raster::srs::SpatialRef;

enum Strategy {
    /// Source and target are the same system.
    Identity,
    Proj4rs {
        source: Box<Proj>,
        target: Box<Proj>,
        source_is_geographic: bool,
        target_is_geographic: bool,
    },
}

/// Transforms georeferenced points from one [`SpatialRef`] to another.
///
/// Geographic systems take and return degrees.
pub struct CoordTransform {
    source: SpatialRef,
    target: SpatialRef,
    strategy: Strategy,
}

impl fmt::Debug for CoordTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordTransform")
            .field("source", &self.source.to_string())
            .field("target", &self.target.to_string())
            .field("identity", &self.is_identity())
            .finish()
    }
}

impl CoordTransform {
    pub fn new(source: &SpatialRef, target: &SpatialRef) -> Result<Self> {
        let strategy = if source.is_same(target) {
            Strategy::Identity
        } else {
            let source_proj = Proj::from_proj_string(source.proj_string()).map_err(|e| {
                Error::Projection(format!("invalid source projection {source}: {e:?}"))
            })?;
            let target_proj = Proj::from_proj_string(target.proj_string()).map_err(|e| {
                Error::Projection(format!("invalid target projection {target}: {e:?}"))
            })?;
            Strategy::Proj4rs {
                source: Box::new(source_proj),
                target: Box::new(target_proj),
                source_is_geographic: source.is_geographic(),
                target_is_geographic: target.is_geographic(),
            }
        };

        Ok(Self {
            source: source.clone(),
            target: target.clone(),
            strategy,
        })
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.strategy, Strategy::Identity)
    }

    pub fn source(&self) -> &SpatialRef {
        &self.source
    }

    pub fn target(&self) -> &SpatialRef {
        &self.target
    }

    /// Transform in the opposite direction.
    pub fn inverse(&self) -> Result<Self> {
        Self::new(&self.target, &self.source)
    }

    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let Strategy::Proj4rs {
            source,
            target,
            source_is_geographic,
            target_is_geographic,
        } = &self.strategy
        else {
            return Ok((x, y));
        };

        let mut point = if *source_is_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };
        transform(source, target, &mut point).map_err(|e| {
            Error::Projection(format!("transforming ({x}, {y}) failed: {e:?}"))
        })?;

        let (out_x, out_y) = if *target_is_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(Error::Projection(format!(
                "({x}, {y}) has no finite image in {}",
                self.target
            )));
        }
        Ok((out_x, out_y))
    }
}

/// Everything needed to rebuild a [`GenImgProjTransformer`], e.g. once per
/// worker thread.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformerArgs {
    pub src_geo_transform: GeoTransform,
    pub src_srs: SpatialRef,
    pub dst_srs: SpatialRef,
    /// Without a destination geotransform the destination side is
    /// georeferenced coordinates instead of pixel/line.
    pub dst_geo_transform: Option<GeoTransform>,
}

/// Source pixel/line ↔ destination pixel/line (or destination georeferenced
/// coordinates when no destination geotransform is given).
#[derive(Debug)]
pub struct GenImgProjTransformer {
    args: TransformerArgs,
    src_inv_geo_transform: GeoTransform,
    dst_inv_geo_transform: Option<GeoTransform>,
    forward: CoordTransform,
    reverse: CoordTransform,
}

impl GenImgProjTransformer {
    pub fn new(args: TransformerArgs) -> Result<Self> {
        let src_inv_geo_transform = args.src_geo_transform.invert().ok_or_else(|| {
            Error::InvalidConfiguration("source geotransform is not invertible".into())
        })?;
        let dst_inv_geo_transform = match args.dst_geo_transform {
            Some(gt) => Some(gt.invert().ok_or_else(|| {
                Error::InvalidConfiguration("destination geotransform is not invertible".into())
            })?),
            None => None,
        };
        let forward = CoordTransform::new(&args.src_srs, &args.dst_srs)?;
        let reverse = forward.inverse()?;

        Ok(Self {
            args,
            src_inv_geo_transform,
            dst_inv_geo_transform,
            forward,
            reverse,
        })
    }

    pub fn args(&self) -> &TransformerArgs {
        &self.args
    }

    pub fn has_destination_grid(&self) -> bool {
        self.args.dst_geo_transform.is_some()
    }

    pub fn src_to_dst(&self, col: f64, row: f64) -> Result<(f64, f64)> {
        let (x, y) = self.args.src_geo_transform.apply(col, row);
        let (x, y) = self.forward.transform(x, y)?;
        Ok(match &self.dst_inv_geo_transform {
            Some(inv) => inv.apply(x, y),
            None => (x, y),
        })
    }

    pub fn dst_to_src(&self, col: f64, row: f64) -> Result<(f64, f64)> {
        let (x, y) = match &self.args.dst_geo_transform {
            Some(gt) => gt.apply(col, row),
            None => (col, row),
        };
        let (x, y) = self.reverse.transform(x, y)?;
        Ok(self.src_inv_geo_transform.apply(x, y))
    }
}
