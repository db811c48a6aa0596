//! Spatial reference systems identified by EPSG code.

use std::fmt;

use crate::error::{Error, Result};

pub const EPSG_WGS84: u32 = 4326;
pub const EPSG_ETRS89: u32 = 4258;
pub const EPSG_WEB_MERCATOR: u32 = 3857;

/// A coordinate reference system as a proj string, with its EPSG code when
/// it was resolved from one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialRef {
    epsg: Option<u32>,
    proj: String,
}

impl SpatialRef {
    /// Resolve an EPSG code through the built-in definition table.
    pub fn from_epsg(code: u32) -> Result<Self> {
        let proj = proj_string_for_epsg(code).ok_or(Error::UnsupportedCrs(code))?;
        Ok(Self {
            epsg: Some(code),
            proj,
        })
    }

    pub fn from_proj_string(proj: impl Into<String>) -> Self {
        Self {
            epsg: None,
            proj: proj.into(),
        }
    }

    /// WGS84 / UTM zone `zone`, northern or southern hemisphere.
    pub fn utm(zone: u8, north: bool) -> Result<Self> {
        let base = if north { 32600 } else { 32700 };
        Self::from_epsg(base + u32::from(zone))
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn proj_string(&self) -> &str {
        &self.proj
    }

    /// Coordinates in degrees of longitude/latitude.
    pub fn is_geographic(&self) -> bool {
        self.proj.contains("+proj=longlat") || self.proj.contains("+proj=latlong")
    }

    /// Same coordinate system, so no transformation is needed.
    pub fn is_same(&self, other: &SpatialRef) -> bool {
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            _ => self.proj == other.proj,
        }
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epsg {
            Some(code) => write!(f, "EPSG:{code}"),
            None => write!(f, "{}", self.proj),
        }
    }
}

fn proj_string_for_epsg(code: u32) -> Option<String> {
    let proj = match code {
        EPSG_WGS84 => "+proj=longlat +datum=WGS84 +no_defs".to_string(),
        EPSG_ETRS89 => "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs".to_string(),
        EPSG_WEB_MERCATOR => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 \
                              +k=1 +units=m +no_defs"
            .to_string(),
        32601..=32660 => format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs", code - 32600),
        32701..=32760 => format!(
            "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
            code - 32700
        ),
        // ETRS89 / UTM zones 28N..38N
        25828..=25838 => format!(
            "+proj=utm +zone={} +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
            code - 25800
        ),
        _ => return None,
    };
    Some(proj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_codes() {
        let north = SpatialRef::utm(32, true).unwrap();
        assert_eq!(north.epsg(), Some(32632));
        assert!(north.proj_string().contains("+zone=32"));
        assert!(!north.proj_string().contains("+south"));

        let south = SpatialRef::utm(19, false).unwrap();
        assert_eq!(south.epsg(), Some(32719));
        assert!(south.proj_string().contains("+south"));
        assert!(!south.is_geographic());
    }

    #[test]
    fn test_geographic_and_unknown() {
        assert!(SpatialRef::from_epsg(EPSG_WGS84).unwrap().is_geographic());
        assert!(SpatialRef::from_epsg(25832).is_ok());
        assert!(matches!(
            SpatialRef::from_epsg(2056),
            Err(Error::UnsupportedCrs(2056))
        ));
        assert!(SpatialRef::utm(61, true).is_err());
        assert!(SpatialRef::utm(0, true).is_err());
    }

    #[test]
    fn test_is_same() {
        let a = SpatialRef::from_epsg(32632).unwrap();
        let b = SpatialRef::from_proj_string(a.proj_string());
        assert!(a.is_same(&SpatialRef::utm(32, true).unwrap()));
        assert!(a.is_same(&b));
        assert!(!a.is_same(&SpatialRef::from_epsg(32633).unwrap()));
        assert_eq!(a.to_string(), "EPSG:32632");
    }
}
