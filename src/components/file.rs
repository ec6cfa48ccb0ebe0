use bytes::Bytes;
use std::{fmt::Debug, sync::Arc};

use crate::{
    components::{palette::Palette, transforms::ImageGeometry},
    errors::CodecError,
};

pub const GEO_KEY_GEOGRAPHIC_TYPE: u16 = 2048;
pub const GEO_KEY_PROJECTED_CS_TYPE: u16 = 3072;

/// Directory entries of an image the parser relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directory {
    pub width: usize,
    pub height: usize,
    pub samples_per_pixel: usize,
    pub bits_per_sample: Option<u16>,
    pub model_pixel_scale: Option<Vec<f64>>,
    pub model_tiepoint: Option<Vec<f64>>,
    pub model_transformation: Option<Vec<f64>>,
    pub gdal_nodata: Option<String>,
    pub color_map: Option<Vec<u16>>,
}

impl Directory {
    /// GDAL_NODATA is stored as text; anything that doesn't parse as a number is no sentinel.
    /// NaN is skipped as missing anyway, so it is no sentinel either.
    pub fn no_data_value(&self) -> Option<f64> {
        self.gdal_nodata
            .as_deref()
            .map(|text| text.trim_end_matches('\0').trim())
            .and_then(|text| text.parse::<f64>().ok())
            .filter(|value| !value.is_nan())
    }
}

/// Short valued GeoKeys that identify the spatial reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoKeys {
    pub geographic_type: Option<u16>,
    pub projected_cs_type: Option<u16>,
}

impl GeoKeys {
    /// Parses a GeoKeyDirectory: a 4 short header followed by
    /// `(key id, tag location, count, value)` entries.
    pub fn from_directory(directory: &[u16]) -> Self {
        let mut keys = GeoKeys::default();
        let Some(num_keys) = directory.get(3) else {
            return keys;
        };
        for entry in directory[4..].chunks_exact(4).take(*num_keys as usize) {
            // Location 0 means the value is stored inline.
            let &[key_id, 0, _, value] = entry else {
                continue;
            };
            let value = (value != 0).then_some(value);
            match key_id {
                GEO_KEY_GEOGRAPHIC_TYPE => keys.geographic_type = value,
                GEO_KEY_PROJECTED_CS_TYPE => keys.projected_cs_type = value,
                _ => (),
            }
        }
        keys
    }

    /// Projected code wins over the geographic one.
    pub fn epsg(&self) -> Option<u16> {
        self.projected_cs_type.or(self.geographic_type)
    }
}

/// Handle on a decoded container image.
///
/// Implementations must be cheap to keep around: a lazily materialized
/// [GeoRaster](crate::GeoRaster) retains one until its values are loaded.
pub trait Image: Debug + Send + Sync {
    fn directory(&self) -> &Directory;
    fn geo_keys(&self) -> GeoKeys;
    /// One flat row-major buffer of `height * width` samples per band.
    fn read_rasters(&self) -> Result<Vec<Vec<f64>>, CodecError>;

    /// (width, height)
    fn size(&self) -> (usize, usize) {
        let directory = self.directory();
        (directory.width, directory.height)
    }
    fn geometry(&self) -> ImageGeometry {
        ImageGeometry::from_directory(self.directory())
    }
    fn palette(&self) -> Option<Palette> {
        Palette::from_directory(self.directory())
    }
}

/// Decodes container bytes into an [Image].
pub trait ContainerCodec: Debug + Send + Sync {
    fn open(&self, bytes: Bytes) -> Result<Arc<dyn Image>, CodecError>;
}
