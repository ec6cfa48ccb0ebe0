use log::info;
use ndarray::Array2;
use std::{fmt::Debug, sync::Arc};

use crate::{
    components::{
        bounds::Extent,
        file::Image,
        metadata::{Metadata, Projection},
        palette::Palette,
        reader::read_bands,
        stats::{band_stats, BandStats},
    },
    errors::{GeoRasterError, Result},
};

/// Georeferenced raster with its per band values and statistics.
///
/// A raster parsed with `read_on_demand` has no `values` nor statistics yet
/// and keeps the decoded image instead, see [GeoRaster::load_values].
#[derive(serde::Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GeoRaster {
    /// `[band][row][column]`
    #[serde(
        serialize_with = "serialize_bands",
        skip_serializing_if = "Option::is_none"
    )]
    pub values: Option<Vec<Array2<f64>>>,
    pub height: usize,
    pub width: usize,
    pub pixel_height: f64,
    pub pixel_width: f64,
    pub projection: Option<Projection>,
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub no_data_value: Option<f64>,
    pub number_of_rasters: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxs: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mins: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranges: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Palette>,
    #[serde(skip)]
    image: Option<Arc<dyn Image>>,
}

fn serialize_bands<S: serde::Serializer>(
    bands: &Option<Vec<Array2<f64>>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match bands {
        Some(bands) => serializer.collect_seq(bands.iter().map(|band| {
            band.rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect::<Vec<_>>()
        })),
        None => serializer.serialize_none(),
    }
}

impl Debug for GeoRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoRaster")
            .field("shape", &(self.number_of_rasters, self.height, self.width))
            .field("extent", &[self.xmin, self.ymin, self.xmax, self.ymax])
            .field("pixel_size", &(self.pixel_width, self.pixel_height))
            .field("projection", &self.projection)
            .field("no_data_value", &self.no_data_value)
            .field("loaded", &self.values.is_some())
            .finish()
    }
}

impl GeoRaster {
    /// Assembles a raster from already decoded bands.
    ///
    /// `height` and `width` default to the shape of the first band, the
    /// extent is derived from `xmin`, `ymax` and the absolute pixel size.
    pub fn from_bands(bands: Vec<Array2<f64>>, metadata: &Metadata) -> Result<Self> {
        let (rows, columns) = bands
            .first()
            .map(|band| band.dim())
            .ok_or_else(|| GeoRasterError::InputShape("no bands to parse".into()))?;
        let height = metadata.height.filter(|height| *height > 0).unwrap_or(rows);
        let width = metadata.width.filter(|width| *width > 0).unwrap_or(columns);
        let pixel_height = Metadata::require(metadata.pixel_height, "pixelHeight")?.abs();
        let pixel_width = Metadata::require(metadata.pixel_width, "pixelWidth")?.abs();
        let xmin = Metadata::require(metadata.xmin, "xmin")?;
        let ymax = Metadata::require(metadata.ymax, "ymax")?;
        let raster = Self {
            values: None,
            height,
            width,
            pixel_height,
            pixel_width,
            projection: metadata.projection.clone(),
            xmin,
            ymin: ymax - height as f64 * pixel_height,
            xmax: xmin + width as f64 * pixel_width,
            ymax,
            no_data_value: metadata.no_data_value,
            number_of_rasters: bands.len(),
            maxs: None,
            mins: None,
            ranges: None,
            palette: None,
            image: None,
        };
        raster.with_values(bands)
    }

    /// Assembles everything but the values from a decoded container image.
    ///
    /// Container georeferencing wins, `metadata` only fills the projection
    /// when the image has no EPSG GeoKey.
    pub fn from_image(image: &dyn Image, extent: Extent, metadata: &Metadata) -> Result<Self> {
        let directory = image.directory();
        let (resolution_x, resolution_y) = image
            .geometry()
            .resolution_or_err()
            .map_err(GeoRasterError::decode)?;
        let projection = image
            .geo_keys()
            .epsg()
            .map(Projection::Epsg)
            .or_else(|| metadata.projection.clone());
        let [xmin, ymin, xmax, ymax] = extent.to_array();
        Ok(Self {
            values: None,
            height: directory.height,
            width: directory.width,
            pixel_height: resolution_y.abs(),
            pixel_width: resolution_x.abs(),
            projection,
            xmin,
            ymin,
            xmax,
            ymax,
            no_data_value: directory.no_data_value(),
            number_of_rasters: directory.samples_per_pixel,
            maxs: None,
            mins: None,
            ranges: None,
            palette: image.palette(),
            image: None,
        })
    }

    /// Stores `bands` and computes their statistics.
    pub fn with_values(mut self, bands: Vec<Array2<f64>>) -> Result<Self> {
        let stats = band_stats(&bands, self.height, self.width, self.no_data_value)?;
        self.maxs = Some(stats.iter().map(|band| band.max).collect());
        self.mins = Some(stats.iter().map(|band| band.min).collect());
        self.ranges = Some(stats.iter().map(|band| band.range).collect());
        self.number_of_rasters = bands.len();
        self.values = Some(bands);
        self.image = None;
        Ok(self)
    }

    /// Keeps `image` so the values can be read later.
    pub fn on_demand(mut self, image: Arc<dyn Image>) -> Self {
        self.image = Some(image);
        self
    }

    /// Image retained by an on demand parse, until its values are loaded.
    pub fn image(&self) -> Option<&Arc<dyn Image>> {
        self.image.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.values.is_some()
    }

    pub fn extent(&self) -> Extent {
        Extent::from(geo::Rect::new(
            (self.xmin, self.ymin),
            (self.xmax, self.ymax),
        ))
    }

    pub fn stats(&self) -> Option<Vec<BandStats>> {
        let (maxs, mins, ranges) = (self.maxs.as_ref()?, self.mins.as_ref()?, self.ranges.as_ref()?);
        Some(
            itertools::izip!(maxs, mins, ranges)
                .map(|(max, min, range)| BandStats {
                    max: *max,
                    min: *min,
                    range: *range,
                })
                .collect(),
        )
    }

    /// Reads the values of an on demand raster through its retained image.
    pub async fn load_values(&mut self) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }
        let image = self.image.clone().ok_or_else(|| {
            GeoRasterError::InputShape("raster has neither values nor an image to read".into())
        })?;
        let bands = read_bands(image).await?;
        let loaded = self.clone().with_values(bands)?;
        info!("loaded {loaded:?}");
        *self = loaded;
        Ok(())
    }
}
