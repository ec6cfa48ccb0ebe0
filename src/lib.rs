//! Parse GeoTIFF containers or already decoded band arrays into a
//! [GeoRaster]: extent, resolution, projection, no-data value, per band
//! values and statistics.
//!
//! ```rust,ignore
//! use georaster::{parse, RasterInput, Source, Metadata};
//!
//! let input = RasterInput::Container {
//!     source: Source::url("https://example.com/dem.tif"),
//!     metadata: Metadata::default(),
//!     read_on_demand: false,
//! };
//! let raster = parse(input).await?;
//! println!("{:?} {:?}", raster.extent(), raster.stats());
//! ```

mod components;
mod errors;

pub use components::{
    backends::tiff_backend::{TiffCodec, TiffImage},
    reader::unflatten,
    stats::band_stats,
    BandStats, ContainerCodec, Directory, Extent, GeoKeys, GeoRaster, Image, Metadata, Palette,
    Parser, Projection, RasterData, RasterInput, RasterRequest, RasterType, Source, SourceType,
    UrlOptions,
};
#[cfg(feature = "gdal")]
pub use components::backends::gdal_backend::{GdalCodec, GdalImage};
pub use components::transforms::{
    affine_from_model_transformation, model_transformation_from_affine, ImageGeometry,
};
pub use errors::{CodecError, GeoRasterError, Result};

/// Parses `input` with a default [Parser].
pub async fn parse(input: RasterInput) -> Result<GeoRaster> {
    Parser::default().parse(input).await
}
