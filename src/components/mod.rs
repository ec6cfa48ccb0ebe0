pub mod backends;
pub mod bounds;
pub mod file;
pub mod metadata;
pub mod palette;
pub mod parser;
pub mod raster;
pub mod reader;
pub mod source;
pub mod stats;
pub mod transforms;

pub use bounds::Extent;
pub use file::{ContainerCodec, Directory, GeoKeys, Image};
pub use metadata::{Metadata, Projection};
pub use palette::Palette;
pub use parser::{Parser, RasterData, RasterInput, RasterRequest, RasterType};
pub use raster::GeoRaster;
pub use source::{Source, SourceType, UrlOptions};
pub use stats::BandStats;
