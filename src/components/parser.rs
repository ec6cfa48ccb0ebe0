use log::{debug, info};
use ndarray::Array2;
use std::{fmt::Debug, str::FromStr, sync::Arc};
use tokio::io::AsyncRead;

use crate::{
    components::{
        backends::tiff_backend::TiffCodec,
        bounds::Extent,
        file::{ContainerCodec, Image},
        metadata::Metadata,
        raster::GeoRaster,
        reader::{materialize, Materialized},
        source::{Source, SourceType, UrlOptions},
    },
    errors::{GeoRasterError, Result},
};

/// A raster to parse, one variant per input modality.
pub enum RasterInput {
    /// Bands that are already decoded, georeferenced by `metadata`.
    Decoded {
        bands: Vec<Array2<f64>>,
        metadata: Metadata,
    },
    /// An encoded container, `metadata` only provides fallbacks.
    Container {
        source: Source,
        metadata: Metadata,
        read_on_demand: bool,
    },
}

impl Debug for RasterInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RasterInput::Decoded { bands, metadata } => f
                .debug_struct("Decoded")
                .field("bands", &bands.len())
                .field("metadata", metadata)
                .finish(),
            RasterInput::Container {
                source,
                metadata,
                read_on_demand,
            } => f
                .debug_struct("Container")
                .field("source", source)
                .field("metadata", metadata)
                .field("read_on_demand", read_on_demand)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterType {
    Decoded,
    Container,
}

impl FromStr for RasterType {
    type Err = GeoRasterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "object" | "decoded" => Ok(Self::Decoded),
            "geotiff" | "container" => Ok(Self::Container),
            _ => Err(GeoRasterError::InputShape(format!(
                "unknown raster type `{s}`"
            ))),
        }
    }
}

/// Payload of a [RasterRequest].
pub enum RasterData {
    Bands(Vec<Array2<f64>>),
    Bytes(bytes::Bytes),
    Url(String),
    Blob(Box<dyn AsyncRead + Send + Unpin>),
}

/// String keyed request, checked into a [RasterInput].
pub struct RasterRequest {
    pub raster_type: String,
    /// Defaults to a buffer for containers.
    pub source_type: Option<String>,
    pub data: RasterData,
    pub metadata: Metadata,
    pub options: UrlOptions,
    pub read_on_demand: bool,
}

impl TryFrom<RasterRequest> for RasterInput {
    type Error = GeoRasterError;

    fn try_from(request: RasterRequest) -> Result<Self> {
        let RasterRequest {
            raster_type,
            source_type,
            data,
            metadata,
            options,
            read_on_demand,
        } = request;
        let raster_type = raster_type.parse::<RasterType>()?;
        let source_type = source_type
            .as_deref()
            .map(SourceType::from_str)
            .transpose()?;
        let source = match (raster_type, source_type, data) {
            (RasterType::Decoded, None, RasterData::Bands(bands)) => {
                return Ok(RasterInput::Decoded { bands, metadata })
            }
            (RasterType::Container, None | Some(SourceType::Buffer), RasterData::Bytes(bytes)) => {
                Source::Buffer(bytes)
            }
            (RasterType::Container, Some(SourceType::Url), RasterData::Url(url)) => {
                Source::Url { url, options }
            }
            (RasterType::Container, Some(SourceType::Blob), RasterData::Blob(reader)) => {
                Source::Blob(reader)
            }
            (raster_type, source_type, _) => {
                return Err(GeoRasterError::InputShape(format!(
                    "data does not match raster type {raster_type:?} with source type {source_type:?}"
                )))
            }
        };
        Ok(RasterInput::Container {
            source,
            metadata,
            read_on_demand,
        })
    }
}

/// Parses [RasterInput]s into [GeoRaster]s.
#[derive(Debug, Clone)]
pub struct Parser {
    codec: Arc<dyn ContainerCodec>,
    client: reqwest::Client,
    debug: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            codec: Arc::new(TiffCodec),
            client: reqwest::Client::new(),
            debug: false,
        }
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codec(mut self, codec: impl ContainerCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Logs every parsing stage at debug level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn trace(&self, args: std::fmt::Arguments) {
        if self.debug {
            debug!("{args}");
        }
    }

    pub async fn parse(&self, input: RasterInput) -> Result<GeoRaster> {
        self.trace(format_args!("starting parse with {input:?}"));
        let raster = match input {
            RasterInput::Decoded { bands, metadata } => GeoRaster::from_bands(bands, &metadata)?,
            RasterInput::Container {
                source,
                metadata,
                read_on_demand,
            } => {
                self.parse_container(source, &metadata, read_on_demand)
                    .await?
            }
        };
        info!("new {raster:?}");
        Ok(raster)
    }

    async fn parse_container(
        &self,
        source: Source,
        metadata: &Metadata,
        read_on_demand: bool,
    ) -> Result<GeoRaster> {
        let bytes = source
            .fetch(&self.client)
            .await
            .map_err(GeoRasterError::decode)?;
        let codec = Arc::clone(&self.codec);
        let image = tokio::task::spawn_blocking(move || codec.open(bytes))
            .await
            .map_err(GeoRasterError::decode)?
            .map_err(GeoRasterError::decode)?;
        self.trace(format_args!("image: {image:?}"));

        let extent = Extent::resolve(&image.geometry(), false)?;
        self.trace(format_args!("bounding box: {:?}", extent.to_array()));
        let raster = GeoRaster::from_image(image.as_ref(), extent, metadata)?;
        self.trace(format_args!(
            "projection: {:?}, height: {}, width: {}",
            raster.projection, raster.height, raster.width
        ));

        match materialize(image, read_on_demand).await? {
            Materialized::Eager(bands) => raster.with_values(bands),
            Materialized::OnDemand(image) => Ok(raster.on_demand(image)),
        }
    }
}
