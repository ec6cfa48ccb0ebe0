pub type Result<T> = std::result::Result<T, GeoRasterError>;

#[derive(thiserror::Error, Debug)]
pub enum GeoRasterError {
    #[error("Invalid raster input: {0}")]
    InputShape(String),
    #[error("Could not decode raster container")]
    ContainerDecode(#[source] CodecError),
    #[error("Could not read raster values")]
    Materialization(#[source] CodecError),
    #[error("Band {band} has shape {actual:?}, expected {expected:?}")]
    StatsCompute {
        band: usize,
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Failures raised by the container collaborators (fetching, decoding, reading).
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error(transparent)]
    TiffError(#[from] tiff::TiffError),
    #[error(transparent)]
    HttpError(#[from] reqwest::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
    #[cfg(feature = "gdal")]
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
    #[error("Image is not georeferenced")]
    NotGeoreferenced,
    #[error("Unsupported sample layout: {0}")]
    Unsupported(String),
}

impl GeoRasterError {
    pub(crate) fn decode(error: impl Into<CodecError>) -> Self {
        Self::ContainerDecode(error.into())
    }

    pub(crate) fn read(error: impl Into<CodecError>) -> Self {
        Self::Materialization(error.into())
    }
}
