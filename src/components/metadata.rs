use std::fmt::Display;

use crate::errors::{GeoRasterError, Result};

/// Caller supplied georeferencing.
///
/// Required for decoded band arrays, a fallback for containers.
#[derive(serde::Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub height: Option<usize>,
    pub width: Option<usize>,
    pub pixel_height: Option<f64>,
    pub pixel_width: Option<f64>,
    pub projection: Option<Projection>,
    pub xmin: Option<f64>,
    pub ymax: Option<f64>,
    pub no_data_value: Option<f64>,
}

impl Metadata {
    pub(crate) fn require<T: Copy>(field: Option<T>, name: &str) -> Result<T> {
        field.ok_or_else(|| GeoRasterError::InputShape(format!("metadata is missing `{name}`")))
    }
}

/// Spatial reference of a raster.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Projection {
    Epsg(u16),
    Other(String),
}

impl From<u16> for Projection {
    fn from(value: u16) -> Self {
        Self::Epsg(value)
    }
}

impl From<&str> for Projection {
    fn from(value: &str) -> Self {
        Self::Other(value.into())
    }
}

impl Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Projection::Epsg(code) => write!(f, "EPSG:{code}"),
            Projection::Other(projection) => f.write_str(projection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn deserialize_camel_case() {
        let metadata: Metadata = serde_json::from_str(
            r#"{"pixelHeight": 0.5, "pixelWidth": 2, "projection": 4326, "xmin": -10, "ymax": 5, "noDataValue": -1}"#,
        )
        .unwrap();
        assert_eq!(metadata.pixel_height, Some(0.5));
        assert_eq!(metadata.pixel_width, Some(2.));
        assert_eq!(metadata.projection, Some(Projection::Epsg(4326)));
        assert_eq!(metadata.no_data_value, Some(-1.));
        assert_eq!(metadata.height, None);
    }

    #[rstest]
    #[case(Projection::Epsg(32633), "EPSG:32633")]
    #[case(Projection::from("+proj=longlat"), "+proj=longlat")]
    fn projection_display(#[case] projection: Projection, #[case] expected: &str) {
        assert_eq!(projection.to_string(), expected);
    }

    #[rstest]
    fn string_projection() {
        let projection: Projection = serde_json::from_str(r#""EPSG:3857""#).unwrap();
        assert_eq!(projection, Projection::Other("EPSG:3857".into()));
    }

    #[rstest]
    fn missing_required_field() {
        assert!(matches!(
            Metadata::require::<f64>(None, "xmin"),
            Err(GeoRasterError::InputShape(message)) if message.contains("xmin")
        ));
    }
}
