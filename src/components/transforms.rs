use geo::AffineTransform;

use crate::{components::file::Directory, errors::CodecError};

/// Builds the pixel to model transform from a GeoTIFF ModelTransformation.
///
/// Only the first eight of the sixteen coefficients are meaningful for a
/// 2D raster: `X = d + a·I + b·J`, `Y = h + e·I + f·J`.
pub fn affine_from_model_transformation(coefficients: &[f64]) -> Option<AffineTransform> {
    match coefficients {
        [a, b, _c, d, e, f, _g, h, ..] => Some(AffineTransform::new(*a, *b, *d, *e, *f, *h)),
        _ => None,
    }
}

/// Inverse of [affine_from_model_transformation], padded to the 4x4 layout.
pub fn model_transformation_from_affine(transform: &AffineTransform) -> Vec<f64> {
    vec![
        transform.a(),
        transform.b(),
        0.,
        transform.xoff(),
        transform.d(),
        transform.e(),
        0.,
        transform.yoff(),
        0.,
        0.,
        0.,
        0.,
        0.,
        0.,
        0.,
        1.,
    ]
}

/// Geometry of an image as needed to resolve its extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub width: usize,
    pub height: usize,
    /// Model coordinates of the top left corner.
    pub origin: Option<(f64, f64)>,
    /// Signed ground units per pixel, `y` is negative for north-up rasters.
    pub resolution: Option<(f64, f64)>,
    pub transform: Option<AffineTransform>,
}

impl ImageGeometry {
    pub fn from_directory(directory: &Directory) -> Self {
        let transform = directory
            .model_transformation
            .as_deref()
            .and_then(affine_from_model_transformation);
        Self {
            width: directory.width,
            height: directory.height,
            origin: origin(directory, transform.as_ref()),
            resolution: resolution(directory, transform.as_ref()),
            transform,
        }
    }

    pub fn resolution_or_err(&self) -> Result<(f64, f64), CodecError> {
        self.resolution.ok_or(CodecError::NotGeoreferenced)
    }
}

fn origin(directory: &Directory, transform: Option<&AffineTransform>) -> Option<(f64, f64)> {
    match (directory.model_tiepoint.as_deref(), transform) {
        (Some([_, _, _, x, y, ..]), _) => Some((*x, *y)),
        (_, Some(transform)) => Some((transform.xoff(), transform.yoff())),
        _ => None,
    }
}

fn resolution(directory: &Directory, transform: Option<&AffineTransform>) -> Option<(f64, f64)> {
    match (directory.model_pixel_scale.as_deref(), transform) {
        (Some([x, y, ..]), _) => Some((*x, -*y)),
        (_, Some(transform)) if transform.b() == 0. && transform.d() == 0. => {
            Some((transform.a(), transform.e()))
        }
        (_, Some(transform)) => Some((
            transform.a().hypot(transform.d()),
            -transform.b().hypot(transform.e()),
        )),
        _ => None,
    }
}
