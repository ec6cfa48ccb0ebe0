use geo::{BoundingRect, Coord, MultiPoint, Rect};
use shrinkwraprs::Shrinkwrap;

use crate::{
    components::transforms::ImageGeometry,
    errors::{CodecError, GeoRasterError, Result},
};

/// Axis aligned footprint of a raster in projection units.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct Extent(Rect<f64>);

impl From<Rect<f64>> for Extent {
    fn from(value: Rect<f64>) -> Self {
        Self(value)
    }
}

impl Extent {
    /// Resolves the bounding box of an image.
    ///
    /// The model transform is used whenever the image has one, unless
    /// `tilegrid` asks for the origin and resolution computation instead.
    pub fn resolve(geometry: &ImageGeometry, tilegrid: bool) -> Result<Self> {
        match geometry.transform {
            Some(transform) if !tilegrid => {
                let (width, height) = (geometry.width as f64, geometry.height as f64);
                let corners: MultiPoint = [(0., 0.), (0., height), (width, 0.), (width, height)]
                    .into_iter()
                    .map(|corner| transform.apply(Coord::from(corner)))
                    .collect::<Vec<_>>()
                    .into();
                // Four points always have a bounding rect.
                corners
                    .bounding_rect()
                    .map(Self)
                    .ok_or(GeoRasterError::decode(CodecError::NotGeoreferenced))
            }
            _ => {
                let (x1, y1) = geometry
                    .origin
                    .ok_or(GeoRasterError::decode(CodecError::NotGeoreferenced))?;
                let (rx, ry) = geometry.resolution_or_err().map_err(GeoRasterError::decode)?;
                let x2 = x1 + rx * geometry.width as f64;
                let y2 = y1 + ry * geometry.height as f64;
                Ok(Self(Rect::new((x1, y1), (x2, y2))))
            }
        }
    }

    /// `[xmin, ymin, xmax, ymax]`
    pub fn to_array(&self) -> [f64; 4] {
        let (min, max) = (self.0.min(), self.0.max());
        [min.x, min.y, max.x, max.y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::AffineTransform;
    use rstest::rstest;

    fn origin_resolution(resolution: (f64, f64)) -> ImageGeometry {
        ImageGeometry {
            width: 10,
            height: 10,
            origin: Some((0., 100.)),
            resolution: Some(resolution),
            transform: None,
        }
    }

    #[rstest]
    #[case::north_up((1., -1.), [0., 90., 10., 100.])]
    #[case::south_up((1., 1.), [0., 100., 10., 110.])]
    #[case::west_facing((-2., -1.), [-20., 90., 0., 100.])]
    fn origin_and_resolution(#[case] resolution: (f64, f64), #[case] expected: [f64; 4]) {
        let extent = Extent::resolve(&origin_resolution(resolution), false).unwrap();
        assert_eq!(extent.to_array(), expected);
    }

    #[rstest]
    #[case::north_up(AffineTransform::new(1., 0., 0., 0., -1., 100.), [0., 90., 10., 100.])]
    #[case::south_up(AffineTransform::new(1., 0., 0., 0., 1., 100.), [0., 100., 10., 110.])]
    #[case::rotated(AffineTransform::new(0., 1., 5., 1., 0., 5.), [5., 5., 15., 15.])]
    #[case::sheared(AffineTransform::new(2., 0.5, -3., -0.25, -1., 7.), [-3., -5.5, 22., 7.])]
    fn affine_corners(#[case] transform: AffineTransform, #[case] expected: [f64; 4]) {
        let geometry = ImageGeometry {
            width: 10,
            height: 10,
            origin: None,
            resolution: None,
            transform: Some(transform),
        };
        let [xmin, ymin, xmax, ymax] = Extent::resolve(&geometry, false).unwrap().to_array();
        assert!(xmin <= xmax && ymin <= ymax);
        assert_eq!([xmin, ymin, xmax, ymax], expected);
    }

    #[rstest]
    fn tilegrid_ignores_transform() {
        let mut geometry = origin_resolution((1., -1.));
        geometry.transform = Some(AffineTransform::new(5., 0., 1000., 0., -5., 1000.));
        assert_eq!(
            Extent::resolve(&geometry, true).unwrap().to_array(),
            [0., 90., 10., 100.]
        );
        assert_eq!(
            Extent::resolve(&geometry, false).unwrap().to_array(),
            [1000., 950., 1050., 1000.]
        );
    }

    #[rstest]
    fn missing_georeference() {
        let mut geometry = origin_resolution((1., -1.));
        geometry.origin = None;
        assert!(matches!(
            Extent::resolve(&geometry, false),
            Err(GeoRasterError::ContainerDecode(CodecError::NotGeoreferenced))
        ));
    }
}
