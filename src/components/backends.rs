use bytes::Bytes;
use num::traits::AsPrimitive;
use std::{fmt::Debug, sync::Arc};

use crate::{
    components::file::{ContainerCodec, Directory, GeoKeys, Image},
    errors::CodecError,
};

pub const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
pub const TAG_MODEL_TIEPOINT: u16 = 33922;
pub const TAG_MODEL_TRANSFORMATION: u16 = 34264;
pub const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
pub const TAG_GDAL_NODATA: u16 = 42113;

fn widen<T: AsPrimitive<f64>>(samples: Vec<T>) -> Vec<f64> {
    samples.into_iter().map(|sample| sample.as_()).collect()
}

/// Splits pixel interleaved samples into one buffer per band.
fn deinterleave(samples: Vec<f64>, bands: usize) -> Vec<Vec<f64>> {
    if bands <= 1 {
        return vec![samples];
    }
    (0..bands)
        .map(|band| samples.iter().skip(band).step_by(bands).copied().collect())
        .collect()
}

/// Pure Rust GeoTIFF decoding.
pub mod tiff_backend {
    use super::*;
    use std::io::Cursor;
    use tiff::{
        decoder::{ifd::Value, Decoder, DecodingResult, Limits},
        tags::{PlanarConfiguration, Tag},
        TiffResult,
    };

    type TiffDecoder<'a> = Decoder<Cursor<&'a [u8]>>;

    fn decoder(bytes: &[u8]) -> Result<TiffDecoder<'_>, CodecError> {
        Ok(Decoder::new(Cursor::new(bytes))?.with_limits(Limits::unlimited()))
    }

    fn find<T>(
        decoder: &mut TiffDecoder<'_>,
        tag: Tag,
        convert: impl FnOnce(Value) -> TiffResult<T>,
    ) -> Result<Option<T>, CodecError> {
        Ok(decoder.find_tag(tag)?.map(convert).transpose()?)
    }

    #[derive(Debug, Default, Clone, Copy)]
    pub struct TiffCodec;

    impl ContainerCodec for TiffCodec {
        fn open(&self, bytes: Bytes) -> Result<Arc<dyn Image>, CodecError> {
            Ok(Arc::new(TiffImage::new(bytes)?))
        }
    }

    /// First image of a GeoTIFF, holding on to the container bytes.
    pub struct TiffImage {
        bytes: Bytes,
        directory: Directory,
        geo_keys: GeoKeys,
    }

    impl Debug for TiffImage {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("TiffImage")
                .field("bytes", &self.bytes.len())
                .field("directory", &self.directory)
                .field("geo_keys", &self.geo_keys)
                .finish()
        }
    }

    impl TiffImage {
        pub fn new(bytes: Bytes) -> Result<Self, CodecError> {
            let mut decoder = decoder(&bytes)?;
            let (width, height) = decoder.dimensions()?;
            let samples_per_pixel = find(&mut decoder, Tag::SamplesPerPixel, Value::into_u16)?
                .unwrap_or(1)
                .max(1);
            if samples_per_pixel > 1 {
                let planar = find(&mut decoder, Tag::PlanarConfiguration, Value::into_u16)?;
                if planar == Some(PlanarConfiguration::Planar.to_u16()) {
                    return Err(CodecError::Unsupported(
                        "planar configuration with several samples per pixel".into(),
                    ));
                }
            }
            // scalar for single sample images, a list otherwise
            let bits_per_sample = find(&mut decoder, Tag::BitsPerSample, Value::into_u32_vec)?
                .and_then(|bits| bits.first().copied())
                .and_then(|bits| u16::try_from(bits).ok());
            let geo_keys = find(
                &mut decoder,
                Tag::from_u16_exhaustive(TAG_GEO_KEY_DIRECTORY),
                Value::into_u16_vec,
            )?
            .map(|keys| GeoKeys::from_directory(&keys))
            .unwrap_or_default();
            let directory = Directory {
                width: width as usize,
                height: height as usize,
                samples_per_pixel: samples_per_pixel.into(),
                bits_per_sample,
                model_pixel_scale: find(
                    &mut decoder,
                    Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE),
                    Value::into_f64_vec,
                )?,
                model_tiepoint: find(
                    &mut decoder,
                    Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT),
                    Value::into_f64_vec,
                )?,
                model_transformation: find(
                    &mut decoder,
                    Tag::from_u16_exhaustive(TAG_MODEL_TRANSFORMATION),
                    Value::into_f64_vec,
                )?,
                gdal_nodata: find(
                    &mut decoder,
                    Tag::from_u16_exhaustive(TAG_GDAL_NODATA),
                    Value::into_string,
                )?,
                color_map: find(&mut decoder, Tag::ColorMap, Value::into_u16_vec)?,
            };
            drop(decoder);
            Ok(Self {
                bytes,
                directory,
                geo_keys,
            })
        }
    }

    impl Image for TiffImage {
        fn directory(&self) -> &Directory {
            &self.directory
        }

        fn geo_keys(&self) -> GeoKeys {
            self.geo_keys
        }

        fn read_rasters(&self) -> Result<Vec<Vec<f64>>, CodecError> {
            let samples = match decoder(&self.bytes)?.read_image()? {
                DecodingResult::U8(samples) => widen(samples),
                DecodingResult::U16(samples) => widen(samples),
                DecodingResult::U32(samples) => widen(samples),
                DecodingResult::U64(samples) => widen(samples),
                DecodingResult::I8(samples) => widen(samples),
                DecodingResult::I16(samples) => widen(samples),
                DecodingResult::I32(samples) => widen(samples),
                DecodingResult::I64(samples) => widen(samples),
                DecodingResult::F32(samples) => widen(samples),
                DecodingResult::F64(samples) => samples,
            };
            Ok(deinterleave(samples, self.directory.samples_per_pixel))
        }
    }
}

/// GDAL decoding through an in memory `/vsimem/` file.
#[cfg(feature = "gdal")]
pub mod gdal_backend {
    use super::*;
    use crate::components::transforms::model_transformation_from_affine;
    use gdal::{raster::RasterBand, vsi, Dataset as GdalDataset};
    use geo::AffineTransform;
    use std::{
        path::PathBuf,
        sync::atomic::{AtomicUsize, Ordering},
    };

    static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

    fn affine_from_gdal(gdal_transform: [f64; 6]) -> AffineTransform {
        AffineTransform::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        )
    }

    /// Color table as a 16 bit ColorMap, padded to a power of two entries.
    fn color_map(band: &RasterBand) -> Option<(Vec<u16>, u16)> {
        let table = band.color_table()?;
        let size = table.entry_count().next_power_of_two();
        let mut color_map = vec![0u16; size * 3];
        for index in 0..table.entry_count() {
            let entry = table.entry_as_rgb(index)?;
            for (channel, value) in [entry.r, entry.g, entry.b].into_iter().enumerate() {
                color_map[channel * size + index] = value.clamp(0, 255) as u16 * 257;
            }
        }
        Some((color_map, size.trailing_zeros() as u16))
    }

    #[derive(Debug)]
    struct MemFile(PathBuf);

    impl Drop for MemFile {
        fn drop(&mut self) {
            let _ = vsi::unlink_mem_file(&self.0);
        }
    }

    #[derive(Debug, Default, Clone, Copy)]
    pub struct GdalCodec;

    impl ContainerCodec for GdalCodec {
        fn open(&self, bytes: Bytes) -> Result<Arc<dyn Image>, CodecError> {
            let path = PathBuf::from(format!(
                "/vsimem/georaster/{}.tif",
                NEXT_FILE.fetch_add(1, Ordering::Relaxed)
            ));
            vsi::create_mem_file(&path, bytes.to_vec())?;
            Ok(Arc::new(GdalImage::open(MemFile(path))?))
        }
    }

    /// Dataset kept as a `/vsimem/` file, reopened on every read.
    #[derive(Debug)]
    pub struct GdalImage {
        file: MemFile,
        directory: Directory,
        geo_keys: GeoKeys,
    }

    impl GdalImage {
        fn open(file: MemFile) -> Result<Self, CodecError> {
            let dataset = GdalDataset::open(&file.0)?;
            let (width, height) = dataset.raster_size();
            let first_band = dataset.rasterband(1)?;
            let color_map = color_map(&first_band);
            let mut geo_keys = GeoKeys::default();
            if let Ok(spatial_ref) = dataset.spatial_ref() {
                let code = spatial_ref
                    .auth_code()
                    .ok()
                    .and_then(|code| u16::try_from(code).ok());
                if spatial_ref.is_projected() {
                    geo_keys.projected_cs_type = code;
                } else if spatial_ref.is_geographic() {
                    geo_keys.geographic_type = code;
                }
            }
            let directory = Directory {
                width,
                height,
                samples_per_pixel: dataset.raster_count(),
                bits_per_sample: color_map.as_ref().map(|(_, bits)| *bits),
                model_transformation: dataset
                    .geo_transform()
                    .ok()
                    .map(|transform| model_transformation_from_affine(&affine_from_gdal(transform))),
                gdal_nodata: first_band.no_data_value().map(|value| value.to_string()),
                color_map: color_map.map(|(color_map, _)| color_map),
                ..Default::default()
            };
            drop(first_band);
            Ok(Self {
                file,
                directory,
                geo_keys,
            })
        }
    }

    impl Image for GdalImage {
        fn directory(&self) -> &Directory {
            &self.directory
        }

        fn geo_keys(&self) -> GeoKeys {
            self.geo_keys
        }

        fn read_rasters(&self) -> Result<Vec<Vec<f64>>, CodecError> {
            let dataset = GdalDataset::open(&self.file.0)?;
            let size = self.size();
            (1..=dataset.raster_count())
                .map(|index| {
                    let buffer = dataset
                        .rasterband(index)?
                        .read_as::<f64>((0, 0), size, size, None)?;
                    Ok(buffer.data().to_vec())
                })
                .collect()
        }
    }
}
