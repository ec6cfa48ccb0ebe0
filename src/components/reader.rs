use log::debug;
use ndarray::Array2;
use std::sync::Arc;

use crate::{
    components::file::Image,
    errors::{GeoRasterError, Result},
};

/// Values of a container once the materialization step ran.
#[derive(Debug)]
pub enum Materialized {
    Eager(Vec<Array2<f64>>),
    OnDemand(Arc<dyn Image>),
}

/// Reshapes a row-major buffer into `height` rows of `width` columns.
pub fn unflatten(flat: Vec<f64>, height: usize, width: usize) -> Result<Array2<f64>> {
    Array2::from_shape_vec((height, width), flat).map_err(GeoRasterError::read)
}

/// Reads every band of `image` and reshapes it to the image size.
pub async fn read_bands(image: Arc<dyn Image>) -> Result<Vec<Array2<f64>>> {
    let (width, height) = image.size();
    let rasters = tokio::task::spawn_blocking(move || image.read_rasters())
        .await
        .map_err(GeoRasterError::read)?
        .map_err(GeoRasterError::read)?;
    debug!("read {} bands of {width}x{height}", rasters.len());
    rasters
        .into_iter()
        .map(|flat| unflatten(flat, height, width))
        .collect()
}

/// Reads the bands now, or keeps `image` around so they can be read later.
pub async fn materialize(image: Arc<dyn Image>, read_on_demand: bool) -> Result<Materialized> {
    if read_on_demand {
        Ok(Materialized::OnDemand(image))
    } else {
        read_bands(image).await.map(Materialized::Eager)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        components::file::{Directory, GeoKeys},
        errors::CodecError,
    };
    use ndarray::array;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In memory [Image] counting how often its bands are read.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryImage {
        pub directory: Directory,
        pub geo_keys: GeoKeys,
        pub bands: Vec<Vec<f64>>,
        pub reads: AtomicUsize,
        pub fail: bool,
    }

    impl Image for MemoryImage {
        fn directory(&self) -> &Directory {
            &self.directory
        }
        fn geo_keys(&self) -> GeoKeys {
            self.geo_keys
        }
        fn read_rasters(&self) -> std::result::Result<Vec<Vec<f64>>, CodecError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CodecError::Unsupported("broken strip".into()));
            }
            Ok(self.bands.clone())
        }
    }

    pub(crate) fn memory_image(width: usize, height: usize, bands: Vec<Vec<f64>>) -> MemoryImage {
        MemoryImage {
            directory: Directory {
                width,
                height,
                samples_per_pixel: bands.len(),
                ..Default::default()
            },
            bands,
            ..Default::default()
        }
    }

    #[rstest]
    fn flatten_unflatten_round_trip() {
        let band = array![[1., 2., 3.], [4., 5., 6.]];
        let flat = band.iter().copied().collect();
        assert_eq!(unflatten(flat, 2, 3).unwrap(), band);
    }

    #[rstest]
    fn unflatten_is_row_major() {
        let band = unflatten(vec![0., 1., 2., 3., 4., 5.], 3, 2).unwrap();
        assert_eq!(band.row(1).to_vec(), vec![2., 3.]);
        assert_eq!(band[[2, 0]], 4.);
    }

    #[rstest]
    fn unflatten_wrong_length() {
        assert!(matches!(
            unflatten(vec![0.; 5], 2, 3),
            Err(GeoRasterError::Materialization(CodecError::NdarrayError(_)))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn eager_reads_every_band() {
        let image = Arc::new(memory_image(2, 1, vec![vec![1., 2.], vec![3., 4.]]));
        let Materialized::Eager(bands) = materialize(image.clone(), false).await.unwrap() else {
            panic!("expected eager values");
        };
        assert_eq!(bands, vec![array![[1., 2.]], array![[3., 4.]]]);
        assert_eq!(image.reads.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn on_demand_does_not_read() {
        let image = Arc::new(memory_image(2, 1, vec![vec![1., 2.]]));
        let materialized = materialize(image.clone(), true).await.unwrap();
        assert!(matches!(materialized, Materialized::OnDemand(_)));
        assert_eq!(image.reads.load(Ordering::SeqCst), 0);
    }

    #[test_log::test(tokio::test)]
    async fn read_failure_is_materialization_error() {
        let mut image = memory_image(2, 1, vec![vec![1., 2.]]);
        image.fail = true;
        assert!(matches!(
            read_bands(Arc::new(image)).await,
            Err(GeoRasterError::Materialization(CodecError::Unsupported(_)))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn short_band_is_materialization_error() {
        let image = memory_image(2, 2, vec![vec![1., 2., 3., 4.], vec![1., 2.]]);
        assert!(matches!(
            read_bands(Arc::new(image)).await,
            Err(GeoRasterError::Materialization(_))
        ));
    }
}
