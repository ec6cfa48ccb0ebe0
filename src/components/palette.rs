use shrinkwraprs::Shrinkwrap;

use crate::components::file::Directory;

const MAX_COLOR_MAP_BITS: u16 = 16;

/// RGBA entries of a color mapped image.
#[derive(Shrinkwrap, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Palette(Vec<[u8; 4]>);

impl Palette {
    /// ColorMap holds `2^bits` red values, then as many green, then blue,
    /// all scaled to 16 bits. Only defined up to 16 bits per sample.
    pub fn from_color_map(color_map: &[u16], bits_per_sample: u16) -> Option<Self> {
        if bits_per_sample > MAX_COLOR_MAP_BITS {
            return None;
        }
        let size = 1usize.checked_shl(bits_per_sample.into())?;
        if color_map.len() < size.checked_mul(3)? {
            return None;
        }
        let (red, rest) = color_map.split_at(size);
        let (green, blue) = rest.split_at(size);
        let entries = red
            .iter()
            .zip(green)
            .zip(&blue[..size])
            .map(|((r, g), b)| [to_u8(*r), to_u8(*g), to_u8(*b), u8::MAX])
            .collect();
        Some(Self(entries))
    }

    pub fn from_directory(directory: &Directory) -> Option<Self> {
        let color_map = directory.color_map.as_deref()?;
        Self::from_color_map(color_map, directory.bits_per_sample.unwrap_or(8))
    }

    pub fn into_inner(self) -> Vec<[u8; 4]> {
        self.0
    }
}

impl From<Vec<[u8; 4]>> for Palette {
    fn from(value: Vec<[u8; 4]>) -> Self {
        Self(value)
    }
}

fn to_u8(value: u16) -> u8 {
    (f64::from(value) / 65535. * 255.).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn one_bit_color_map() {
        let color_map = [0, 65535, 0, 32768, 65535, 0];
        let palette = Palette::from_color_map(&color_map, 1).unwrap();
        assert_eq!(*palette, vec![[0, 0, 255, 255], [255, 128, 0, 255]]);
    }

    #[rstest]
    #[case::short(1)]
    #[case::above_sixteen_bits(17)]
    #[case::overflowing_size(63)]
    #[case::overflowing_shift(200)]
    fn unusable_color_map(#[case] bits_per_sample: u16) {
        assert!(Palette::from_color_map(&[0; 5], bits_per_sample).is_none());
    }

    #[rstest]
    fn directory_without_color_map() {
        assert!(Palette::from_directory(&Directory::default()).is_none());
    }
}
