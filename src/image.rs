use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::memory::MEMORY_MAX;

/// Program image: origin address followed by contiguous code and data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    orig: u16,
    words: Vec<u16>,
}

impl Image {
    pub fn read(path: impl AsRef<Path>) -> Result<Image, LoadError> {
        let bytes = fs::read(path).map_err(LoadError::Unreadable)?;
        Image::from_bytes(&bytes)
    }

    /// Parse big-endian bytes, as written by an assembler.
    pub fn from_bytes(bytes: &[u8]) -> Result<Image, LoadError> {
        if bytes.len() % 2 != 0 {
            return Err(LoadError::Misaligned { len: bytes.len() });
        }
        let words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|word| u16::from_be_bytes([word[0], word[1]]))
            .collect();
        Image::from_raw(&words)
    }

    /// First word is the origin, the remainder is placed in memory from there.
    pub fn from_raw(raw: &[u16]) -> Result<Image, LoadError> {
        let Some((&orig, words)) = raw.split_first() else {
            return Err(LoadError::Empty);
        };
        if orig as usize + words.len() > MEMORY_MAX {
            return Err(LoadError::TooLarge {
                orig,
                len: words.len(),
            });
        }
        Ok(Image {
            orig,
            words: words.to_vec(),
        })
    }

    pub fn orig(&self) -> u16 {
        self.orig
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_big_endian_words() {
        let image = Image::from_bytes(&[0x30, 0x00, 0xF0, 0x25]).unwrap();
        assert_eq!(image.orig(), 0x3000);
        assert_eq!(image.words(), &[0xF025]);
    }

    #[test]
    fn origin_only() {
        let image = Image::from_bytes(&[0x40, 0x00]).unwrap();
        assert_eq!(image.orig(), 0x4000);
        assert!(image.is_empty());
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(Image::from_bytes(&[]), Err(LoadError::Empty)));
        assert!(matches!(
            Image::from_bytes(&[0x30, 0x00, 0xF0]),
            Err(LoadError::Misaligned { len: 3 })
        ));
    }

    #[test]
    fn fits_up_to_end_of_memory() {
        assert_eq!(Image::from_raw(&[0xFFFF, 0x1234]).unwrap().len(), 1);
        assert!(matches!(
            Image::from_raw(&[0xFFFF, 0x1234, 0x5678]),
            Err(LoadError::TooLarge {
                orig: 0xFFFF,
                len: 2
            })
        ));
        let whole = vec![0; MEMORY_MAX + 1];
        assert_eq!(Image::from_raw(&whole).unwrap().len(), MEMORY_MAX);
    }

    #[test]
    fn missing_file() {
        let result = Image::read("tests/files/does_not_exist.obj");
        assert!(matches!(result, Err(LoadError::Unreadable(_))));
    }
}
