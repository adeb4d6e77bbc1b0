use miette::Diagnostic;
use thiserror::Error;

#[derive(Diagnostic, Debug, Error, PartialEq)]
pub enum TextureError {
    #[error("texture of size {width}x{height} needs {expected} bytes of rgba8 pixels, but got {actual}")]
    #[diagnostic(code(texture_error::size_mismatch))]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Decoded rgba8 pixels. Decoding happens before the texture is handed to a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}
