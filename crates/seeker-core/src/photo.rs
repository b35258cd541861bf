//! Decoded RGB photos: the only pixel format the detector and recognizer see.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("not a readable image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has zero width or height")]
    Empty,
}

/// A decoded photo, packed RGB8 (`width * height * 3` bytes).
#[derive(Clone)]
pub struct Photo {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Photo {
    /// Decode an encoded image (JPEG, PNG, ...) sniffed from its bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, PhotoError> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        Self::from_rgb(rgb)
    }

    /// Read and decode an image file.
    pub fn open(path: &Path) -> Result<Self, PhotoError> {
        let bytes = std::fs::read(path).map_err(|source| PhotoError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::decode(&bytes)
    }

    pub fn from_rgb(rgb: image::RgbImage) -> Result<Self, PhotoError> {
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(PhotoError::Empty);
        }
        Ok(Self {
            data: rgb.into_raw(),
            width,
            height,
        })
    }

    /// RGB triple at (x, y). Caller guarantees bounds.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width as usize + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Per-channel mean (0.0–255.0).
    pub fn mean_rgb(&self) -> [f32; 3] {
        let mut sum = [0f64; 3];
        for px in self.data.chunks_exact(3) {
            for c in 0..3 {
                sum[c] += px[c] as f64;
            }
        }
        let n = (self.data.len() / 3).max(1) as f64;
        [(sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32]
    }

    /// Borrowed `image` view over the pixel buffer.
    pub fn view(&self) -> Option<image::ImageBuffer<image::Rgb<u8>, &[u8]>> {
        image::ImageBuffer::from_raw(self.width, self.height, self.data.as_slice())
    }
}
