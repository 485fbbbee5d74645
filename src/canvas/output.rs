use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Encoded file format of a rendered image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Png,
    /// Lossy, no alpha channel. `quality` is 1-100.
    Jpeg { quality: u8 },
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg { .. } => "jpg",
        }
    }
}

/// A rendered spectrogram, still in memory.
#[derive(Clone, Debug)]
pub struct SpectrogramImage {
    pub pixels: RgbaImage,
    pub format: OutputFormat,
}

impl SpectrogramImage {
    pub fn new(pixels: RgbaImage, format: OutputFormat) -> Self {
        Self { pixels, format }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// True if any pixel is not fully opaque.
    pub fn has_alpha(&self) -> bool {
        self.pixels.pixels().any(|p| p.0[3] < 255)
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// Encode to the image's file format. JPEG output is composited over white.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let (w, h) = self.pixels.dimensions();
        let mut buf = Vec::new();
        match self.format {
            OutputFormat::Png => {
                PngEncoder::new(&mut buf).write_image(self.pixels.as_raw(), w, h, ExtendedColorType::Rgba8)?;
            }
            OutputFormat::Jpeg { quality } => {
                let flat = flatten_over_white(&self.pixels);
                JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
                    .write_image(flat.as_raw(), w, h, ExtendedColorType::Rgb8)?;
            }
        }
        Ok(buf)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.encode()?;
        std::fs::write(path.as_ref(), bytes)?;
        log::debug!("wrote {} ({}x{})", path.as_ref().display(), self.width(), self.height());
        Ok(())
    }
}

fn flatten_over_white(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(4, 2, |x, _| {
            if x % 2 == 0 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 0, 0])
            }
        })
    }

    #[test]
    fn png_keeps_alpha() {
        let img = SpectrogramImage::new(checker(), OutputFormat::Png);
        assert!(img.has_alpha());
        let bytes = img.encode().unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let back = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(back, img.pixels);
    }

    #[test]
    fn jpeg_is_flattened() {
        let flat = flatten_over_white(&checker());
        assert_eq!(flat.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(flat.get_pixel(1, 0).0, [255, 255, 255]);

        let img = SpectrogramImage::new(checker(), OutputFormat::Jpeg { quality: 90 });
        let bytes = img.encode().unwrap();
        assert_eq!(&bytes[..2], &[0xff, 0xd8]);
        assert_eq!(img.extension(), "jpg");
    }
}
