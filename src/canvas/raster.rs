//! `embedded-graphics` draw target over an RGBA image.
//!
//! Mono fonts are tiny next to print-resolution canvases, so the target can
//! scale: every logical pixel becomes a `scale` x `scale` block.

use core::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use image::RgbaImage;

use crate::canvas::colors::Rgb;

pub struct Raster<'a> {
    image: &'a mut RgbaImage,
    scale: u32,
}

impl<'a> Raster<'a> {
    pub fn new(image: &'a mut RgbaImage, scale: u32) -> Self {
        Self { image, scale: scale.max(1) }
    }
}

impl OriginDimensions for Raster<'_> {
    fn size(&self) -> Size {
        Size::new(self.image.width() / self.scale, self.image.height() / self.scale)
    }
}

impl DrawTarget for Raster<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (w, h) = self.image.dimensions();
        let s = self.scale as i64;
        for Pixel(p, color) in pixels {
            let rgba = image::Rgba([color.r(), color.g(), color.b(), 255]);
            for dy in 0..s {
                for dx in 0..s {
                    let x = p.x as i64 * s + dx;
                    let y = p.y as i64 * s + dy;
                    if x >= 0 && y >= 0 && x < w as i64 && y < h as i64 {
                        self.image.put_pixel(x as u32, y as u32, rgba);
                    }
                }
            }
        }
        Ok(())
    }
}

fn rgb888(c: Rgb) -> Rgb888 {
    let [r, g, b] = c.0;
    Rgb888::new(r, g, b)
}

/// Where a text block hangs off its anchor point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub align: Alignment,
    pub baseline: Baseline,
}

impl Anchor {
    pub const TOP_CENTER: Anchor = Anchor { align: Alignment::Center, baseline: Baseline::Top };
    pub const TOP_LEFT: Anchor = Anchor { align: Alignment::Left, baseline: Baseline::Top };
    pub const TOP_RIGHT: Anchor = Anchor { align: Alignment::Right, baseline: Baseline::Top };
    pub const MIDDLE_RIGHT: Anchor = Anchor { align: Alignment::Right, baseline: Baseline::Middle };
    pub const MIDDLE_CENTER: Anchor = Anchor { align: Alignment::Center, baseline: Baseline::Middle };
}

/// A mono font at an integer pixel scale.
#[derive(Clone, Copy, Debug)]
pub struct ScaledFont {
    pub font: &'static MonoFont<'static>,
    pub scale: u32,
}

impl ScaledFont {
    /// Pick the scale that brings `font` closest to `px_height` pixels.
    pub fn sized(font: &'static MonoFont<'static>, px_height: f32) -> Self {
        let native = font.character_size.height as f32;
        let scale = (px_height / native).round().max(1.0) as u32;
        Self { font, scale }
    }

    pub fn line_height(&self) -> u32 {
        self.font.character_size.height * self.scale
    }

    /// Pixel width of the widest line of `text`.
    pub fn text_width(&self, text: &str) -> u32 {
        let advance = self.font.character_size.width + self.font.character_spacing;
        let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
        widest * advance * self.scale
    }

    /// Pixel height of `text`, one line per `\n`-separated segment.
    pub fn text_height(&self, text: &str) -> u32 {
        text.lines().count().max(1) as u32 * self.line_height()
    }
}

/// Draw `text` with its anchor at pixel `(x, y)`.
pub fn draw_text(image: &mut RgbaImage, text: &str, x: i32, y: i32, font: ScaledFont, color: Rgb, anchor: Anchor) {
    let s = font.scale as i32;
    let style = MonoTextStyle::new(font.font, rgb888(color));
    let layout = TextStyleBuilder::new()
        .alignment(anchor.align)
        .baseline(anchor.baseline)
        .build();
    let mut target = Raster::new(image, font.scale);
    // Infallible target
    let _ = Text::with_text_style(text, Point::new(x / s, y / s), style, layout).draw(&mut target);
}

pub fn draw_line(image: &mut RgbaImage, from: (i32, i32), to: (i32, i32), color: Rgb, width: u32) {
    let mut target = Raster::new(image, 1);
    let _ = Line::new(Point::new(from.0, from.1), Point::new(to.0, to.1))
        .into_styled(PrimitiveStyle::with_stroke(rgb888(color), width.max(1)))
        .draw(&mut target);
}

pub fn draw_circle(image: &mut RgbaImage, center: (i32, i32), radius: u32, color: Rgb, width: u32) {
    let mut target = Raster::new(image, 1);
    let _ = Circle::with_center(Point::new(center.0, center.1), radius * 2 + 1)
        .into_styled(PrimitiveStyle::with_stroke(rgb888(color), width.max(1)))
        .draw(&mut target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mono_font::ascii::FONT_6X10;

    #[test]
    fn scaled_target_fills_blocks() {
        let mut img = RgbaImage::new(8, 8);
        {
            let mut target = Raster::new(&mut img, 4);
            assert_eq!(target.size(), Size::new(2, 2));
            let _ = Pixel(Point::new(1, 0), Rgb888::new(255, 0, 0)).draw(&mut target);
        }
        assert_eq!(img.get_pixel(4, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(7, 3).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(3, 0).0[3], 0);
        assert_eq!(img.get_pixel(4, 4).0[3], 0);
    }

    #[test]
    fn text_metrics_follow_scale() {
        let font = ScaledFont::sized(&FONT_6X10, 31.0);
        assert_eq!(font.scale, 3);
        assert_eq!(font.line_height(), 30);
        assert_eq!(font.text_width("abcd"), 4 * 6 * 3);
        assert_eq!(font.text_height("a\nb"), 60);
    }

    #[test]
    fn text_draws_opaque_pixels() {
        let mut img = RgbaImage::new(64, 32);
        draw_text(&mut img, "Hi", 32, 16, ScaledFont::sized(&FONT_6X10, 10.0), Rgb::WHITE, Anchor::MIDDLE_CENTER);
        assert!(img.pixels().any(|p| p.0 == [255, 255, 255, 255]));
        // corners stay untouched
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
    }
}
