//! Canvas geometry: title band, axis margins and the plot mapping.

use std::f32::consts::TAU;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10, FONT_9X18_BOLD};

use super::colors::freq_marker_label;
use super::raster::ScaledFont;
use super::time_markers::freq_ticks;
use crate::error::{Error, Result};
use crate::theme::{AxisPolicy, CoordinateSystem, ThemeSpec};
use crate::types::{SpectrogramMatrix, TitlePosition};

/// Widest time label the axes can produce.
const TIME_LABEL_SAMPLE: &str = "00:00";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }
}

/// Pixel -> (frame, bin) for one coordinate system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlotMapping {
    /// Frames left to right across `rect`, bin 0 on the bottom row.
    Linear { rect: Rect },
    /// Frames counter-clockwise from the positive x axis, bin 0 at `inner`
    /// pixels from the centre and the last bin at `radius`.
    Polar { cx: f32, cy: f32, radius: f32, inner: f32 },
}

impl PlotMapping {
    /// Pixels that can hold a cell.
    pub fn bounds(&self, width: u32, height: u32) -> Rect {
        match *self {
            PlotMapping::Linear { rect } => rect,
            PlotMapping::Polar { cx, cy, radius, .. } => {
                let x0 = (cx - radius).floor().max(0.0) as u32;
                let y0 = (cy - radius).floor().max(0.0) as u32;
                let x1 = ((cx + radius).ceil() as u32).min(width);
                let y1 = ((cy + radius).ceil() as u32).min(height);
                Rect { x: x0, y: y0, w: x1.saturating_sub(x0), h: y1.saturating_sub(y0) }
            }
        }
    }

    /// The cell drawn at pixel `(x, y)`, or `None` for background.
    pub fn cell_at(&self, x: u32, y: u32, n_frames: usize, n_bins: usize) -> Option<(usize, usize)> {
        if n_frames == 0 || n_bins == 0 {
            return None;
        }
        match *self {
            PlotMapping::Linear { rect } => {
                if !rect.contains(x, y) {
                    return None;
                }
                let frame = (x - rect.x) as u64 * n_frames as u64 / rect.w as u64;
                let from_bottom = (rect.bottom() - 1 - y) as u64;
                let bin = from_bottom * n_bins as u64 / rect.h as u64;
                Some((frame as usize, bin as usize))
            }
            PlotMapping::Polar { cx, cy, radius, inner } => {
                let dx = x as f32 + 0.5 - cx;
                let dy = cy - (y as f32 + 0.5);
                let r = dx.hypot(dy);
                if r < inner || r >= radius {
                    return None;
                }
                let angle = dy.atan2(dx).rem_euclid(TAU);
                let frame = ((angle / TAU * n_frames as f32) as usize).min(n_frames - 1);
                let bin = (((r - inner) / (radius - inner) * n_bins as f32) as usize).min(n_bins - 1);
                Some((frame, bin))
            }
        }
    }

    /// Canvas point at the middle of a cell. The pixel containing it is
    /// `(x.floor(), y.floor())`.
    pub fn cell_center(&self, frame: usize, bin: usize, n_frames: usize, n_bins: usize) -> (f32, f32) {
        let tf = (frame as f32 + 0.5) / n_frames.max(1) as f32;
        let tb = (bin as f32 + 0.5) / n_bins.max(1) as f32;
        match *self {
            PlotMapping::Linear { rect } => (
                rect.x as f32 + tf * rect.w as f32,
                rect.bottom() as f32 - tb * rect.h as f32,
            ),
            PlotMapping::Polar { cx, cy, radius, inner } => {
                let r = inner + tb * (radius - inner);
                polar_point(cx, cy, r, tf * TAU)
            }
        }
    }
}

/// Point at radius `r` and angle `angle` (counter-clockwise, y up).
pub fn polar_point(cx: f32, cy: f32, r: f32, angle: f32) -> (f32, f32) {
    (cx + r * angle.cos(), cy - r * angle.sin())
}

/// Position of `hz` along the frequency axis as a fraction of its length,
/// measured at bin centres. `None` above the last bin.
pub fn frequency_fraction(bin_frequencies: &[f32], hz: f32) -> Option<f32> {
    let n = bin_frequencies.len();
    let last = *bin_frequencies.last()?;
    if hz > last + 1e-3 || hz < bin_frequencies[0] {
        return None;
    }
    let j = bin_frequencies.partition_point(|&f| f <= hz).saturating_sub(1).min(n - 1);
    let index = if j + 1 < n {
        let (lo, hi) = (bin_frequencies[j], bin_frequencies[j + 1]);
        j as f32 + if hi > lo { (hz - lo) / (hi - lo) } else { 0.0 }
    } else {
        j as f32
    };
    Some((index + 0.5) / n as f32)
}

/// Everything the renderer and annotator need to agree on.
#[derive(Clone, Copy, Debug)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    /// Area handed to the plot before any polar squaring.
    pub plot: Rect,
    pub mapping: PlotMapping,
    pub title_band: Option<Rect>,
    pub title_font: ScaledFont,
    pub tick_font: ScaledFont,
    pub tick_len: u32,
    pub pad: u32,
    pub line_width: u32,
}

fn pt_to_px(pt: f32, dpi: u32) -> f32 {
    pt * dpi as f32 / 72.0
}

impl Layout {
    pub fn compute(
        theme: &ThemeSpec,
        matrix: &SpectrogramMatrix,
        width: u32,
        height: u32,
        dpi: u32,
        title: Option<&str>,
        position: TitlePosition,
    ) -> Result<Layout> {
        if width == 0 || height == 0 {
            return Err(Error::Render(format!("canvas has zero size ({width}x{height})")));
        }

        let title_face = if theme.title.bold { &FONT_9X18_BOLD } else { &FONT_10X20 };
        let title_font = ScaledFont::sized(title_face, pt_to_px(theme.title.size_pt, dpi));
        let tick_font = ScaledFont::sized(&FONT_6X10, pt_to_px(theme.axes.tick_size_pt, dpi));
        let pad = pt_to_px(4.0, dpi).round().max(1.0) as u32;
        let tick_len = pt_to_px(3.0, dpi).round().max(1.0) as u32;
        let line_width = pt_to_px(0.75, dpi).round().max(1.0) as u32;

        let mut top = 0u32;
        let mut bottom = 0u32;
        let title_band = title.map(|text| {
            let h = title_font.text_height(text) + 2 * pad;
            if position.is_top() {
                top += h;
                Rect { x: 0, y: 0, w: width, h }
            } else {
                bottom += h;
                Rect { x: 0, y: height.saturating_sub(h), w: width, h }
            }
        });

        // every layout keeps a one-pad margin around the plot
        let (mut left, mut right) = (pad, pad);
        top += pad;
        bottom += pad;

        let half_time_label = tick_font.text_width(TIME_LABEL_SAMPLE) / 2;
        let axis_band = tick_len + 2 * pad + tick_font.line_height();
        match (theme.annotation, theme.coordinates) {
            (AxisPolicy::Full, CoordinateSystem::Linear) => {
                let widest = freq_ticks(matrix.bin_frequencies.last().copied().unwrap_or(0.0) as f64, 8)
                    .into_iter()
                    .map(|f| tick_font.text_width(&freq_marker_label(f)))
                    .max()
                    .unwrap_or(0);
                left += widest + tick_len + pad;
                right += half_time_label;
                bottom += axis_band;
            }
            (AxisPolicy::TimeAxis, CoordinateSystem::Linear) => {
                left += half_time_label;
                right += half_time_label;
                bottom += axis_band;
            }
            _ => {}
        }

        let plot = Rect {
            x: left,
            y: top,
            w: width.saturating_sub(left + right),
            h: height.saturating_sub(top + bottom),
        };
        if plot.w == 0 || plot.h == 0 {
            return Err(Error::Render(format!("canvas {width}x{height} leaves no room for the plot")));
        }

        let mapping = match theme.coordinates {
            CoordinateSystem::Linear => PlotMapping::Linear { rect: plot },
            CoordinateSystem::Polar { inner_radius } => {
                let label_margin = if theme.annotation == AxisPolicy::Full {
                    tick_len + 2 * pad + tick_font.text_width(TIME_LABEL_SAMPLE)
                } else {
                    0
                };
                let radius = plot.w.min(plot.h) as f32 / 2.0 - label_margin as f32;
                if radius < 1.0 {
                    return Err(Error::Render(format!("canvas {width}x{height} too small for a polar plot")));
                }
                PlotMapping::Polar {
                    cx: plot.x as f32 + plot.w as f32 / 2.0,
                    cy: plot.y as f32 + plot.h as f32 / 2.0,
                    radius,
                    inner: radius * inner_radius.clamp(0.0, 0.99),
                }
            }
        };

        Ok(Layout {
            width,
            height,
            plot,
            mapping,
            title_band,
            title_font,
            tick_font,
            tick_len,
            pad,
            line_width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::builtin;
    use approx::assert_relative_eq;

    fn matrix(n_frames: usize, n_bins: usize) -> SpectrogramMatrix {
        let rows = vec![vec![-40.0; n_bins]; n_frames];
        let freqs = (0..n_bins).map(|j| j as f32 * 100.0).collect();
        SpectrogramMatrix::from_rows(&rows, freqs, 8000, 200, 100, -80.0).unwrap()
    }

    #[test]
    fn linear_cells_run_left_to_right_bottom_up() {
        let m = PlotMapping::Linear { rect: Rect { x: 10, y: 0, w: 100, h: 50 } };
        assert_eq!(m.cell_at(10, 49, 10, 5), Some((0, 0)));
        assert_eq!(m.cell_at(109, 0, 10, 5), Some((9, 4)));
        assert_eq!(m.cell_at(9, 10, 10, 5), None);
        assert_eq!(m.cell_at(110, 10, 10, 5), None);
    }

    #[test]
    fn polar_angle_is_counter_clockwise_from_east() {
        let m = PlotMapping::Polar { cx: 50.0, cy: 50.0, radius: 40.0, inner: 10.0 };
        // east of centre: first frame, outer bins toward the rim
        assert_eq!(m.cell_at(85, 49, 4, 3), Some((0, 2)));
        // north: second quarter
        assert_eq!(m.cell_at(49, 15, 4, 3), Some((1, 2)));
        // west and south
        assert_eq!(m.cell_at(15, 50, 4, 3).map(|c| c.0), Some(2));
        assert_eq!(m.cell_at(50, 85, 4, 3).map(|c| c.0), Some(3));
        // hole and outside
        assert_eq!(m.cell_at(50, 50, 4, 3), None);
        assert_eq!(m.cell_at(99, 99, 4, 3), None);
    }

    #[test]
    fn cell_center_lands_in_its_cell() {
        let maps = [
            PlotMapping::Linear { rect: Rect { x: 3, y: 7, w: 200, h: 90 } },
            PlotMapping::Polar { cx: 100.0, cy: 100.0, radius: 90.0, inner: 20.0 },
        ];
        for m in maps {
            for (f, b) in [(0, 0), (7, 3), (19, 9)] {
                let (x, y) = m.cell_center(f, b, 20, 10);
                assert_eq!(m.cell_at(x.floor() as u32, y.floor() as u32, 20, 10), Some((f, b)), "{m:?}");
            }
        }
    }

    #[test]
    fn frequency_fraction_interpolates() {
        let freqs = [0.0, 100.0, 200.0, 300.0];
        assert_relative_eq!(frequency_fraction(&freqs, 0.0).unwrap(), 0.125);
        assert_relative_eq!(frequency_fraction(&freqs, 150.0).unwrap(), 2.0 / 4.0);
        assert_relative_eq!(frequency_fraction(&freqs, 300.0).unwrap(), 0.875);
        assert!(frequency_fraction(&freqs, 400.0).is_none());
        assert!(frequency_fraction(&[], 10.0).is_none());
    }

    #[test]
    fn title_band_follows_position() {
        let theme = builtin::minimal();
        let m = matrix(10, 8);
        let top = Layout::compute(&theme, &m, 400, 200, 40, Some("t"), TitlePosition::TopCenter).unwrap();
        let pad = top.pad;
        assert_eq!(pad, 2);
        let band = top.title_band.unwrap();
        assert_eq!(band.y, 0);
        assert_eq!(top.plot.y, band.h + pad);

        let bottom = Layout::compute(&theme, &m, 400, 200, 40, Some("t"), TitlePosition::BottomLeft).unwrap();
        let band = bottom.title_band.unwrap();
        assert_eq!(band.bottom(), 200);
        assert_eq!(bottom.plot.y, pad);
        assert_eq!(bottom.plot.h, 200 - band.h - 2 * pad);

        let none = Layout::compute(&theme, &m, 400, 200, 40, None, TitlePosition::TopCenter).unwrap();
        assert_eq!(none.plot, Rect { x: 2, y: 2, w: 396, h: 196 });
    }

    #[test]
    fn full_axes_reserve_margins() {
        let theme = builtin::scientific();
        let m = matrix(10, 8);
        let layout = Layout::compute(&theme, &m, 480, 240, 40, None, TitlePosition::TopCenter).unwrap();
        assert!(layout.plot.x > 0);
        assert!(layout.plot.bottom() < 240);
    }

    #[test]
    fn layout_debug_shows_font_scales() {
        let m = matrix(10, 8);
        let layout = Layout::compute(&builtin::scientific(), &m, 480, 240, 40, Some("t"), TitlePosition::TopCenter).unwrap();
        let text = format!("{layout:?}");
        assert!(text.contains("title_font: ScaledFont"), "{text}");
        assert!(text.contains(&format!("scale: {}", layout.tick_font.scale)));
    }

    #[test]
    fn polar_uses_centred_square() {
        let theme = builtin::polar_minimal();
        let m = matrix(10, 8);
        let layout = Layout::compute(&theme, &m, 300, 200, 40, None, TitlePosition::TopCenter).unwrap();
        match layout.mapping {
            PlotMapping::Polar { cx, cy, radius, inner } => {
                assert_relative_eq!(cx, 150.0);
                assert_relative_eq!(cy, 100.0);
                assert_relative_eq!(radius, 98.0);
                assert_relative_eq!(inner, 4.9, epsilon = 1e-4);
            }
            other => panic!("expected polar mapping, got {other:?}"),
        }
    }

    #[test]
    fn zero_canvas_is_a_render_error() {
        let theme = builtin::minimal();
        let m = matrix(2, 2);
        assert!(matches!(
            Layout::compute(&theme, &m, 0, 100, 40, None, TitlePosition::TopCenter),
            Err(Error::Render(_))
        ));
    }
}
