//! Titles, frames, ticks and labels drawn over a rendered plot.

use std::f32::consts::TAU;

use image::RgbaImage;

use super::colors::{freq_marker_label, legible_on, Rgb};
use super::layout::{frequency_fraction, polar_point, Layout, PlotMapping, Rect};
use super::raster::{draw_circle, draw_line, draw_text, Anchor};
use super::time_markers::{format_time_label, freq_ticks, time_ticks};
use crate::theme::{AxisPolicy, Background, ThemeSpec};
use crate::types::{SpectrogramMatrix, TitlePosition};

/// Draw the axes the theme's policy asks for.
pub fn draw_axes(img: &mut RgbaImage, layout: &Layout, matrix: &SpectrogramMatrix, theme: &ThemeSpec) {
    match (theme.annotation, layout.mapping) {
        (AxisPolicy::Full, PlotMapping::Linear { rect }) => {
            draw_frame(img, rect, theme.axes.axes_color, layout.line_width);
            draw_time_axis(img, layout, rect, matrix, theme, false);
            draw_freq_axis(img, layout, rect, matrix, theme);
        }
        (AxisPolicy::TimeAxis, PlotMapping::Linear { rect }) => {
            draw_time_axis(img, layout, rect, matrix, theme, true);
        }
        (AxisPolicy::Full, PlotMapping::Polar { cx, cy, radius, inner }) => {
            draw_polar_grid(img, layout, (cx, cy, radius, inner), matrix, theme);
        }
        _ => {}
    }
}

fn draw_frame(img: &mut RgbaImage, rect: Rect, color: Rgb, width: u32) {
    let (x0, y0) = (rect.x as i32, rect.y as i32);
    let (x1, y1) = (rect.right() as i32 - 1, rect.bottom() as i32 - 1);
    draw_line(img, (x0, y0), (x1, y0), color, width);
    draw_line(img, (x1, y0), (x1, y1), color, width);
    draw_line(img, (x1, y1), (x0, y1), color, width);
    draw_line(img, (x0, y1), (x0, y0), color, width);
}

/// Ticks and m:ss labels under the plot. A detached axis sits one pad below
/// the plot and spans only the tick range.
fn draw_time_axis(
    img: &mut RgbaImage,
    layout: &Layout,
    rect: Rect,
    matrix: &SpectrogramMatrix,
    theme: &ThemeSpec,
    detached: bool,
) {
    let duration = matrix.duration_secs();
    let min_spacing = layout.tick_font.text_width("00:00") as f64 + 2.0 * layout.pad as f64;
    let (interval, ticks) = time_ticks(duration, theme.axes.time_tick_secs, rect.w as f64, min_spacing);
    if ticks.is_empty() {
        return;
    }

    let x_of = |t: f64| rect.x as i32 + (t / duration * rect.w as f64).round() as i32;
    let spine_y = rect.bottom() as i32 + if detached { layout.pad as i32 } else { 0 };
    let tick_end = spine_y + layout.tick_len as i32;

    if detached {
        let first = x_of(ticks[0]);
        let last = x_of(ticks[ticks.len() - 1]);
        draw_line(img, (first, spine_y), (last, spine_y), theme.axes.axes_color, layout.line_width);
    }
    for &t in &ticks {
        let x = x_of(t);
        draw_line(img, (x, spine_y), (x, tick_end), theme.axes.tick_color, layout.line_width);
        draw_text(
            img,
            &format_time_label(t, interval),
            x,
            tick_end + layout.pad as i32,
            layout.tick_font,
            theme.axes.tick_color,
            Anchor::TOP_CENTER,
        );
    }
}

fn draw_freq_axis(img: &mut RgbaImage, layout: &Layout, rect: Rect, matrix: &SpectrogramMatrix, theme: &ThemeSpec) {
    let Some(&max_freq) = matrix.bin_frequencies.last() else {
        return;
    };
    let max_ticks = (rect.h / (layout.tick_font.line_height() * 2).max(1)).clamp(1, 8) as usize;
    let x = rect.x as i32;
    for hz in freq_ticks(max_freq as f64, max_ticks) {
        let Some(frac) = frequency_fraction(&matrix.bin_frequencies, hz as f32) else {
            continue;
        };
        let y = rect.bottom() as i32 - (frac * rect.h as f32).round() as i32;
        draw_line(img, (x - layout.tick_len as i32, y), (x, y), theme.axes.tick_color, layout.line_width);
        draw_text(
            img,
            &freq_marker_label(hz),
            x - (layout.tick_len + layout.pad) as i32,
            y,
            layout.tick_font,
            theme.axes.tick_color,
            Anchor::MIDDLE_RIGHT,
        );
    }
}

/// Outline, frequency rings, time spokes and angular labels.
fn draw_polar_grid(
    img: &mut RgbaImage,
    layout: &Layout,
    (cx, cy, radius, inner): (f32, f32, f32, f32),
    matrix: &SpectrogramMatrix,
    theme: &ThemeSpec,
) {
    let axes = &theme.axes;
    let lw = layout.line_width;
    let centre = (cx.round() as i32, cy.round() as i32);
    let at = |r: f32, angle: f32| {
        let (x, y) = polar_point(cx, cy, r, angle);
        (x.round() as i32, y.round() as i32)
    };

    if let Some(&max_freq) = matrix.bin_frequencies.last() {
        for hz in freq_ticks(max_freq as f64, 4) {
            if let Some(frac) = frequency_fraction(&matrix.bin_frequencies, hz as f32) {
                let r = inner + frac * (radius - inner);
                draw_circle(img, centre, r.round() as u32, axes.axes_color, lw);
            }
        }
    }

    let duration = matrix.duration_secs();
    let min_spacing = layout.tick_font.text_width("00:00") as f64 + 2.0 * layout.pad as f64;
    let (interval, ticks) = time_ticks(duration, axes.time_tick_secs, TAU as f64 * radius as f64, min_spacing);
    let label_r = radius + (layout.tick_len + layout.pad) as f32 + layout.tick_font.text_width("00:00") as f32 / 2.0;
    for &t in &ticks {
        let angle = (t / duration) as f32 * TAU;
        draw_line(img, at(inner, angle), at(radius, angle), axes.axes_color, lw);
        draw_line(img, at(radius, angle), at(radius + layout.tick_len as f32, angle), axes.tick_color, lw);
        let (lx, ly) = at(label_r, angle);
        draw_text(img, &format_time_label(t, interval), lx, ly, layout.tick_font, axes.tick_color, Anchor::MIDDLE_CENTER);
    }

    draw_circle(img, centre, radius.round() as u32, axes.axes_color, lw);
    if inner >= 1.0 {
        draw_circle(img, centre, inner.round() as u32, axes.axes_color, lw);
    }
}

/// Draw `text` in the title band. On opaque backgrounds the color is swapped
/// for black or white when it would not stand out.
pub fn draw_title(img: &mut RgbaImage, layout: &Layout, text: &str, position: TitlePosition, theme: &ThemeSpec) {
    let Some(band) = layout.title_band else {
        return;
    };
    let color = match theme.background {
        Background::Opaque(bg) => legible_on(theme.title.color, bg),
        Background::Transparent => theme.title.color,
    };
    let pad = layout.pad as i32;
    let (x, anchor) = match position {
        TitlePosition::TopLeft | TitlePosition::BottomLeft => (pad, Anchor::TOP_LEFT),
        TitlePosition::TopCenter | TitlePosition::BottomCenter => (band.w as i32 / 2, Anchor::TOP_CENTER),
        TitlePosition::TopRight | TitlePosition::BottomRight => (band.right() as i32 - pad, Anchor::TOP_RIGHT),
    };
    draw_text(img, text, x, band.y as i32 + pad, layout.title_font, color, anchor);
}
