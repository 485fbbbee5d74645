use image::{Rgba, RgbaImage};

use crate::canvas::annotate::{draw_axes, draw_title};
use crate::canvas::colors::ValueScale;
use crate::canvas::layout::{Layout, PlotMapping};
use crate::canvas::output::SpectrogramImage;
use crate::error::{Error, Result};
use crate::theme::ThemeSpec;
use crate::types::{RenderOptions, SpectrogramMatrix};

fn layout_for(matrix: &SpectrogramMatrix, theme: &ThemeSpec, options: &RenderOptions) -> Result<Layout> {
    if matrix.is_empty() {
        return Err(Error::Render("spectrogram has no frames or no bins".into()));
    }
    let dpi = options.dpi.unwrap_or(theme.figure.dpi);
    let (width, height) = theme.figure.pixels(options.dpi);
    let title = theme.resolve_title(options.title.as_deref());
    let position = options.title_position.unwrap_or(theme.title.position);
    Layout::compute(theme, matrix, width, height, dpi, title, position)
}

/// Where each (frame, bin) cell lands for this theme and request.
pub fn plot_mapping(matrix: &SpectrogramMatrix, theme: &ThemeSpec, options: &RenderOptions) -> Result<PlotMapping> {
    Ok(layout_for(matrix, theme, options)?.mapping)
}

/// Color scale used for a matrix under a theme.
pub fn value_scale(matrix: &SpectrogramMatrix, theme: &ThemeSpec) -> ValueScale {
    let lo = if theme.normalize_db { matrix.min_db() } else { matrix.floor_db };
    ValueScale { lo, hi: matrix.max_db(), gamma: theme.gamma }
}

/// Render a spectrogram through a theme.
///
/// Pixels outside the plot keep the background: alpha 0 for transparent
/// themes, the theme color otherwise.
pub fn render(matrix: &SpectrogramMatrix, theme: &ThemeSpec, options: &RenderOptions) -> Result<SpectrogramImage> {
    let layout = layout_for(matrix, theme, options)?;
    let (width, height) = (layout.width, layout.height);

    let mut img = match theme.background.color() {
        Some(bg) => RgbaImage::from_pixel(width, height, Rgba(bg.rgba())),
        None => RgbaImage::new(width, height),
    };

    let scale = value_scale(matrix, theme);
    let lut = theme.colormap.lut();
    let (n_frames, n_bins) = (matrix.n_frames(), matrix.n_bins());
    let bounds = layout.mapping.bounds(width, height);

    for y in bounds.y..bounds.bottom() {
        for x in bounds.x..bounds.right() {
            if let Some((frame, bin)) = layout.mapping.cell_at(x, y, n_frames, n_bins) {
                let color = lut[scale.index(matrix.get(frame, bin))];
                img.put_pixel(x, y, Rgba(color));
            }
        }
    }

    draw_axes(&mut img, &layout, matrix, theme);
    if let Some(text) = theme.resolve_title(options.title.as_deref()) {
        let position = options.title_position.unwrap_or(theme.title.position);
        draw_title(&mut img, &layout, text, position, theme);
    }

    log::debug!(
        "rendered {} ({}x{}, {} frames x {} bins, {:.1}..{:.1} dB)",
        theme.name,
        width,
        height,
        n_frames,
        n_bins,
        scale.lo,
        scale.hi,
    );

    Ok(SpectrogramImage::new(img, theme.output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::colors::Rgb;
    use crate::theme::builtin;

    /// One loud cell at (frame 5, bin 3), everything else at the floor.
    fn spike() -> SpectrogramMatrix {
        let mut rows = vec![vec![-80.0; 8]; 20];
        rows[5][3] = 0.0;
        let freqs = (0..8).map(|j| j as f32 * 500.0).collect();
        SpectrogramMatrix::from_rows(&rows, freqs, 8000, 800, 400, -80.0).unwrap()
    }

    fn small() -> RenderOptions {
        RenderOptions::new().with_dpi(30).with_title("")
    }

    #[test]
    fn canvas_matches_figure_size() {
        let theme = builtin::scientific();
        let img = render(&spike(), &theme, &small()).unwrap();
        assert_eq!((img.width(), img.height()), (360, 180));
    }

    #[test]
    fn empty_matrix_is_a_render_error() {
        let m = SpectrogramMatrix::from_rows(&[], vec![0.0], 8000, 200, 100, -80.0).unwrap();
        assert!(matches!(render(&m, &builtin::minimal(), &small()), Err(Error::Render(_))));
    }

    #[test]
    fn loud_cell_gets_top_of_colormap() {
        let m = spike();
        for theme in [builtin::minimal(), builtin::polar_minimal()] {
            let img = render(&m, &theme, &small()).unwrap();
            let mapping = plot_mapping(&m, &theme, &small()).unwrap();
            let (x, y) = mapping.cell_center(5, 3, m.n_frames(), m.n_bins());
            let top = theme.colormap.eval(1.0).rgba();
            assert_eq!(img.pixels.get_pixel(x as u32, y as u32).0, top, "{}", theme.name);
        }
    }

    #[test]
    fn transparent_background_stays_clear_outside_the_ring() {
        let theme = builtin::polar_minimal();
        let img = render(&spike(), &theme, &small()).unwrap();
        assert_eq!(img.pixels.get_pixel(0, 0).0[3], 0);
        assert!(img.has_alpha());

        let opaque = builtin::polar_grayscale();
        let img = render(&spike(), &opaque, &small()).unwrap();
        assert!(!img.has_alpha());
        assert_eq!(img.pixels.get_pixel(0, 0).0, Rgb::WHITE.rgba());
    }

    #[test]
    fn requested_title_is_drawn_on_bare_theme() {
        let theme = builtin::polar_grayscale();
        let plain = render(&spike(), &theme, &small()).unwrap();
        let titled = render(&spike(), &theme, &small().with_title("HELLO")).unwrap();
        assert_ne!(plain.pixels, titled.pixels);
        assert_eq!(render(&spike(), &theme, &RenderOptions::new().with_dpi(30)).unwrap().pixels, plain.pixels);
    }

    #[test]
    fn normalize_stretches_to_matrix_range() {
        let rows = vec![vec![-30.0, -20.0], vec![-25.0, -20.0]];
        let m = SpectrogramMatrix::from_rows(&rows, vec![0.0, 100.0], 1000, 20, 10, -80.0).unwrap();
        let mut theme = builtin::minimal();
        theme.gamma = 1.0;
        let s = value_scale(&m, &theme);
        assert_eq!((s.lo, s.hi), (-30.0, -20.0));
        theme.normalize_db = false;
        assert_eq!(value_scale(&m, &theme).lo, -80.0);
    }

    #[test]
    fn rendering_is_deterministic() {
        let theme = builtin::scientific();
        let opts = RenderOptions::new().with_dpi(30);
        let a = render(&spike(), &theme, &opts).unwrap();
        let b = render(&spike(), &theme, &opts).unwrap();
        assert_eq!(a.pixels, b.pixels);
    }
}
