//! Batches of theme variants.
//!
//! A [`ParameterGrid`] crosses a base theme with lists of field values. Each
//! combination becomes a derived theme named after the values that make it
//! different, e.g. `spectrogram_magma_polar_11x5_gamma4_dpi300_hole0.3.png`.

use std::fmt::Write as _;

use super::{canonical_name, Background, CoordinateSystem, ThemeSpec};
use crate::canvas::colors::{Colormap, Rgb};
use crate::error::{Error, Result};

/// Hole left in the middle when a linear theme is switched to polar.
pub const DEFAULT_INNER_RADIUS: f32 = 0.05;

const PLAIN_WINDOW_SIZE: usize = 256;
const PLAIN_MAX_FREQ: f32 = 18_000.0;
const MAX_TITLE_CHARS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    Linear,
    Polar,
}

/// One theme field set to one value.
#[derive(Clone, Debug, PartialEq)]
pub enum Override {
    Colormap(Colormap),
    Projection(Projection),
    /// Only meaningful on polar themes.
    InnerRadius(f32),
    FigureSize { width_in: f32, height_in: f32 },
    Dpi(u32),
    Gamma(f32),
    Background(Background),
    TitleText(String),
    TitleSize(f32),
    /// STFT window; the hop follows so the overlap ratio is kept.
    WindowSize(usize),
    MaxFreq(f32),
}

impl Override {
    fn apply(&self, theme: &mut ThemeSpec) {
        match self {
            Override::Colormap(c) => theme.colormap = *c,
            Override::Projection(Projection::Linear) => theme.coordinates = CoordinateSystem::Linear,
            Override::Projection(Projection::Polar) => {
                if !theme.coordinates.is_polar() {
                    theme.coordinates = CoordinateSystem::Polar { inner_radius: DEFAULT_INNER_RADIUS };
                }
            }
            Override::InnerRadius(r) => {
                if let CoordinateSystem::Polar { inner_radius } = &mut theme.coordinates {
                    *inner_radius = *r;
                }
            }
            Override::FigureSize { width_in, height_in } => {
                theme.figure.width_in = *width_in;
                theme.figure.height_in = *height_in;
            }
            Override::Dpi(dpi) => theme.figure.dpi = *dpi,
            Override::Gamma(g) => theme.gamma = *g,
            Override::Background(bg) => theme.background = *bg,
            Override::TitleText(text) => theme.title.text = text.clone(),
            Override::TitleSize(pt) => theme.title.size_pt = *pt,
            Override::WindowSize(size) => {
                let t = &mut theme.transform;
                let overlap = t.hop_size as f64 / t.window_size.max(1) as f64;
                t.window_size = *size;
                t.hop_size = ((*size as f64 * overlap).round() as usize).max(1);
            }
            Override::MaxFreq(hz) => theme.transform.max_freq = Some(*hz),
        }
    }

    /// Projection changes go first so a hole size set in the same
    /// combination lands on the polar theme.
    fn order(&self) -> u8 {
        match self {
            Override::Projection(_) => 0,
            _ => 1,
        }
    }
}

/// Parse one grid axis written as `key=v1,v2,...`.
///
/// Keys: `cmap`, `projection`, `hole`, `figsize` (`11x5`), `dpi`, `gamma`,
/// `background` (`transparent`, `white`, `black` or `#rrggbb`), `title`,
/// `title-size`, `window` and `max-freq`. Underscores are accepted for dashes.
pub fn parse_axis(spec: &str) -> Result<Vec<Override>> {
    let (key, values) = spec
        .split_once('=')
        .ok_or_else(|| Error::InvalidParameters(format!("grid axis {spec:?} is not key=values")))?;
    let key = canonical_name(key);

    let invalid = |value: &str| Error::InvalidParameters(format!("bad {key} value {value:?}"));
    let number = |value: &str| value.parse::<f32>().map_err(|_| invalid(value));

    values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|value| -> Result<Override> {
            Ok(match key.as_str() {
                "cmap" | "colormap" => Override::Colormap(value.parse()?),
                "projection" => match value.to_ascii_lowercase().as_str() {
                    "linear" => Override::Projection(Projection::Linear),
                    "polar" => Override::Projection(Projection::Polar),
                    _ => return Err(invalid(value)),
                },
                "hole" | "inner-radius" => Override::InnerRadius(number(value)?),
                "figsize" => {
                    let (w, h) = value.split_once('x').ok_or_else(|| invalid(value))?;
                    Override::FigureSize { width_in: number(w)?, height_in: number(h)? }
                }
                "dpi" => Override::Dpi(value.parse().map_err(|_| invalid(value))?),
                "gamma" => Override::Gamma(number(value)?),
                "background" => Override::Background(match value.to_ascii_lowercase().as_str() {
                    "transparent" => Background::Transparent,
                    "white" => Background::Opaque(Rgb::WHITE),
                    "black" => Background::Opaque(Rgb::BLACK),
                    _ => Background::Opaque(Rgb::parse(value).ok_or_else(|| invalid(value))?),
                }),
                "title" => Override::TitleText(value.to_string()),
                "title-size" => Override::TitleSize(number(value)?),
                "window" | "nperseg" => Override::WindowSize(value.parse().map_err(|_| invalid(value))?),
                "max-freq" => Override::MaxFreq(number(value)?),
                _ => return Err(Error::InvalidParameters(format!("unknown grid key {key:?}"))),
            })
        })
        .collect()
}

/// A derived theme and the file name its image is written under.
#[derive(Clone, Debug)]
pub struct Variant {
    pub file_name: String,
    pub theme: ThemeSpec,
}

/// A base theme crossed with value lists, one list per axis.
#[derive(Clone, Debug)]
pub struct ParameterGrid {
    base: ThemeSpec,
    axes: Vec<Vec<Override>>,
}

impl ParameterGrid {
    pub fn new(base: ThemeSpec) -> Self {
        Self { base, axes: Vec::new() }
    }

    /// Add an axis. Every existing combination is repeated once per value.
    pub fn vary(mut self, values: impl IntoIterator<Item = Override>) -> Self {
        self.axes.push(values.into_iter().collect());
        self
    }

    pub fn base(&self) -> &ThemeSpec {
        &self.base
    }

    /// Number of combinations. A grid without axes has one: the base.
    pub fn count(&self) -> usize {
        self.axes.iter().map(Vec::len).product()
    }

    /// Cartesian product of the axes; the first axis varies slowest.
    pub fn combinations(&self) -> Vec<Vec<Override>> {
        let mut combos = vec![Vec::new()];
        for axis in &self.axes {
            combos = combos
                .into_iter()
                .flat_map(|prefix| {
                    axis.iter().map(move |value| {
                        let mut combo = prefix.clone();
                        combo.push(value.clone());
                        combo
                    })
                })
                .collect();
        }
        combos
    }

    /// Every combination applied to the base theme and validated.
    pub fn variants(&self) -> Result<Vec<Variant>> {
        self.combinations()
            .into_iter()
            .map(|combo| {
                let mut theme = self.base.clone();
                let mut ordered: Vec<&Override> = combo.iter().collect();
                ordered.sort_by_key(|o| o.order());
                for o in ordered {
                    o.apply(&mut theme);
                }

                let file_name = variant_file_name(&theme, &combo);
                theme.name = canonical_name(file_name.rsplit_once('.').map_or(file_name.as_str(), |(stem, _)| stem));
                theme.validate()?;
                Ok(Variant { file_name, theme })
            })
            .collect()
    }
}

/// Descriptive file name for a derived theme.
///
/// Colormap, projection, figure size, gamma and dpi are always encoded. The
/// hole size, window and frequency limit are added when they differ from the
/// plain values; background, title size and title text when `overrides` set them.
pub fn variant_file_name(theme: &ThemeSpec, overrides: &[Override]) -> String {
    let projection = if theme.coordinates.is_polar() { "polar" } else { "linear" };
    let fig = &theme.figure;
    let mut name = format!(
        "spectrogram_{}_{projection}_{}x{}_gamma{}_dpi{}",
        theme.colormap.name(),
        fig.width_in,
        fig.height_in,
        theme.gamma,
        fig.dpi
    );

    if let CoordinateSystem::Polar { inner_radius } = theme.coordinates {
        if inner_radius != DEFAULT_INNER_RADIUS {
            let _ = write!(name, "_hole{inner_radius}");
        }
    }
    if theme.transform.window_size != PLAIN_WINDOW_SIZE {
        let _ = write!(name, "_seg{}", theme.transform.window_size);
    }
    if let Some(hz) = theme.transform.max_freq.filter(|&hz| hz != PLAIN_MAX_FREQ) {
        let _ = write!(name, "_freq{hz}");
    }
    for o in overrides {
        match o {
            Override::Background(Background::Transparent) => name.push_str("_transparent"),
            Override::Background(Background::Opaque(c)) => {
                let _ = write!(name, "_bg{}", c.to_string().trim_start_matches('#'));
            }
            Override::TitleSize(pt) => {
                let _ = write!(name, "_title{pt}pt");
            }
            _ => {}
        }
    }
    if let Some(text) = overrides.iter().find_map(|o| match o {
        Override::TitleText(t) => Some(t),
        _ => None,
    }) {
        let clean: String = text.chars().filter(|c| !c.is_whitespace()).take(MAX_TITLE_CHARS).collect();
        if !clean.is_empty() {
            let _ = write!(name, "_{clean}");
        }
    }

    let _ = write!(name, ".{}", theme.output.extension());
    name
}
