//! Named visual presets.
//!
//! A [`ThemeSpec`] bundles everything that decides how a spectrogram looks:
//! coordinate system, palette, figure geometry, annotation and the STFT
//! parameters tuned for it. Specs are plain serde records so extra themes can
//! be declared in JSON next to the built-in ones.

pub mod builtin;
pub mod grid;
pub mod registry;

use serde::{Deserialize, Serialize};

use crate::canvas::colors::{Colormap, Rgb};
use crate::canvas::output::OutputFormat;
use crate::dsp::TransformParams;
use crate::error::{Error, Result};
use crate::types::TitlePosition;

pub use grid::{parse_axis, Override, ParameterGrid, Projection, Variant};
pub use registry::ThemeRegistry;

/// How (frame, bin) cells are laid out on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CoordinateSystem {
    /// Time left to right, frequency bottom to top.
    Linear,
    /// Time as angle, frequency as radius. `inner_radius` is the fraction of
    /// the outer radius left empty in the middle.
    Polar { inner_radius: f32 },
}

impl CoordinateSystem {
    pub fn is_polar(&self) -> bool {
        matches!(self, CoordinateSystem::Polar { .. })
    }

    /// Same variant, ignoring parameters.
    pub fn same_kind(&self, other: &CoordinateSystem) -> bool {
        self.is_polar() == other.is_polar()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Background {
    Transparent,
    Opaque(Rgb),
}

impl Background {
    pub fn color(&self) -> Option<Rgb> {
        match self {
            Background::Transparent => None,
            Background::Opaque(c) => Some(*c),
        }
    }
}

/// Which annotations are drawn around the plot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AxisPolicy {
    /// Bare plot.
    None,
    #[default]
    TitleOnly,
    /// Title plus a time axis.
    TimeAxis,
    /// Title, time and frequency axes with a frame.
    Full,
}

impl AxisPolicy {
    pub fn draws_title(self) -> bool {
        self != AxisPolicy::None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FigureSize {
    pub width_in: f32,
    pub height_in: f32,
    pub dpi: u32,
}

impl FigureSize {
    /// Canvas size in pixels, optionally at another resolution.
    pub fn pixels(&self, dpi_override: Option<u32>) -> (u32, u32) {
        let dpi = dpi_override.unwrap_or(self.dpi) as f32;
        let w = (self.width_in * dpi).round().max(0.0) as u32;
        let h = (self.height_in * dpi).round().max(0.0) as u32;
        (w, h)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleStyle {
    /// Default text. Empty means no title unless a request supplies one.
    pub text: String,
    pub size_pt: f32,
    pub bold: bool,
    pub color: Rgb,
    pub position: TitlePosition,
}

impl Default for TitleStyle {
    fn default() -> Self {
        Self {
            text: "Spectrogram".into(),
            size_pt: 16.0,
            bold: false,
            color: Rgb::BLACK,
            position: TitlePosition::TopCenter,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesStyle {
    pub axes_color: Rgb,
    pub tick_color: Rgb,
    pub tick_size_pt: f32,
    /// Preferred spacing of time ticks in seconds.
    pub time_tick_secs: f64,
}

impl Default for AxesStyle {
    fn default() -> Self {
        Self {
            axes_color: Rgb::BLACK,
            tick_color: Rgb::BLACK,
            tick_size_pt: 10.0,
            time_tick_secs: 15.0,
        }
    }
}

/// An immutable theme record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThemeSpec {
    pub name: String,
    pub coordinates: CoordinateSystem,
    #[serde(default)]
    pub colormap: Colormap,
    pub background: Background,
    #[serde(default)]
    pub annotation: AxisPolicy,
    pub figure: FigureSize,
    #[serde(default)]
    pub title: TitleStyle,
    #[serde(default)]
    pub axes: AxesStyle,
    #[serde(default)]
    pub transform: TransformParams,
    /// Power applied to normalized levels; below 1 lifts quiet detail.
    #[serde(default = "default_gamma")]
    pub gamma: f32,
    /// Stretch colors between the matrix min and max instead of floor and max.
    #[serde(default)]
    pub normalize_db: bool,
    #[serde(default)]
    pub output: OutputFormat,
}

fn default_gamma() -> f32 {
    1.0
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

impl ThemeSpec {
    /// Text drawn for a request: the override if given, else the theme's own.
    /// Bare themes drop only their default text; a requested title is always drawn.
    pub fn resolve_title<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        let text = match requested {
            Some(text) => text,
            None if self.annotation.draws_title() => self.title.text.as_str(),
            None => return None,
        };
        (!text.trim().is_empty()).then_some(text)
    }

    /// Reject values the transform or renderer cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |what: String| Err(Error::InvalidParameters(format!("theme {}: {what}", self.name)));

        if !positive(self.gamma) {
            return invalid(format!("gamma must be finite and > 0, got {}", self.gamma));
        }
        if let CoordinateSystem::Polar { inner_radius } = self.coordinates {
            if !(0.0..1.0).contains(&inner_radius) {
                return invalid(format!("inner_radius must be in [0, 1), got {inner_radius}"));
            }
        }
        let fig = &self.figure;
        if !positive(fig.width_in) || !positive(fig.height_in) || fig.dpi == 0 {
            return invalid(format!(
                "figure {}x{} in at {} dpi is empty",
                fig.width_in, fig.height_in, fig.dpi
            ));
        }
        if !positive(self.title.size_pt) || !positive(self.axes.tick_size_pt) {
            return invalid("font sizes must be > 0".into());
        }
        if !(self.axes.time_tick_secs.is_finite() && self.axes.time_tick_secs > 0.0) {
            return invalid(format!("time tick interval must be > 0, got {}", self.axes.time_tick_secs));
        }
        let t = &self.transform;
        if t.window_size == 0 || t.hop_size == 0 || t.hop_size >= t.window_size {
            return invalid(format!("hop {} must be in 1..{}", t.hop_size, t.window_size));
        }
        if !positive(t.reference) || !t.floor_db.is_finite() || t.max_freq.is_some_and(|f| !positive(f)) {
            return invalid("reference and max_freq must be > 0 and the dB floor finite".into());
        }
        if let OutputFormat::Jpeg { quality } = self.output {
            if !(1..=100).contains(&quality) {
                return invalid(format!("jpeg quality must be 1..=100, got {quality}"));
            }
        }
        Ok(())
    }
}

/// Lower-case, `_` accepted for `-`.
pub fn canonical_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}
