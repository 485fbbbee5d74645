use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// An opaque 8-bit RGB color, written as `#rrggbb` in theme files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    pub fn parse(s: &str) -> Option<Rgb> {
        let hex = s.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }

    /// Relative luminance in [0, 1] (sRGB weights, no gamma expansion).
    pub fn luminance(self) -> f32 {
        let [r, g, b] = self.0;
        (0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32) / 255.0
    }

    pub fn rgba(self) -> [u8; 4] {
        let [r, g, b] = self.0;
        [r, g, b, 255]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rgb::parse(&s).ok_or_else(|| Error::InvalidParameters(format!("invalid color {s:?}")))
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> String {
        c.to_string()
    }
}

/// Minimum luminance difference for a title to count as legible.
const MIN_TITLE_CONTRAST: f32 = 0.3;

/// Keep `fg` if it stands out against `bg`, otherwise pick black or white.
pub fn legible_on(fg: Rgb, bg: Rgb) -> Rgb {
    if (fg.luminance() - bg.luminance()).abs() >= MIN_TITLE_CONTRAST {
        fg
    } else if bg.luminance() > 0.5 {
        Rgb::BLACK
    } else {
        Rgb::WHITE
    }
}

/// Color palettes for spectrogram cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Colormap {
    #[default]
    Magma,
    Viridis,
    Plasma,
    Inferno,
    Cividis,
    Turbo,
    /// Black (quiet) to white (loud).
    Gray,
    /// White (quiet) to black (loud).
    #[serde(alias = "gray_r")]
    GrayReversed,
}

impl Colormap {
    pub const ALL: [Colormap; 8] = [
        Colormap::Magma,
        Colormap::Viridis,
        Colormap::Plasma,
        Colormap::Inferno,
        Colormap::Cividis,
        Colormap::Turbo,
        Colormap::Gray,
        Colormap::GrayReversed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Colormap::Magma => "magma",
            Colormap::Viridis => "viridis",
            Colormap::Plasma => "plasma",
            Colormap::Inferno => "inferno",
            Colormap::Cividis => "cividis",
            Colormap::Turbo => "turbo",
            Colormap::Gray => "gray",
            Colormap::GrayReversed => "gray-reversed",
        }
    }

    /// Map `t` in [0, 1] to a color.
    pub fn eval(self, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0) as f64;
        let c = match self {
            Colormap::Magma => colorous::MAGMA.eval_continuous(t),
            Colormap::Viridis => colorous::VIRIDIS.eval_continuous(t),
            Colormap::Plasma => colorous::PLASMA.eval_continuous(t),
            Colormap::Inferno => colorous::INFERNO.eval_continuous(t),
            Colormap::Cividis => colorous::CIVIDIS.eval_continuous(t),
            Colormap::Turbo => colorous::TURBO.eval_continuous(t),
            Colormap::Gray => colorous::GREYS.eval_continuous(1.0 - t),
            Colormap::GrayReversed => colorous::GREYS.eval_continuous(t),
        };
        Rgb([c.r, c.g, c.b])
    }

    /// 256-entry lookup table, index = `round(t * 255)`.
    pub fn lut(self) -> Vec<[u8; 4]> {
        (0..256).map(|i| self.eval(i as f32 / 255.0).rgba()).collect()
    }
}

impl FromStr for Colormap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('_', "-");
        if name == "gray-r" {
            return Ok(Colormap::GrayReversed);
        }
        Colormap::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| Error::InvalidParameters(format!("unknown colormap {s:?}")))
    }
}

/// Maps dB values to [0, 1]: linear between `lo` and `hi`, then raised to `gamma`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueScale {
    pub lo: f32,
    pub hi: f32,
    pub gamma: f32,
}

impl ValueScale {
    #[inline]
    pub fn apply(&self, db: f32) -> f32 {
        let span = self.hi - self.lo;
        if span <= f32::EPSILON {
            return 0.0;
        }
        let t = ((db - self.lo) / span).clamp(0.0, 1.0);
        if self.gamma == 1.0 {
            t
        } else {
            t.powf(self.gamma)
        }
    }

    /// LUT index for a dB value.
    #[inline]
    pub fn index(&self, db: f32) -> usize {
        ((self.apply(db) * 255.0).round() as usize).min(255)
    }
}

/// Label for a frequency tick.
pub fn freq_marker_label(freq_hz: f64) -> String {
    if freq_hz < 1000.0 {
        format!("{} Hz", freq_hz.round() as u32)
    } else if (freq_hz / 1000.0).fract().abs() < 1e-6 {
        format!("{} kHz", (freq_hz / 1000.0).round() as u32)
    } else {
        format!("{:.1} kHz", freq_hz / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_hex() {
        assert_eq!(Rgb::parse("#CCCCCC"), Some(Rgb([204, 204, 204])));
        assert_eq!(Rgb::parse("000004"), None);
        assert_eq!(Rgb::parse("#12345"), None);
        assert_eq!(Rgb([0, 0, 4]).to_string(), "#000004");
        let json = serde_json::to_string(&Rgb([255, 0, 16])).unwrap();
        assert_eq!(json, "\"#ff0010\"");
        assert!(serde_json::from_str::<Rgb>("\"red\"").is_err());
    }

    #[test]
    fn gray_maps_run_in_opposite_directions() {
        let low = Colormap::Gray.eval(0.0);
        let high = Colormap::Gray.eval(1.0);
        assert!(high.luminance() > low.luminance());
        let low_r = Colormap::GrayReversed.eval(0.0);
        let high_r = Colormap::GrayReversed.eval(1.0);
        assert!(high_r.luminance() < low_r.luminance());
    }

    #[test]
    fn perceptual_maps_brighten_with_level() {
        for cmap in [Colormap::Magma, Colormap::Viridis, Colormap::Plasma, Colormap::Inferno] {
            assert!(cmap.eval(1.0).luminance() > cmap.eval(0.0).luminance(), "{cmap:?}");
            assert_eq!(cmap.lut().len(), 256);
        }
    }

    #[test]
    fn colormap_names_parse_back() {
        for cmap in Colormap::ALL {
            assert_eq!(cmap.name().parse::<Colormap>().unwrap(), cmap);
        }
        assert_eq!("gray_r".parse::<Colormap>().unwrap(), Colormap::GrayReversed);
        assert_eq!("Viridis".parse::<Colormap>().unwrap(), Colormap::Viridis);
        assert!("twilight".parse::<Colormap>().is_err());
    }

    #[test]
    fn value_scale_applies_gamma() {
        let s = ValueScale { lo: -80.0, hi: 0.0, gamma: 2.0 };
        assert_eq!(s.apply(-80.0), 0.0);
        assert_eq!(s.apply(0.0), 1.0);
        assert!((s.apply(-40.0) - 0.25).abs() < 1e-6);
        assert_eq!(s.apply(-200.0), 0.0);
        assert_eq!(s.index(0.0), 255);

        let flat = ValueScale { lo: -10.0, hi: -10.0, gamma: 1.0 };
        assert_eq!(flat.apply(-10.0), 0.0);

        let inverted = ValueScale { lo: -80.0, hi: 0.0, gamma: -1.0 };
        assert_eq!(inverted.index(-80.0), 255);
    }

    #[test]
    fn title_contrast_flips_when_needed() {
        assert_eq!(legible_on(Rgb::BLACK, Rgb::WHITE), Rgb::BLACK);
        assert_eq!(legible_on(Rgb([10, 10, 10]), Rgb::BLACK), Rgb::WHITE);
        assert_eq!(legible_on(Rgb([240, 240, 240]), Rgb::WHITE), Rgb::BLACK);
    }

    #[test]
    fn frequency_labels() {
        assert_eq!(freq_marker_label(500.0), "500 Hz");
        assert_eq!(freq_marker_label(2000.0), "2 kHz");
        assert_eq!(freq_marker_label(2500.0), "2.5 kHz");
    }
}
