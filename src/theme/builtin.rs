use crate::canvas::colors::{Colormap, Rgb};
use crate::canvas::output::OutputFormat;
use crate::dsp::TransformParams;
use crate::types::TitlePosition;

use super::{AxesStyle, AxisPolicy, Background, CoordinateSystem, FigureSize, ThemeSpec, TitleStyle};

const FAINT_GRAY: Rgb = Rgb([0xcc, 0xcc, 0xcc]);
const DARK_GRAY: Rgb = Rgb([0x33, 0x33, 0x33]);
const NEAR_BLACK: Rgb = Rgb([0x00, 0x00, 0x04]);

/// 2048-sample windows with 1900 samples of overlap.
fn dense_transform(max_freq: f32) -> TransformParams {
    TransformParams::new(2048, 148).with_max_freq(max_freq)
}

/// 256-sample windows at 50% overlap.
fn coarse_transform(max_freq: f32) -> TransformParams {
    TransformParams::new(256, 128).with_max_freq(max_freq)
}

fn quiet_axes() -> AxesStyle {
    AxesStyle {
        axes_color: FAINT_GRAY,
        tick_color: FAINT_GRAY,
        tick_size_pt: 8.0,
        time_tick_secs: 15.0,
    }
}

fn print_axes() -> AxesStyle {
    AxesStyle {
        axes_color: DARK_GRAY,
        tick_color: DARK_GRAY,
        tick_size_pt: 10.0,
        time_tick_secs: 10.0,
    }
}

pub fn minimal() -> ThemeSpec {
    ThemeSpec {
        name: "minimal".into(),
        coordinates: CoordinateSystem::Linear,
        colormap: Colormap::Magma,
        background: Background::Transparent,
        annotation: AxisPolicy::TitleOnly,
        figure: FigureSize { width_in: 11.0, height_in: 5.0, dpi: 300 },
        title: TitleStyle {
            text: "Spectrogram".into(),
            size_pt: 10.0,
            bold: false,
            color: NEAR_BLACK,
            position: TitlePosition::BottomCenter,
        },
        axes: quiet_axes(),
        transform: dense_transform(8000.0),
        gamma: 4.0,
        normalize_db: true,
        output: OutputFormat::Png,
    }
}

pub fn scientific() -> ThemeSpec {
    ThemeSpec {
        name: "scientific".into(),
        coordinates: CoordinateSystem::Linear,
        colormap: Colormap::Viridis,
        background: Background::Opaque(Rgb::WHITE),
        annotation: AxisPolicy::Full,
        figure: FigureSize { width_in: 12.0, height_in: 6.0, dpi: 600 },
        title: TitleStyle {
            text: "Spectrogram".into(),
            size_pt: 18.0,
            bold: true,
            color: Rgb::BLACK,
            position: TitlePosition::TopCenter,
        },
        axes: print_axes(),
        transform: coarse_transform(20_000.0),
        gamma: 3.0,
        normalize_db: false,
        output: OutputFormat::Png,
    }
}

pub fn presentation() -> ThemeSpec {
    ThemeSpec {
        name: "presentation".into(),
        coordinates: CoordinateSystem::Linear,
        colormap: Colormap::Plasma,
        background: Background::Opaque(Rgb::BLACK),
        annotation: AxisPolicy::TimeAxis,
        figure: FigureSize { width_in: 14.0, height_in: 7.0, dpi: 150 },
        title: TitleStyle {
            text: "Audio Spectrogram".into(),
            size_pt: 28.0,
            bold: true,
            color: Rgb::WHITE,
            position: TitlePosition::TopCenter,
        },
        axes: AxesStyle {
            axes_color: Rgb::WHITE,
            tick_color: Rgb::WHITE,
            tick_size_pt: 14.0,
            time_tick_secs: 20.0,
        },
        transform: coarse_transform(18_000.0),
        gamma: 5.0,
        normalize_db: false,
        output: OutputFormat::Png,
    }
}

pub fn polar_minimal() -> ThemeSpec {
    ThemeSpec {
        name: "polar-minimal".into(),
        coordinates: CoordinateSystem::Polar { inner_radius: 0.05 },
        colormap: Colormap::Magma,
        background: Background::Transparent,
        annotation: AxisPolicy::TitleOnly,
        figure: FigureSize { width_in: 10.0, height_in: 10.0, dpi: 300 },
        title: TitleStyle {
            text: "Spectrogram (Polar)".into(),
            size_pt: 20.0,
            bold: true,
            color: NEAR_BLACK,
            position: TitlePosition::TopCenter,
        },
        axes: quiet_axes(),
        transform: dense_transform(8000.0),
        gamma: 4.0,
        normalize_db: true,
        output: OutputFormat::Png,
    }
}

pub fn polar_scientific() -> ThemeSpec {
    ThemeSpec {
        name: "polar-scientific".into(),
        coordinates: CoordinateSystem::Polar { inner_radius: 0.05 },
        colormap: Colormap::Viridis,
        background: Background::Opaque(Rgb::WHITE),
        annotation: AxisPolicy::Full,
        figure: FigureSize { width_in: 10.0, height_in: 10.0, dpi: 600 },
        title: TitleStyle {
            text: "Frequency-Time Analysis (Polar)".into(),
            size_pt: 18.0,
            bold: true,
            color: Rgb::BLACK,
            position: TitlePosition::TopCenter,
        },
        axes: print_axes(),
        transform: coarse_transform(20_000.0),
        gamma: 3.0,
        normalize_db: false,
        output: OutputFormat::Png,
    }
}

pub fn polar_grayscale() -> ThemeSpec {
    ThemeSpec {
        name: "polar-grayscale".into(),
        coordinates: CoordinateSystem::Polar { inner_radius: 0.3 },
        colormap: Colormap::GrayReversed,
        background: Background::Opaque(Rgb::WHITE),
        annotation: AxisPolicy::None,
        figure: FigureSize { width_in: 12.0, height_in: 12.0, dpi: 300 },
        title: TitleStyle {
            text: String::new(),
            size_pt: 16.0,
            bold: false,
            color: Rgb::BLACK,
            position: TitlePosition::TopCenter,
        },
        axes: AxesStyle::default(),
        transform: dense_transform(10_000.0),
        gamma: 1.0,
        normalize_db: true,
        output: OutputFormat::Png,
    }
}

/// Every built-in theme, in registration order.
pub fn all() -> Vec<ThemeSpec> {
    vec![
        minimal(),
        scientific(),
        presentation(),
        polar_minimal(),
        polar_scientific(),
        polar_grayscale(),
    ]
}
