//! Themed spectrogram images from audio files.
//!
//! Audio bytes are decoded to a mono [`SampleBuffer`], transformed into a dB
//! [`SpectrogramMatrix`] and drawn through a named [`ThemeSpec`] in linear or
//! polar coordinates. [`Pipeline`] runs the whole chain.

pub mod audio;
pub mod canvas;
pub mod dsp;
pub mod error;
pub mod pipeline;
pub mod theme;
pub mod types;

pub use audio::{load, AudioFormat, AudioSource};
pub use canvas::{plot_mapping, render, OutputFormat, PlotMapping, SpectrogramImage};
pub use dsp::{compute_spectrogram, FrequencyScale, TransformParams, WindowFunction};
pub use error::{Error, Result};
pub use pipeline::{file_name, generate, Pipeline};
pub use theme::{Override, ParameterGrid, ThemeRegistry, ThemeSpec};
pub use types::{RenderOptions, SampleBuffer, SpectrogramMatrix, TitlePosition, TrimRange};
