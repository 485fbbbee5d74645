pub mod annotate;
pub mod colors;
pub mod layout;
pub mod output;
pub mod raster;
pub mod spectrogram_renderer;
pub mod time_markers;

pub use layout::PlotMapping;
pub use output::{OutputFormat, SpectrogramImage};
pub use spectrogram_renderer::{plot_mapping, render};
