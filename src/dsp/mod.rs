pub mod fft;
pub mod freq_scale;

use serde::{Deserialize, Serialize};

pub use fft::{compute_spectrogram, frame_count};

/// Tapering applied to every frame before the FFT.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowFunction {
    #[default]
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl WindowFunction {
    pub fn coefficients(self, size: usize) -> Vec<f32> {
        if size <= 1 {
            return vec![1.0; size];
        }
        let n_minus_1 = (size - 1) as f32;
        let two_pi = 2.0 * std::f32::consts::PI;
        (0..size)
            .map(|i| {
                let x = two_pi * i as f32 / n_minus_1;
                match self {
                    WindowFunction::Hann => 0.5 * (1.0 - x.cos()),
                    WindowFunction::Hamming => 0.54 - 0.46 * x.cos(),
                    WindowFunction::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
                    WindowFunction::Rectangular => 1.0,
                }
            })
            .collect()
    }
}

/// Layout of the frequency axis of a computed spectrogram.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrequencyScale {
    /// FFT bins as computed.
    #[default]
    Linear,
    /// Rows spaced evenly in log frequency.
    Log,
    /// Rows spaced evenly on the mel scale.
    Mel,
}

/// STFT parameters. Every theme carries a set tuned to its visual density.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformParams {
    pub window_size: usize,
    pub hop_size: usize,
    pub window: WindowFunction,
    pub frequency_scale: FrequencyScale,
    /// Highest frequency kept, in Hz. `None` keeps everything up to Nyquist.
    pub max_freq: Option<f32>,
    pub floor_db: f32,
    /// Magnitude that maps to 0 dB after window-gain compensation.
    pub reference: f32,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            window_size: 2048,
            hop_size: 512,
            window: WindowFunction::Hann,
            frequency_scale: FrequencyScale::Linear,
            max_freq: None,
            floor_db: -80.0,
            reference: 1.0,
        }
    }
}

impl TransformParams {
    pub fn new(window_size: usize, hop_size: usize) -> Self {
        Self {
            window_size,
            hop_size,
            ..Self::default()
        }
    }

    pub fn with_max_freq(mut self, max_freq: f32) -> Self {
        self.max_freq = Some(max_freq);
        self
    }

    pub fn with_scale(mut self, scale: FrequencyScale) -> Self {
        self.frequency_scale = scale;
        self
    }
}
