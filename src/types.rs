use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audio::AudioFormat;
use crate::dsp::{FrequencyScale, TransformParams};
use crate::error::{Error, Result};

/// Decoded mono audio at a known sample rate.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidParameters("sample rate must be > 0".into()));
        }
        if samples.is_empty() {
            return Err(Error::EmptyAudio);
        }
        Ok(Self { samples, sample_rate })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; a buffer holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Copy out the samples between `range.start_secs` and `range.end_secs`.
    ///
    /// The range is clamped to the buffer; an empty result is `EmptyAudio`.
    pub fn trim(&self, range: TrimRange) -> Result<SampleBuffer> {
        let rate = self.sample_rate as f64;
        let start = ((range.start_secs.max(0.0) * rate) as usize).min(self.samples.len());
        let end = range
            .end_secs
            .map(|e| (e.max(0.0) * rate) as usize)
            .unwrap_or(self.samples.len())
            .min(self.samples.len());
        if end <= start {
            return Err(Error::EmptyAudio);
        }
        SampleBuffer::new(self.samples[start..end].to_vec(), self.sample_rate)
    }

    /// Summary statistics, logged by the pipeline for diagnostics.
    pub fn stats(&self) -> AudioStats {
        let n = self.samples.len();
        let sum: f64 = self.samples.iter().map(|&s| s as f64).sum();
        let min = self.samples.iter().copied().fold(f32::INFINITY, f32::min);
        let max = self.samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let mut sorted = self.samples.clone();
        sorted.sort_by(f32::total_cmp);
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        AudioStats {
            mean: (sum / n as f64) as f32,
            median,
            min,
            max,
            duration_secs: self.duration_secs(),
            samples: n,
            sample_rate: self.sample_rate,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AudioStats {
    pub mean: f32,
    pub median: f32,
    pub min: f32,
    pub max: f32,
    pub duration_secs: f64,
    pub samples: usize,
    pub sample_rate: u32,
}

/// Time range to keep from a decoded buffer. `end_secs: None` keeps the tail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start_secs: f64,
    pub end_secs: Option<f64>,
}

/// Decibel magnitudes indexed by (frame, bin), with the axis metadata needed
/// to turn indices back into seconds and Hz.
///
/// Storage is one flat row-major buffer, so every frame has exactly `n_bins`
/// values.
#[derive(Clone, Debug)]
pub struct SpectrogramMatrix {
    values: Vec<f32>,
    n_frames: usize,
    n_bins: usize,
    pub sample_rate: u32,
    pub window_size: usize,
    pub hop_size: usize,
    pub floor_db: f32,
    pub frequency_scale: FrequencyScale,
    pub bin_frequencies: Vec<f32>,
}

impl SpectrogramMatrix {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_frames(
        values: Vec<f32>,
        n_frames: usize,
        bin_frequencies: Vec<f32>,
        sample_rate: u32,
        window_size: usize,
        hop_size: usize,
        floor_db: f32,
        frequency_scale: FrequencyScale,
    ) -> Self {
        debug_assert_eq!(values.len(), n_frames * bin_frequencies.len());
        Self {
            values,
            n_frames,
            n_bins: bin_frequencies.len(),
            sample_rate,
            window_size,
            hop_size,
            floor_db,
            frequency_scale,
            bin_frequencies,
        }
    }

    /// Build a matrix from explicit rows, clamping every value to `floor_db`.
    ///
    /// Rows of unequal length, NaN and +inf are rejected.
    pub fn from_rows(
        rows: &[Vec<f32>],
        bin_frequencies: Vec<f32>,
        sample_rate: u32,
        window_size: usize,
        hop_size: usize,
        floor_db: f32,
    ) -> Result<Self> {
        let n_bins = bin_frequencies.len();
        if rows.iter().any(|r| r.len() != n_bins) {
            return Err(Error::InvalidParameters(format!(
                "every frame must have {n_bins} bins"
            )));
        }
        if rows.iter().flatten().any(|v| v.is_nan() || *v == f32::INFINITY) {
            return Err(Error::InvalidParameters("matrix contains NaN or +inf".into()));
        }
        // -inf (silence) clamps to the floor like everything else below it
        let values = rows.iter().flatten().map(|&v| v.max(floor_db)).collect();
        Ok(Self::from_frames(
            values,
            rows.len(),
            bin_frequencies,
            sample_rate,
            window_size,
            hop_size,
            floor_db,
            FrequencyScale::Linear,
        ))
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn is_empty(&self) -> bool {
        self.n_frames == 0 || self.n_bins == 0
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn get(&self, frame: usize, bin: usize) -> f32 {
        self.values[frame * self.n_bins + bin]
    }

    pub fn frame(&self, frame: usize) -> &[f32] {
        &self.values[frame * self.n_bins..(frame + 1) * self.n_bins]
    }

    /// Start time of a frame in seconds.
    pub fn frame_time(&self, frame: usize) -> f64 {
        (frame * self.hop_size) as f64 / self.sample_rate as f64
    }

    pub fn bin_frequency(&self, bin: usize) -> f32 {
        self.bin_frequencies[bin]
    }

    /// Time covered by the frame starts plus one hop.
    pub fn duration_secs(&self) -> f64 {
        (self.n_frames * self.hop_size) as f64 / self.sample_rate as f64
    }

    pub fn max_db(&self) -> f32 {
        self.values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn min_db(&self) -> f32 {
        self.values.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// (frame, bin) of the loudest cell; the first one wins on ties.
    pub fn argmax(&self) -> (usize, usize) {
        let mut best = 0;
        for (i, &v) in self.values.iter().enumerate() {
            if v > self.values[best] {
                best = i;
            }
        }
        (best / self.n_bins.max(1), best % self.n_bins.max(1))
    }

    /// Loudest bin in a single frame.
    pub fn peak_bin(&self, frame: usize) -> usize {
        let row = self.frame(frame);
        let mut best = 0;
        for (i, &v) in row.iter().enumerate() {
            if v > row[best] {
                best = i;
            }
        }
        best
    }
}

/// Where the title is anchored on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitlePosition {
    TopLeft,
    #[default]
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl TitlePosition {
    pub fn is_top(self) -> bool {
        matches!(self, TitlePosition::TopLeft | TitlePosition::TopCenter | TitlePosition::TopRight)
    }
}

impl FromStr for TitlePosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "top-left" => Ok(TitlePosition::TopLeft),
            "top" | "top-center" => Ok(TitlePosition::TopCenter),
            "top-right" => Ok(TitlePosition::TopRight),
            "bottom-left" => Ok(TitlePosition::BottomLeft),
            "bottom" | "bottom-center" => Ok(TitlePosition::BottomCenter),
            "bottom-right" => Ok(TitlePosition::BottomRight),
            other => Err(Error::InvalidParameters(format!("unknown title position {other:?}"))),
        }
    }
}

/// Per-request adjustments layered over a theme.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// `None` keeps the theme's title, `Some("")` suppresses it.
    pub title: Option<String>,
    pub title_position: Option<TitlePosition>,
    /// Overrides the theme's figure resolution.
    pub dpi: Option<u32>,
    /// Overrides the theme's STFT parameters.
    pub transform: Option<TransformParams>,
    pub trim: Option<TrimRange>,
    pub format_hint: Option<AudioFormat>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_title_position(mut self, position: TitlePosition) -> Self {
        self.title_position = Some(position);
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    pub fn with_transform(mut self, params: TransformParams) -> Self {
        self.transform = Some(params);
        self
    }

    pub fn with_trim(mut self, range: TrimRange) -> Self {
        self.trim = Some(range);
        self
    }

    pub fn with_format_hint(mut self, format: AudioFormat) -> Self {
        self.format_hint = Some(format);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_zero_rate() {
        assert!(matches!(SampleBuffer::new(vec![], 44100), Err(Error::EmptyAudio)));
        assert!(matches!(
            SampleBuffer::new(vec![0.0], 0),
            Err(Error::InvalidParameters(_))
        ));
    }

    #[test]
    fn trim_clamps_to_buffer() {
        let buf = SampleBuffer::new((0..100).map(|i| i as f32).collect(), 10).unwrap();
        let t = buf
            .trim(TrimRange { start_secs: 2.0, end_secs: Some(50.0) })
            .unwrap();
        assert_eq!(t.len(), 80);
        assert_eq!(t.samples()[0], 20.0);

        let err = buf.trim(TrimRange { start_secs: 20.0, end_secs: None });
        assert!(matches!(err, Err(Error::EmptyAudio)));
    }

    #[test]
    fn stats_of_ramp() {
        let buf = SampleBuffer::new(vec![-1.0, 0.0, 0.5, 1.0], 4).unwrap();
        let s = buf.stats();
        assert_eq!(s.min, -1.0);
        assert_eq!(s.max, 1.0);
        assert_eq!(s.median, 0.25);
        assert_eq!(s.samples, 4);
        assert!((s.mean - 0.125).abs() < 1e-6);
        assert!((s.duration_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn matrix_rows_and_argmax() {
        let rows = vec![vec![-80.0, -10.0, -40.0], vec![-20.0, -30.0, f32::NEG_INFINITY]];
        let m = SpectrogramMatrix::from_rows(&rows, vec![0.0, 100.0, 200.0], 1000, 20, 10, -80.0)
            .unwrap();
        assert_eq!(m.n_frames(), 2);
        assert_eq!(m.n_bins(), 3);
        assert_eq!(m.get(1, 2), -80.0);
        assert_eq!(m.argmax(), (0, 1));
        assert_eq!(m.peak_bin(1), 0);
        assert!((m.frame_time(1) - 0.01).abs() < 1e-9);
        assert_eq!((m.window_size, m.hop_size), (20, 10));

        let ragged = vec![vec![0.0, 0.0], vec![0.0]];
        assert!(SpectrogramMatrix::from_rows(&ragged, vec![0.0, 1.0], 1000, 20, 10, -80.0).is_err());
    }

    #[test]
    fn title_positions_parse_with_aliases() {
        assert_eq!("top".parse::<TitlePosition>().unwrap(), TitlePosition::TopCenter);
        assert_eq!("bottom".parse::<TitlePosition>().unwrap(), TitlePosition::BottomCenter);
        assert_eq!("Bottom_Left".parse::<TitlePosition>().unwrap(), TitlePosition::BottomLeft);
        assert!("middle".parse::<TitlePosition>().is_err());
        assert!(TitlePosition::TopRight.is_top());
        assert!(!TitlePosition::BottomRight.is_top());
    }
}
