//! Mapping from FFT bins to the rows of the output matrix.
//!
//! Linear output keeps the FFT bins below the cutoff. Log and mel output
//! resample each magnitude spectrum at band centres spaced evenly on their
//! axis, interpolating linearly between neighbouring bins.

use super::FrequencyScale;

/// Lowest band centre for log-spaced rows.
const LOG_MIN_FREQ: f32 = 20.0;

pub fn hz_to_mel(freq: f32) -> f32 {
    2595.0 * (1.0 + freq / 700.0).log10()
}

pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Precomputed row layout for one (fft size, sample rate, scale, cutoff).
#[derive(Clone, Debug)]
pub struct BandMap {
    /// For every output row: lower FFT bin and interpolation weight of the next.
    taps: Vec<(usize, f32)>,
    frequencies: Vec<f32>,
}

impl BandMap {
    pub fn new(fft_size: usize, sample_rate: u32, scale: FrequencyScale, max_freq: Option<f32>) -> Self {
        let n_fft_bins = fft_size / 2 + 1;
        let resolution = sample_rate as f32 / fft_size as f32;
        let nyquist = sample_rate as f32 / 2.0;
        let cutoff = max_freq.unwrap_or(nyquist).clamp(0.0, nyquist);

        let n_linear = ((cutoff / resolution).floor() as usize + 1).clamp(1, n_fft_bins);

        let frequencies: Vec<f32> = match scale {
            FrequencyScale::Linear => {
                return Self {
                    taps: (0..n_linear).map(|k| (k, 0.0)).collect(),
                    frequencies: (0..n_linear).map(|k| k as f32 * resolution).collect(),
                };
            }
            FrequencyScale::Log => {
                let lo = LOG_MIN_FREQ.max(resolution).min(cutoff);
                spaced(n_linear, lo, cutoff, |f| f.ln(), |v| v.exp())
            }
            FrequencyScale::Mel => spaced(n_linear, 0.0, cutoff, hz_to_mel, mel_to_hz),
        };

        let taps = frequencies
            .iter()
            .map(|&f| {
                let pos = (f / resolution).max(0.0);
                let k0 = (pos.floor() as usize).min(n_fft_bins - 1);
                let frac = if k0 + 1 < n_fft_bins { pos - k0 as f32 } else { 0.0 };
                (k0, frac)
            })
            .collect();

        Self { taps, frequencies }
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Magnitude of output row `row`, read from a full FFT magnitude spectrum.
    #[inline]
    pub fn sample(&self, magnitudes: &[f32], row: usize) -> f32 {
        let (k0, frac) = self.taps[row];
        if frac == 0.0 {
            magnitudes[k0]
        } else {
            magnitudes[k0] * (1.0 - frac) + magnitudes[k0 + 1] * frac
        }
    }
}

/// `n` points evenly spaced between `lo` and `hi` on the axis defined by `to`/`from`.
fn spaced(n: usize, lo: f32, hi: f32, to: impl Fn(f32) -> f32, from: impl Fn(f32) -> f32) -> Vec<f32> {
    if n == 1 {
        return vec![lo];
    }
    let (a, b) = (to(lo), to(hi));
    (0..n)
        .map(|i| from(a + (b - a) * i as f32 / (n - 1) as f32).clamp(lo, hi))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mel_round_trip_at_1khz() {
        assert_relative_eq!(hz_to_mel(1000.0), 1000.0, epsilon = 0.5);
        assert_relative_eq!(mel_to_hz(hz_to_mel(4321.0)), 4321.0, epsilon = 0.1);
    }

    #[test]
    fn linear_cutoff_keeps_bins_below_max_freq() {
        // 1024-point FFT at 8 kHz: 7.8125 Hz per bin
        let map = BandMap::new(1024, 8000, FrequencyScale::Linear, Some(1000.0));
        assert_eq!(map.len(), 128 + 1);
        assert_relative_eq!(*map.frequencies().last().unwrap(), 1000.0);

        let full = BandMap::new(1024, 8000, FrequencyScale::Linear, None);
        assert_eq!(full.len(), 513);
    }

    #[test]
    fn log_and_mel_rows_are_monotonic_and_bounded() {
        for scale in [FrequencyScale::Log, FrequencyScale::Mel] {
            let map = BandMap::new(2048, 44100, scale, Some(8000.0));
            let f = map.frequencies();
            assert!(f.windows(2).all(|w| w[1] >= w[0]), "{scale:?} not monotonic");
            assert!(*f.last().unwrap() <= 8000.0 + 1e-2);
            assert!(f[0] >= 0.0);
        }
    }

    #[test]
    fn interpolates_between_bins() {
        let map = BandMap {
            taps: vec![(1, 0.25)],
            frequencies: vec![0.0],
        };
        assert_relative_eq!(map.sample(&[0.0, 1.0, 5.0], 0), 2.0);
    }
}
