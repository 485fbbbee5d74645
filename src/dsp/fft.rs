use crate::dsp::freq_scale::BandMap;
use crate::dsp::{TransformParams, WindowFunction};
use crate::error::{Error, Result};
use crate::types::{SampleBuffer, SpectrogramMatrix};
use realfft::RealFftPlanner;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

thread_local! {
    static FFT_PLANNER: RefCell<RealFftPlanner<f32>> = RefCell::new(RealFftPlanner::new());
    static WINDOW_CACHE: RefCell<HashMap<(WindowFunction, usize), Arc<[f32]>>> = RefCell::new(HashMap::new());
}

fn window(kind: WindowFunction, size: usize) -> Arc<[f32]> {
    WINDOW_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .entry((kind, size))
            .or_insert_with(|| Arc::from(kind.coefficients(size)))
            .clone()
    })
}

/// Number of frames for `len` samples.
///
/// Trailing samples that do not fill a whole hop get one extra zero-padded
/// frame, so the last sample is always covered:
/// `ceil((len - window_size) / hop_size) + 1`.
pub fn frame_count(len: usize, window_size: usize, hop_size: usize) -> usize {
    if len < window_size || hop_size == 0 {
        return 0;
    }
    (len - window_size).div_ceil(hop_size) + 1
}

fn validate(params: &TransformParams, len: usize) -> Result<()> {
    if params.window_size == 0 || params.hop_size == 0 {
        return Err(Error::InvalidParameters(
            "window and hop size must be non-zero".into(),
        ));
    }
    if params.hop_size >= params.window_size {
        return Err(Error::InvalidParameters(format!(
            "hop size {} must be smaller than window size {}",
            params.hop_size, params.window_size
        )));
    }
    if params.window_size > len {
        return Err(Error::InvalidParameters(format!(
            "window size {} exceeds buffer length {len}",
            params.window_size
        )));
    }
    if !(params.reference > 0.0) || !params.floor_db.is_finite() {
        return Err(Error::InvalidParameters(
            "reference must be > 0 and the dB floor finite".into(),
        ));
    }
    if params.max_freq.is_some_and(|f| !(f > 0.0)) {
        return Err(Error::InvalidParameters("max_freq must be > 0".into()));
    }
    Ok(())
}

/// Compute a dB spectrogram using a Short-Time Fourier Transform (STFT).
///
/// Magnitudes are scaled by `2 / sum(window)` before the dB conversion so a
/// full-scale sinusoid at the reference lands near 0 dB, and clamped below at
/// `params.floor_db`.
pub fn compute_spectrogram(buffer: &SampleBuffer, params: &TransformParams) -> Result<SpectrogramMatrix> {
    let samples = buffer.samples();
    validate(params, samples.len())?;

    let fft_size = params.window_size;
    let hop_size = params.hop_size;
    let fft = FFT_PLANNER.with(|p| p.borrow_mut().plan_fft_forward(fft_size));
    let win = window(params.window, fft_size);

    let window_sum: f32 = win.iter().sum();
    let gain = if window_sum > 0.0 { 2.0 / window_sum } else { 1.0 };
    let floor = params.floor_db;

    let bands = BandMap::new(fft_size, buffer.sample_rate(), params.frequency_scale, params.max_freq);
    let n_frames = frame_count(samples.len(), fft_size, hop_size);
    let n_rows = bands.len();

    // Pre-allocate FFT buffers once and reuse across frames
    let mut input = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();
    let mut magnitudes = vec![0.0f32; spectrum.len()];
    let mut values = Vec::with_capacity(n_frames * n_rows);

    for frame_i in 0..n_frames {
        let pos = frame_i * hop_size;
        let end = (pos + fft_size).min(samples.len());
        let frame = &samples[pos..end];

        for (i, inp) in input.iter_mut().enumerate() {
            // zero-pad the final partial frame
            *inp = frame.get(i).copied().unwrap_or(0.0) * win[i];
        }

        fft.process(&mut input, &mut spectrum)
            .map_err(|e| Error::InvalidParameters(format!("FFT failed: {e}")))?;

        for (m, c) in magnitudes.iter_mut().zip(spectrum.iter()) {
            *m = c.norm() * gain;
        }

        for row in 0..n_rows {
            let db = 20.0 * (bands.sample(&magnitudes, row) / params.reference).log10();
            values.push(if db.is_nan() { floor } else { db.max(floor) });
        }
    }

    log::debug!(
        "stft: {} samples -> {} frames x {} bins (window {}, hop {})",
        samples.len(),
        n_frames,
        n_rows,
        fft_size,
        hop_size
    );

    Ok(SpectrogramMatrix::from_frames(
        values,
        n_frames,
        bands.frequencies().to_vec(),
        buffer.sample_rate(),
        fft_size,
        hop_size,
        floor,
        params.frequency_scale,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::FrequencyScale;

    fn sine(freq: f64, sample_rate: u32, num_samples: usize) -> SampleBuffer {
        let samples = (0..num_samples)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (2.0 * std::f64::consts::PI * freq * t).sin() as f32
            })
            .collect();
        SampleBuffer::new(samples, sample_rate).unwrap()
    }

    #[test]
    fn test_spectrogram_basic() {
        let sample_rate = 44100u32;
        let freq = 1000.0f64;
        let audio = sine(freq, sample_rate, 4096);

        let result = compute_spectrogram(&audio, &TransformParams::new(1024, 512)).unwrap();
        assert!(result.n_frames() > 0);
        assert_eq!(result.sample_rate, sample_rate);

        // The peak bin should be near 1000 Hz
        let peak_bin = result.peak_bin(1);
        let peak_freq = result.bin_frequency(peak_bin) as f64;
        let resolution = sample_rate as f64 / 1024.0;
        assert!(
            (peak_freq - freq).abs() < resolution * 2.0,
            "Peak at {peak_freq} Hz, expected ~{freq} Hz"
        );
        // window-gain compensation puts a unit sine close to 0 dB
        let peak_db = result.get(1, peak_bin);
        assert!(peak_db > -3.0 && peak_db < 1.0, "peak {peak_db} dB");
    }

    #[test]
    fn frame_count_zero_pads_trailing_samples() {
        assert_eq!(frame_count(4096, 1024, 512), 7);
        // 100 trailing samples earn one padded frame
        assert_eq!(frame_count(4196, 1024, 512), 8);
        assert_eq!(frame_count(1024, 1024, 512), 1);
        assert_eq!(frame_count(1000, 1024, 512), 0);

        for (len, w, h) in [(5000usize, 256usize, 64usize), (44100, 2048, 148), (3000, 1000, 999)] {
            let buf = SampleBuffer::new(vec![0.1; len], 8000).unwrap();
            let m = compute_spectrogram(&buf, &TransformParams::new(w, h)).unwrap();
            let full = (len - w) / h + 1;
            let expected = if (len - w) % h == 0 { full } else { full + 1 };
            assert_eq!(m.n_frames(), expected, "len {len} window {w} hop {h}");
        }
    }

    #[test]
    fn silence_clamps_to_floor() {
        let buf = SampleBuffer::new(vec![0.0; 8192], 16000).unwrap();
        let params = TransformParams { floor_db: -90.0, ..TransformParams::new(512, 128) };
        let m = compute_spectrogram(&buf, &params).unwrap();
        assert!(m.values().iter().all(|&v| v.is_finite() && v == -90.0));
    }

    #[test]
    fn values_stay_finite_and_above_floor() {
        let audio = sine(3000.0, 22050, 22050);
        for scale in [FrequencyScale::Linear, FrequencyScale::Log, FrequencyScale::Mel] {
            let params = TransformParams::new(1024, 256).with_scale(scale);
            let m = compute_spectrogram(&audio, &params).unwrap();
            assert!(m.values().iter().all(|v| v.is_finite() && *v >= params.floor_db));
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let buf = SampleBuffer::new(vec![0.0; 1000], 8000).unwrap();
        for params in [
            TransformParams::new(256, 256),
            TransformParams::new(256, 300),
            TransformParams::new(2048, 512),
            TransformParams::new(0, 0),
            TransformParams { reference: 0.0, ..TransformParams::new(256, 64) },
        ] {
            assert!(
                matches!(compute_spectrogram(&buf, &params), Err(Error::InvalidParameters(_))),
                "{params:?} accepted"
            );
        }
    }

    #[test]
    fn max_freq_limits_rows() {
        let audio = sine(440.0, 44100, 44100);
        let m = compute_spectrogram(&audio, &TransformParams::new(2048, 512).with_max_freq(8000.0)).unwrap();
        assert!(*m.bin_frequencies.last().unwrap() <= 8000.0);
        assert_eq!(m.n_bins(), (8000.0f32 / (44100.0 / 2048.0)).floor() as usize + 1);
    }

    #[test]
    fn mel_scale_keeps_the_peak_near_the_tone() {
        let audio = sine(2000.0, 16000, 16000);
        let params = TransformParams::new(1024, 256).with_scale(FrequencyScale::Mel);
        let m = compute_spectrogram(&audio, &params).unwrap();
        let f = m.bin_frequency(m.peak_bin(3));
        assert!((f - 2000.0).abs() < 60.0, "mel peak at {f} Hz");
    }
}
