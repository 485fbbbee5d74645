//! Audio bytes in, themed spectrogram image out.

use std::time::Instant;

use crate::audio::{self, AudioSource};
use crate::canvas::{self, SpectrogramImage};
use crate::dsp::compute_spectrogram;
use crate::error::{Error, Result};
use crate::theme::{ParameterGrid, ThemeRegistry, ThemeSpec};
use crate::types::{RenderOptions, SampleBuffer};

/// Runs loader, transform and renderer against a theme registry.
#[derive(Clone, Copy)]
pub struct Pipeline<'r> {
    registry: &'r ThemeRegistry,
}

impl Default for Pipeline<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline<'static> {
    /// A pipeline over the process-wide registry.
    pub fn new() -> Self {
        Self { registry: ThemeRegistry::global() }
    }
}

impl<'r> Pipeline<'r> {
    pub fn with_registry(registry: &'r ThemeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r ThemeRegistry {
        self.registry
    }

    /// Render one theme.
    ///
    /// The theme is looked up before any decoding, so an unknown name fails
    /// fast. The first error from any stage is returned as is.
    pub fn generate<'a>(
        &self,
        source: impl Into<AudioSource<'a>>,
        theme_name: &str,
        options: &RenderOptions,
    ) -> Result<SpectrogramImage> {
        let theme = self.registry.get(theme_name)?;
        let buffer = decode(source.into(), options)?;
        render_buffer(&buffer, &theme, options)
    }

    /// Decode once and render every registered theme on its own thread.
    ///
    /// Decoding errors fail the whole batch; per-theme errors are reported
    /// next to the theme name, in registry order.
    pub fn generate_all<'a>(
        &self,
        source: impl Into<AudioSource<'a>>,
        options: &RenderOptions,
    ) -> Result<Vec<(String, Result<SpectrogramImage>)>> {
        let buffer = decode(source.into(), options)?;
        let themes = self.registry.all();
        let jobs: Vec<_> = themes.iter().map(|t| (t.name.clone(), &**t)).collect();
        Ok(render_batch(&buffer, jobs, options))
    }

    /// Decode once and render every variant of `grid`.
    ///
    /// Results are keyed by the variant's file name, in grid order. An
    /// invalid combination fails the call before any decoding.
    pub fn generate_grid<'a>(
        &self,
        source: impl Into<AudioSource<'a>>,
        grid: &ParameterGrid,
        options: &RenderOptions,
    ) -> Result<Vec<(String, Result<SpectrogramImage>)>> {
        let variants = grid.variants()?;
        let buffer = decode(source.into(), options)?;
        let jobs: Vec<_> = variants.iter().map(|v| (v.file_name.clone(), &v.theme)).collect();
        Ok(render_batch(&buffer, jobs, options))
    }
}

fn render_batch(
    buffer: &SampleBuffer,
    jobs: Vec<(String, &ThemeSpec)>,
    options: &RenderOptions,
) -> Vec<(String, Result<SpectrogramImage>)> {
    let started = Instant::now();

    let results = std::thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|(name, theme)| (name, scope.spawn(move || render_buffer(buffer, theme, options))))
            .collect();

        handles
            .into_iter()
            .map(|(name, handle)| {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(Error::Render(format!("worker for {name} panicked"))));
                (name, result)
            })
            .collect::<Vec<_>>()
    });

    log::debug!("rendered {} themes in {:?}", results.len(), started.elapsed());
    results
}

/// Render one theme with the process-wide registry.
pub fn generate<'a>(
    source: impl Into<AudioSource<'a>>,
    theme_name: &str,
    options: &RenderOptions,
) -> Result<SpectrogramImage> {
    Pipeline::new().generate(source, theme_name, options)
}

/// `"<theme>.<ext>"`, the name preview writers use.
pub fn file_name(theme: &str, image: &SpectrogramImage) -> String {
    format!("{theme}.{}", image.extension())
}

fn decode(mut source: AudioSource<'_>, options: &RenderOptions) -> Result<SampleBuffer> {
    if source.hint.is_none() {
        source.hint = options.format_hint;
    }

    let started = Instant::now();
    let mut buffer = audio::load(source, None)?;
    if let Some(range) = options.trim {
        buffer = buffer.trim(range)?;
    }

    let stats = buffer.stats();
    log::debug!(
        "loaded {:.2}s @ {} Hz in {:?} (mean {:.4}, median {:.4}, min {:.4}, max {:.4})",
        stats.duration_secs,
        stats.sample_rate,
        started.elapsed(),
        stats.mean,
        stats.median,
        stats.min,
        stats.max,
    );
    Ok(buffer)
}

/// Transform and render an already decoded buffer.
pub fn render_buffer(buffer: &SampleBuffer, theme: &ThemeSpec, options: &RenderOptions) -> Result<SpectrogramImage> {
    let params = options.transform.as_ref().unwrap_or(&theme.transform);

    let started = Instant::now();
    let matrix = compute_spectrogram(buffer, params)?;
    log::debug!(
        "{}: stft {}x{} in {:?}",
        theme.name,
        matrix.n_frames(),
        matrix.n_bins(),
        started.elapsed()
    );

    let started = Instant::now();
    let image = canvas::render(&matrix, theme, options)?;
    log::debug!("{}: render in {:?}", theme.name, started.elapsed());
    Ok(image)
}
