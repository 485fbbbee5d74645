use std::io::Cursor;

use spectrotheme::canvas::spectrogram_renderer::value_scale;
use spectrotheme::dsp::frame_count;
use spectrotheme::theme::Background;
use spectrotheme::{
    compute_spectrogram, load, plot_mapping, AudioSource, Error, Pipeline, RenderOptions, SpectrogramImage,
    SpectrogramMatrix, ThemeRegistry, ThemeSpec, TransformParams,
};

const RATE: u32 = 44_100;

fn sine_wav(freq: f32, secs: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let n = (secs * RATE as f32) as usize;
        for i in 0..n {
            let s = 0.8 * (std::f32::consts::TAU * freq * i as f32 / RATE as f32).sin();
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn params() -> TransformParams {
    TransformParams::new(2048, 512).with_max_freq(8000.0)
}

fn options() -> RenderOptions {
    RenderOptions::new().with_dpi(40).with_title("").with_transform(params())
}

fn matrix_for(bytes: &[u8]) -> SpectrogramMatrix {
    let buffer = load(AudioSource::new(bytes), None).unwrap();
    compute_spectrogram(&buffer, &params()).unwrap()
}

/// Every plotted pixel shows the color of the cell it maps to. Returns the
/// loudest cell that made it onto the canvas.
fn check_pixels(image: &SpectrogramImage, matrix: &SpectrogramMatrix, theme: &ThemeSpec) -> (usize, usize) {
    let mapping = plot_mapping(matrix, theme, &options()).unwrap();
    let scale = value_scale(matrix, theme);
    let lut = theme.colormap.lut();
    let mut best: Option<(usize, usize)> = None;
    for (x, y, px) in image.pixels.enumerate_pixels() {
        if let Some((f, b)) = mapping.cell_at(x, y, matrix.n_frames(), matrix.n_bins()) {
            assert_eq!(px.0, lut[scale.index(matrix.get(f, b))], "pixel ({x}, {y}) in {}", theme.name);
            if best.map_or(true, |(bf, bb)| matrix.get(f, b) > matrix.get(bf, bb)) {
                best = Some((f, b));
            }
        }
    }
    best.expect("no plotted pixels")
}

#[test]
fn tone_440_end_to_end() {
    let bytes = sine_wav(440.0, 10.0);
    let matrix = matrix_for(&bytes);

    assert_eq!(matrix.n_frames(), frame_count(441_000, 2048, 512));
    assert_eq!(matrix.n_frames(), 859);
    assert!(matrix.values().iter().all(|v| v.is_finite() && *v >= matrix.floor_db));

    let spacing = RATE as f32 / 2048.0;
    for frame in 0..matrix.n_frames() {
        let peak_hz = matrix.bin_frequency(matrix.peak_bin(frame));
        assert!((peak_hz - 440.0).abs() <= spacing, "frame {frame}: peak at {peak_hz} Hz");
    }

    let pipeline = Pipeline::new();
    for name in ["minimal", "polar-minimal"] {
        let theme = ThemeRegistry::global().get(name).unwrap();
        let image = pipeline.generate(&bytes, name, &options()).unwrap();
        let (w, h) = theme.figure.pixels(Some(40));
        assert_eq!((image.width(), image.height()), (w, h));

        let (_, bin) = check_pixels(&image, &matrix, &theme);
        let hz = matrix.bin_frequency(bin);
        assert!((hz - 440.0).abs() <= 2.0 * spacing, "{name}: loudest plotted cell at {hz} Hz");
    }
}

#[test]
fn rendering_twice_gives_identical_pixels() {
    let bytes = sine_wav(1000.0, 1.0);
    let pipeline = Pipeline::new();
    for name in ["scientific", "polar-scientific"] {
        let a = pipeline.generate(&bytes, name, &options()).unwrap();
        let b = pipeline.generate(&bytes, name, &options()).unwrap();
        assert_eq!(a.pixels, b.pixels, "{name}");
        assert_eq!(a.encode().unwrap(), b.encode().unwrap(), "{name}");
    }
}

#[test]
fn alpha_follows_background() {
    let bytes = sine_wav(1000.0, 1.0);
    let registry = ThemeRegistry::with_builtins();
    let results = Pipeline::with_registry(&registry).generate_all(&bytes, &options()).unwrap();
    assert_eq!(results.len(), 6);
    for (name, result) in results {
        let image = result.unwrap();
        let theme = registry.get(&name).unwrap();
        match theme.background {
            Background::Transparent => assert!(image.has_alpha(), "{name}"),
            Background::Opaque(_) => assert!(!image.has_alpha(), "{name}"),
        }
    }
}

#[test]
fn errors_surface_unchanged() {
    let pipeline = Pipeline::new();
    let bytes = sine_wav(440.0, 0.5);
    assert!(matches!(
        pipeline.generate(&bytes, "sepia", &options()),
        Err(Error::UnknownTheme(name)) if name == "sepia"
    ));
    assert!(matches!(
        pipeline.generate(&b"definitely not audio"[..], "minimal", &options()),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn custom_theme_renders_through_registry() {
    let registry = ThemeRegistry::with_builtins();
    let names = registry
        .load_json(
            r##"[{
                "name": "night_ring",
                "coordinates": {"kind": "polar", "inner_radius": 0.2},
                "colormap": "inferno",
                "background": {"opaque": "#000000"},
                "annotation": "none",
                "figure": {"width_in": 5, "height_in": 5, "dpi": 40},
                "transform": {"window_size": 1024, "hop_size": 256, "frequency_scale": "mel", "max_freq": 6000}
            }]"##,
        )
        .unwrap();
    assert_eq!(names, ["night-ring"]);

    let bytes = sine_wav(440.0, 1.0);
    let image = Pipeline::with_registry(&registry)
        .generate(&bytes, "Night_Ring", &RenderOptions::new())
        .unwrap();
    assert_eq!((image.width(), image.height()), (200, 200));
    assert!(!image.has_alpha());
}
