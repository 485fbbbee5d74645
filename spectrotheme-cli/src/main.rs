use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use spectrotheme::{
    file_name, theme::parse_axis, AudioFormat, AudioSource, ParameterGrid, Pipeline, RenderOptions, SpectrogramImage,
    ThemeRegistry, TitlePosition, TrimRange,
};

#[derive(Parser)]
#[command(name = "spectrotheme", version, about = "Render themed spectrogram images from audio files")]
struct Cli {
    /// Extra themes: a JSON array of theme records
    #[arg(long, global = true)]
    themes_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one theme
    Render {
        /// Audio file (wav, mp3, flac, m4a, ogg)
        input: PathBuf,

        #[arg(short, long, default_value = "minimal")]
        theme: String,

        /// Output image. Defaults to "<theme>.<ext>" in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// List registered themes
    Themes,
    /// Render every theme into a directory
    Previews {
        input: PathBuf,

        #[arg(long, default_value = "./previews/")]
        out_dir: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Render every combination of varied theme parameters
    Grid {
        input: PathBuf,

        /// Theme the variations start from
        #[arg(long, default_value = "minimal")]
        base: String,

        /// KEY=V1,V2,... (cmap, projection, hole, figsize, dpi, gamma,
        /// background, title, title-size, window, max-freq); repeatable
        #[arg(long = "vary", value_name = "KEY=VALUES", required = true)]
        axes: Vec<String>,

        #[arg(long, default_value = "./grid/")]
        out_dir: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Title text; pass "" to drop the theme's title
    #[arg(long)]
    title: Option<String>,

    /// top, bottom, top-left, top-center, top-right, bottom-left, ...
    #[arg(long)]
    title_position: Option<String>,

    /// Override the theme's resolution
    #[arg(long)]
    dpi: Option<u32>,

    /// Seconds to skip at the start
    #[arg(long)]
    trim_start: Option<f64>,

    /// Seconds at which to stop
    #[arg(long)]
    trim_end: Option<f64>,
}

impl RenderArgs {
    fn options(&self, input: &Path) -> Result<RenderOptions> {
        let mut opts = RenderOptions::new();
        opts.title = self.title.clone();
        opts.dpi = self.dpi;
        if let Some(pos) = &self.title_position {
            opts.title_position = Some(pos.parse::<TitlePosition>()?);
        }
        if self.trim_start.is_some() || self.trim_end.is_some() {
            opts.trim = Some(TrimRange {
                start_secs: self.trim_start.unwrap_or(0.0),
                end_secs: self.trim_end,
            });
        }
        opts.format_hint = input
            .extension()
            .and_then(|e| e.to_str())
            .and_then(AudioFormat::from_extension);
        Ok(opts)
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let registry = ThemeRegistry::global();
    if let Some(path) = &cli.themes_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let names = registry
            .load_json(&text)
            .with_context(|| format!("Invalid theme file {}", path.display()))?;
        log::info!("loaded {} theme(s) from {}", names.len(), path.display());
    }
    let pipeline = Pipeline::with_registry(registry);

    match cli.command {
        Command::Themes => {
            for theme in registry.all() {
                let coords = if theme.coordinates.is_polar() { "polar" } else { "linear" };
                let (w, h) = theme.figure.pixels(None);
                println!("{:<20} {:<7} {:>5}x{:<5} {:?}", theme.name, coords, w, h, theme.colormap);
            }
        }
        Command::Render { input, theme, output, render } => {
            let bytes = read_input(&input)?;
            let opts = render.options(&input)?;
            let image = pipeline
                .generate(AudioSource::new(&bytes), &theme, &opts)
                .with_context(|| format!("Failed to render {} with theme {theme}", input.display()))?;
            let out = output.unwrap_or_else(|| PathBuf::from(file_name(&theme, &image)));
            image
                .save(&out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            log::info!("wrote {} ({}x{})", out.display(), image.width(), image.height());
        }
        Command::Previews { input, out_dir, render } => {
            let bytes = read_input(&input)?;
            let opts = render.options(&input)?;
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;

            let results = pipeline
                .generate_all(AudioSource::new(&bytes), &opts)
                .with_context(|| format!("Failed to decode {}", input.display()))?;
            write_batch(&out_dir, results, |name, image| file_name(name, image))?;
        }
        Command::Grid { input, base, axes, out_dir, render } => {
            let mut grid = ParameterGrid::new((*registry.get(&base)?).clone());
            for axis in &axes {
                grid = grid.vary(parse_axis(axis).with_context(|| format!("Invalid --vary {axis}"))?);
            }
            log::info!("rendering {} variant(s) of {base}", grid.count());

            let bytes = read_input(&input)?;
            let opts = render.options(&input)?;
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;

            let results = pipeline
                .generate_grid(AudioSource::new(&bytes), &grid, &opts)
                .with_context(|| format!("Failed to render grid for {}", input.display()))?;
            write_batch(&out_dir, results, |name, _| name.to_owned())?;
        }
    }

    Ok(())
}

/// Save every successful render under `out_dir`; fails if any render failed.
fn write_batch(
    out_dir: &Path,
    results: Vec<(String, spectrotheme::Result<SpectrogramImage>)>,
    name_of: impl Fn(&str, &SpectrogramImage) -> String,
) -> Result<()> {
    let mut failed = 0;
    for (name, result) in results {
        match result {
            Ok(image) => {
                let out = out_dir.join(name_of(&name, &image));
                image
                    .save(&out)
                    .with_context(|| format!("Failed to write {}", out.display()))?;
                log::info!("{name}: wrote {}", out.display());
            }
            Err(e) => {
                log::error!("{name}: {e}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} image(s) failed to render");
    }
    Ok(())
}
