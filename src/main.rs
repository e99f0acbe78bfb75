//! Binary entrypoint for the bezel tool.
//!
//! Thin CLI over the library: resolve artwork for a title, list the bezel
//! directory, or composite a captured frame into its bezel.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use image::{Rgba, RgbaImage, imageops};
use rust_bezel::catalog::CandidateNames;
use rust_bezel::processing::layout::{center_offset, zoom_to_fit};
use rust_bezel::{Bezel, Configuration, ContentIdentity, Session, Size};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_CONFIG: &str = "bezel.yaml";

#[derive(Debug, Parser)]
#[command(name = "bezel", about = "Frame emulator output with bezel artwork")]
struct Cli {
    /// Path to YAML config file [default: bezel.yaml if present]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the bezel artwork directory
    #[arg(long, value_name = "DIR")]
    bezel_dir: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Composite one captured frame into its bezel and write a PNG
    Compose {
        #[command(flatten)]
        content: ContentArgs,

        /// Live display frame (any decodable image)
        #[arg(long, value_name = "IMAGE")]
        frame: PathBuf,

        /// Output PNG
        #[arg(short, long, value_name = "PNG")]
        out: PathBuf,

        /// Display zoom
        #[arg(long, conflicts_with = "fit")]
        zoom: Option<f64>,

        /// Pick the largest zoom that fits a WxH display, centred on it
        #[arg(long, value_name = "WxH", value_parser = parse_size)]
        fit: Option<Size>,
    },
    /// Show the candidate names for a title and which artwork resolves
    Resolve {
        #[command(flatten)]
        content: ContentArgs,
    },
    /// List artwork in the bezel directory
    List,
}

#[derive(Debug, Args)]
struct ContentArgs {
    /// Content display name, e.g. "Pitfall! (1982) (Activision)"
    #[arg(long, value_name = "TITLE")]
    name: String,

    /// Per-title bezel name override
    #[arg(long, value_name = "NAME")]
    bezel_name: Option<String>,
}

impl ContentArgs {
    fn identity(&self) -> ContentIdentity {
        let id = ContentIdentity::new(&self.name);
        match &self.bezel_name {
            Some(name) => id.with_override(name),
            None => id,
        }
    }
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {s:?}"))?;
    let w = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    if w == 0 || h == 0 {
        return Err("display size must be positive".to_string());
    }
    Ok(Size::new(w, h))
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(
        format!("rust_bezel={level}")
            .parse()
            .context("invalid log directive")?,
    );
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Configuration> {
    let cfg = match &cli.config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).is_file() => {
            Configuration::from_yaml_file(DEFAULT_CONFIG)
                .with_context(|| format!("loading config from {DEFAULT_CONFIG}"))?
        }
        None => Configuration::default(),
    };
    let mut cfg = cfg.validated().context("validating configuration")?;
    if let Some(dir) = &cli.bezel_dir {
        cfg.bezel_dir = dir.clone();
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let cfg = load_config(&cli)?;

    match &cli.command {
        Command::List => list(&cfg),
        Command::Resolve { content } => resolve(cfg, content),
        Command::Compose {
            content,
            frame,
            out,
            zoom,
            fit,
        } => compose(cfg, content, frame, out, *zoom, *fit),
    }
}

fn list(cfg: &Configuration) -> Result<()> {
    let catalog = rust_bezel::catalog::Catalog::from_config(cfg);
    let names = catalog
        .list()
        .with_context(|| format!("listing {}", catalog.dir().display()))?;
    info!(count = names.len(), dir = %catalog.dir().display(), "bezel artwork");
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn resolve(cfg: Configuration, content: &ContentArgs) -> Result<()> {
    let session = Session::new(content.identity());
    let mut bezel = Bezel::new(&session, cfg.clone());

    let names = CandidateNames::new(&content.identity(), &cfg.default_name);
    for name in &names {
        match bezel.catalog().find(&name) {
            Some(path) => println!("{name}\t{}", path.display()),
            None => println!("{name}\t-"),
        }
    }

    if bezel.load() {
        println!(
            "resolved: {} window {} ratio {:.3}x{:.3}",
            bezel.size(),
            bezel.window(),
            bezel.ratio_w(),
            bezel.ratio_h()
        );
    } else {
        println!("resolved: no bezel");
    }
    Ok(())
}

fn compose(
    cfg: Configuration,
    content: &ContentArgs,
    frame: &Path,
    out: &Path,
    zoom: Option<f64>,
    fit: Option<Size>,
) -> Result<()> {
    let live = image::open(frame)
        .with_context(|| format!("failed to load frame {}", frame.display()))?
        .to_rgba8();
    if let Some(z) = zoom
        && !(z.is_finite() && z > 0.0)
    {
        bail!("zoom must be positive");
    }

    let session = Session::new(content.identity());
    let mut bezel = Bezel::new(&session, cfg);
    let shown = bezel.load();

    let native = if shown {
        bezel.size()
    } else {
        Size::new(live.width(), live.height())
    };
    let zoom = match (zoom, fit) {
        (Some(z), _) => z,
        (None, Some(display)) => zoom_to_fit(native, display),
        (None, None) => 1.0,
    };
    session.set_zoom(zoom);

    let composed = if shown {
        bezel.apply();
        bezel.render(&live);
        match bezel.output() {
            Some(output) => output.lock().image().clone(),
            None => {
                warn!("bezel could not be laid out; writing the bare frame");
                scale_frame(&live, zoom)
            }
        }
    } else {
        scale_frame(&live, zoom)
    };

    let result = match fit {
        Some(display) => {
            let mut canvas = RgbaImage::from_pixel(display.w, display.h, Rgba([0, 0, 0, 255]));
            let (ox, oy) = center_offset(Size::new(composed.width(), composed.height()), display);
            imageops::overlay(&mut canvas, &composed, i64::from(ox), i64::from(oy));
            canvas
        }
        None => composed,
    };

    result
        .save(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!(
        out = %out.display(),
        width = result.width(),
        height = result.height(),
        bezel = shown,
        "composite written"
    );
    Ok(())
}

fn scale_frame(live: &RgbaImage, zoom: f64) -> RgbaImage {
    let size = Size::new(live.width(), live.height()).scaled(zoom);
    imageops::resize(
        live,
        size.w.max(1),
        size.h.max(1),
        imageops::FilterType::Nearest,
    )
}
