use clap::{Parser, Subcommand};
use media_resizer::config::ResizerConfig;
use media_resizer::imaging::{Dimensions, ImageBackend};
use media_resizer::media::ReadDirectory;
use media_resizer::{MediaResizer, config, output, warm};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "media-resizer")]
#[command(about = "Resize media images into a per-size cache directory")]
#[command(long_about = "\
Resize media images into a per-size cache directory

Image paths are relative to the media root. Each variant is written to
<subdirectory>/<width>x<height>/<original filename> under the media root,
and the command prints that path with a leading separator:

  media/
  ├── catalog/product/shoe.jpg     # media-resizer resize catalog/product/shoe.jpg
  └── resized/
      └── 150x150/
          └── shoe.jpg             # → /resized/150x150/shoe.jpg

Aspect ratio is always kept: width and height are a bounding box.

Run 'media-resizer gen-config' to generate a documented resizer.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Media root directory (overrides the config file)
    #[arg(long, global = true)]
    media_root: Option<PathBuf>,

    /// Cache subdirectory under the media root (overrides the config file)
    #[arg(long, global = true)]
    subdirectory: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize one image and print the cached path
    Resize {
        /// Image path relative to the media root
        path: String,
        /// Bounding-box width (default from config)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        width: Option<u32>,
        /// Bounding-box height (default from config)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        height: Option<u32>,
    },
    /// Pre-generate variants for every image under the media root
    Warm {
        /// Size to generate, as WIDTHxHEIGHT (repeatable; default from config)
        #[arg(long = "size")]
        sizes: Vec<Dimensions>,
    },
    /// Print a stock resizer.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Resize {
            path,
            width,
            height,
        } => {
            let (site_config, resizer) =
                load_resizer(&cli.config, cli.media_root, cli.subdirectory)?;
            let defaults = resizer.defaults();
            let requested = Dimensions::new(
                width.unwrap_or(defaults.width),
                height.unwrap_or(defaults.height),
            );
            let resized = resizer.resize(&path, requested.width, requested.height)?;
            let actual = match &resized {
                Some(p) => {
                    let abs = resizer.reader().absolute_path(p)?;
                    resizer.backend().identify(&abs).ok()
                }
                None => None,
            };
            output::print_resize_result(
                &path,
                requested,
                resized.as_deref(),
                actual,
                site_config.base_url.as_deref(),
            );
            if resized.is_none() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Warm { sizes } => {
            let (site_config, resizer) =
                load_resizer(&cli.config, cli.media_root, cli.subdirectory)?;
            let sizes = if sizes.is_empty() {
                vec![resizer.defaults()]
            } else {
                sizes
            };
            init_thread_pool(&site_config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_warm_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let report = warm::warm(&resizer, &sizes, Some(tx))?;
            printer.join().ok();
            println!("{}", output::format_warm_summary(&report));
            if report.failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load the config file, apply CLI overrides, and open the media root.
fn load_resizer(
    config_path: &Path,
    media_root: Option<PathBuf>,
    subdirectory: Option<String>,
) -> Result<(ResizerConfig, MediaResizer), Box<dyn std::error::Error>> {
    let mut site_config = config::load_config(config_path)?;
    if let Some(root) = media_root {
        site_config.media_root = root;
    }
    if let Some(subdirectory) = subdirectory {
        site_config.subdirectory = subdirectory;
    }
    site_config.validate()?;
    let resizer = MediaResizer::from_config(&site_config)?;
    Ok((site_config, resizer))
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "media_resizer=debug"
    } else {
        "media_resizer=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
