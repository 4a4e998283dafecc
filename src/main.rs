use clap::{Parser, Subcommand};
use image_steps::imaging::format::extension_of;
use image_steps::imaging::{EncodedImage, ImagingError, RustBackend, TargetSize};
use image_steps::pipeline::{
    ItemStatus, Step, apply_step, process_directory, recompress_jpeg_to,
};
use image_steps::{config, output};
use std::path::PathBuf;

/// Bounding box or exact size, in pixels.
#[derive(clap::Args, Clone)]
struct SizeArgs {
    /// Width in pixels
    #[arg(long, allow_negative_numbers = true)]
    width: i64,
    /// Height in pixels
    #[arg(long, allow_negative_numbers = true)]
    height: i64,
}

/// Input and output file for single-image commands.
#[derive(clap::Args, Clone)]
struct FileArgs {
    /// Source image (format detected from content)
    input: PathBuf,
    /// Destination; its extension selects the output format
    output: PathBuf,
}

#[derive(Parser)]
#[command(name = "image-steps")]
#[command(version)]
#[command(about = "Resize, scale and recompress images for static sites")]
#[command(long_about = "\
Resize, scale and recompress images for static sites

Single-image commands read any supported raster (JPEG, PNG, BMP, TIFF, WebP)
and write the format named by the output extension:

  .jpg .jpeg  JPEG (quality 100 for resize/fit)
  .png        PNG
  .bmp        BMP
  .tif .tiff  TIFF

Extensions are case-sensitive: .JPG is rejected.

The run command applies the rules in <source>/image-steps.toml to every file
under <source>, writing results to the same relative paths under <output>.
Run 'image-steps gen-config' for a documented example.")]
struct Cli {
    /// Log each decode, resample and encode step
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize to exact dimensions (aspect ratio not preserved)
    Resize {
        #[command(flatten)]
        size: SizeArgs,
        #[command(flatten)]
        files: FileArgs,
    },
    /// Scale to the largest size that fits in a box, preserving aspect ratio
    Fit {
        #[command(flatten)]
        size: SizeArgs,
        /// Leave images that already fit at their original size
        #[arg(long)]
        no_upscale: bool,
        #[command(flatten)]
        files: FileArgs,
    },
    /// Re-encode a JPEG at a lower quality (output must be .jpg or .jpeg)
    Compress {
        /// JPEG quality, 0 (smallest) to 100 (best)
        #[arg(long, allow_negative_numbers = true)]
        quality: i64,
        #[command(flatten)]
        files: FileArgs,
    },
    /// Apply image-steps.toml rules to a whole directory
    Run {
        /// Source directory
        #[arg(long, default_value = "content")]
        source: PathBuf,
        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
        /// Write a JSON report of every item to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print a stock image-steps.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let backend = RustBackend::new();

    match cli.command {
        Command::Resize { size, files } => {
            let step = Step::Resize(TargetSize::new(size.width, size.height)?);
            transform_file(&files, |bytes, ext| apply_step(&backend, step, bytes, ext))?;
        }
        Command::Fit {
            size,
            no_upscale,
            files,
        } => {
            let bounds = TargetSize::new(size.width, size.height)?;
            let step = if no_upscale {
                Step::EnsureFit(bounds)
            } else {
                Step::ScaleToFit(bounds)
            };
            transform_file(&files, |bytes, ext| apply_step(&backend, step, bytes, ext))?;
        }
        Command::Compress { quality, files } => {
            transform_file(&files, |bytes, ext| {
                recompress_jpeg_to(&backend, bytes, quality, ext)
            })?;
        }
        Command::Run {
            source,
            output: output_dir,
            report,
        } => {
            let site_config = config::load_config(&source)?;
            println!("==> Processing {} → {}", source.display(), output_dir.display());

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for item in rx {
                    output::print_item(&item);
                }
            });
            let result = process_directory(&backend, &site_config, &source, &output_dir, Some(tx));
            printer.join().ok();
            let run_report = result?;

            output::print_run_summary(&run_report);
            if let Some(path) = report {
                run_report.write_json(&path)?;
            }

            let failed = run_report.count(ItemStatus::Failed);
            if failed > 0 {
                return Err(format!("{failed} item(s) failed").into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Read `files.input`, transform it, write `files.output`.
///
/// `apply` receives the input bytes and the output extension (with dot).
fn transform_file(
    files: &FileArgs,
    apply: impl FnOnce(&[u8], &str) -> Result<EncodedImage, ImagingError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(&files.input)?;
    let image = apply(&bytes, &extension_of(&files.output))?;
    if let Some(parent) = files.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&files.output, &image.bytes)?;
    output::print_single(
        &files.input.display().to_string(),
        &files.output.display().to_string(),
        bytes.len(),
        &image,
    );
    Ok(())
}
