use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use plant_growth::{AnalysisConfig, PanelSummary, PlantAnalyzer, render_text};

#[derive(Parser)]
#[command(name = "plant-growth")]
#[command(about = "Measure plant foliage coverage and growth between photographs")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: Options,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Measure foliage coverage of one image
    Analyze {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
    /// Compare coverage of two images taken at different times
    Compare {
        #[arg(value_name = "BEFORE")]
        before: PathBuf,
        #[arg(value_name = "AFTER")]
        after: PathBuf,
    },
}

#[derive(Args)]
struct Options {
    /// JSON config file; flags below override its values
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Panel detector weights (.rten)
    #[arg(long, value_name = "FILE", global = true)]
    model: Option<PathBuf>,

    /// Minimum detection confidence, 0..=1
    #[arg(long, global = true)]
    confidence: Option<f32>,

    /// Measure the whole photograph instead of detected panels
    #[arg(long, global = true)]
    no_crop: bool,

    #[arg(long, allow_hyphen_values = true, global = true)]
    brightness: Option<f32>,

    #[arg(long, global = true)]
    contrast: Option<f32>,

    #[arg(long, global = true)]
    saturation: Option<f32>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR", global = true)]
    debug_out: Option<PathBuf>,

    /// Write the result as JSON
    #[arg(long, value_name = "FILE", global = true)]
    json: Option<PathBuf>,

    /// Write a plain-text growth report (compare only)
    #[arg(long, value_name = "FILE", global = true)]
    report: Option<PathBuf>,
}

impl Options {
    fn build_config(&self) -> anyhow::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(confidence) = self.confidence {
            config.confidence_threshold = confidence;
        }
        if self.no_crop {
            config.crop = false;
        }
        if self.brightness.is_some() || self.contrast.is_some() || self.saturation.is_some() {
            let mut enhancement = config.enhancement.unwrap_or_default();
            enhancement.brightness = self.brightness.unwrap_or(enhancement.brightness);
            enhancement.contrast = self.contrast.unwrap_or(enhancement.contrast);
            enhancement.saturation = self.saturation.unwrap_or(enhancement.saturation);
            config.enhancement = Some(enhancement);
        }
        if let Some(dir) = &self.debug_out {
            config.debug_dir = Some(dir.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        "plant_growth=debug"
    } else {
        "plant_growth=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let config = args.options.build_config()?;
    let analyzer = PlantAnalyzer::from_config(config).context("Failed to set up analyzer")?;

    match &args.command {
        Command::Analyze { image } => {
            let analysis = analyzer
                .analyze_detailed(image)
                .with_context(|| format!("Failed to analyze {}", image.display()))?;

            println!("\n=== Plant Coverage ===");
            println!("Image: {}", image.display());
            println!(
                "Coverage: {:.2}% ({} of {} pixels)",
                analysis.coverage.percentage,
                analysis.coverage.foliage_pixel_count,
                analysis.coverage.total_pixel_count
            );
            match analysis.panels {
                PanelSummary::WholeImage => println!("Panels: none, whole image measured"),
                PanelSummary::SinglePanel { rect } => println!(
                    "Panels: 1 at ({}, {}) {}x{}",
                    rect.x, rect.y, rect.width, rect.height
                ),
                PanelSummary::Stitched { count, height } => {
                    println!("Panels: {count} stitched at height {height}")
                }
            }

            if let Some(path) = &args.options.json {
                let json = serde_json::to_string_pretty(&analysis)?;
                std::fs::write(path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }
        Command::Compare { before, after } => {
            let comparison = analyzer
                .compare_images(before, after)
                .context("Failed to compare images")?;

            println!("\n{}", render_text(&comparison));

            if let Some(path) = &args.options.json {
                comparison
                    .export_json(path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            if let Some(path) = &args.options.report {
                comparison
                    .export_text(path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }
    }

    Ok(())
}
