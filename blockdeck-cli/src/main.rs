use anyhow::{bail, Context, Result};
use blockdeck::catalog::substitution_values;
use blockdeck::compose::replace_tokens_report;
use blockdeck::layout::{FieldPlacement, LayoutOptions, TextLayout};
use blockdeck::preview::{render_slide, PreviewOptions};
use blockdeck::{
    extract_blocks, fields_from_descriptors, placements_for, BlockComposer, ComposeOptions,
    Presentation,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "blockdeck",
    about = "Extract and compose semantic presentation blocks",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty presentation
    New {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Number of blank slides
        #[arg(short, long, default_value = "1")]
        slides: usize,
    },

    /// Describe the blocks of a presentation as JSON
    Extract {
        /// Input presentation
        input: PathBuf,

        /// Emit catalog field records instead of block descriptors
        #[arg(long)]
        fields: bool,

        /// Output JSON file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Copy the first slide of a block onto a slide of a target presentation
    Compose {
        /// Target presentation
        input: PathBuf,

        /// Block presentation
        #[arg(short, long)]
        block: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Target slide number (1-based)
        #[arg(short = 'n', long, default_value = "1")]
        slide: usize,

        /// Append a blank slide and compose onto it
        #[arg(long)]
        append: bool,

        /// Do not copy auto-shape line and style
        #[arg(long)]
        no_shape_style: bool,
    },

    /// Lay out field values on a slide
    Fill {
        /// Input presentation
        input: PathBuf,

        /// JSON file: an array of placements, or an object of values keyed by field
        #[arg(short, long)]
        values: PathBuf,

        /// Block whose fields the value object refers to
        #[arg(short, long)]
        block: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Slide number (1-based)
        #[arg(short = 'n', long, default_value = "1")]
        slide: usize,

        /// JSON layout options
        #[arg(long)]
        layout_config: Option<PathBuf>,
    },

    /// Replace tokens in place, keeping run formatting
    Replace {
        /// Input presentation
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Slide number (1-based)
        #[arg(short = 'n', long, default_value = "1")]
        slide: usize,

        /// Token values as label.name=value
        #[arg(short = 's', long = "set", value_parser = parse_key_value)]
        values: Vec<(String, String)>,
    },

    /// Render a wireframe PNG of a slide
    Preview {
        /// Input presentation
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Slide number (1-based)
        #[arg(short = 'n', long, default_value = "1")]
        slide: usize,

        #[arg(long, default_value = "800")]
        width: u32,

        #[arg(long, default_value = "600")]
        height: u32,
    },

    /// Get information about a presentation
    Info {
        /// Input presentation
        input: PathBuf,

        /// Show per-slide elements
        #[arg(short, long)]
        detailed: bool,
    },

    /// Append a slide using a layout
    AddSlide {
        /// Input presentation
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Layout index (defaults to the blank layout)
        #[arg(short, long)]
        layout: Option<usize>,
    },

    /// Delete a slide
    DeleteSlide {
        /// Input presentation
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Slide number (1-based)
        #[arg(short = 'n', long)]
        slide: usize,
    },

    /// Duplicate a slide at the end of the presentation
    CloneSlide {
        /// Input presentation
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Slide number (1-based)
        #[arg(short = 'n', long)]
        slide: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blockdeck=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::New { output, slides } => {
            let mut deck = Presentation::new()?;
            for _ in 0..slides {
                deck.add_blank_slide()?;
            }
            save(&deck, &output)?;
            println!("✓ Created {} with {} slides", output.display(), slides);
        }

        Commands::Extract {
            input,
            fields,
            output,
        } => {
            let deck = open(&input)?;
            let descriptors = extract_blocks(&deck);
            let json = if fields {
                serde_json::to_string_pretty(&fields_from_descriptors(&descriptors))?
            } else {
                serde_json::to_string_pretty(&descriptors)?
            };

            if let Some(output_path) = output {
                std::fs::write(&output_path, &json).with_context(|| {
                    format!("Failed to write output file {}", output_path.display())
                })?;
                println!("✓ Blocks extracted to: {}", output_path.display());
            } else {
                println!("{}", json);
            }
        }

        Commands::Compose {
            input,
            block,
            output,
            slide,
            append,
            no_shape_style,
        } => {
            let mut deck = open(&input)?;
            let block_bytes = std::fs::read(&block)
                .with_context(|| format!("Failed to read block {}", block.display()))?;
            let target_index = if append {
                deck.add_blank_slide()?
            } else {
                slide_index(slide)?
            };

            let composer = BlockComposer::with_options(ComposeOptions {
                copy_shape_style: !no_shape_style,
            });
            let report = composer
                .compose(&mut deck, &block_bytes, target_index)
                .with_context(|| format!("Failed to compose {}", block.display()))?;
            for skipped in &report.skipped {
                eprintln!(
                    "Skipped element {} '{}': {}",
                    skipped.source_index, skipped.name, skipped.reason
                );
            }

            save(&deck, &output)?;
            println!(
                "✓ Copied {} elements onto slide {} ({} skipped)",
                report.copied_count(),
                target_index + 1,
                report.skipped_count()
            );
        }

        Commands::Fill {
            input,
            values,
            block,
            output,
            slide,
            layout_config,
        } => {
            let mut deck = open(&input)?;
            let index = slide_index(slide)?;
            let placements = load_placements(&values, block.as_deref())?;
            let options = match layout_config {
                Some(path) => {
                    let json = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    LayoutOptions::from_json(&json)?
                }
                None => LayoutOptions::default(),
            };

            let outcome = {
                let mut canvas = deck.canvas_mut(index)?;
                TextLayout::with_options(options).try_layout(&mut canvas, &placements)
            };
            match outcome {
                Ok(result) => {
                    println!(
                        "✓ Placed {} fields, removed {} elements",
                        result.created.len(),
                        result.removed
                    );
                    if let Some(factor) = result.shrink_factor {
                        println!("  Fonts shrunk by {:.2}", factor);
                    }
                }
                Err(e) => {
                    eprintln!("Layout failed ({}), replacing tokens in place", e);
                    let map = substitution_values(&placements);
                    let report = replace_tokens_report(deck.slide_mut(index)?, &map);
                    println!("✓ Replaced {} tokens", report.replacements);
                }
            }
            save(&deck, &output)?;
        }

        Commands::Replace {
            input,
            output,
            slide,
            values,
        } => {
            let mut deck = open(&input)?;
            let map: HashMap<String, String> = values.into_iter().collect();
            let report = replace_tokens_report(deck.slide_mut(slide_index(slide)?)?, &map);
            save(&deck, &output)?;
            println!(
                "✓ Replaced {} tokens in {} elements",
                report.replacements, report.elements_touched
            );
        }

        Commands::Preview {
            input,
            output,
            slide,
            width,
            height,
        } => {
            if width == 0 || height == 0 {
                bail!("Preview size must be positive, got {}x{}", width, height);
            }
            let deck = open(&input)?;
            let png = render_slide(&deck, slide, &PreviewOptions { width, height })?;
            std::fs::write(&output, png)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("✓ Preview written to: {}", output.display());
        }

        Commands::Info { input, detailed } => {
            let deck = open(&input)?;
            let (width, height) = deck.slide_size();
            println!("Presentation Information for: {}", input.display());
            println!("==========================================");
            println!(
                "Slide size: {:.2}\" x {:.2}\"",
                blockdeck::geometry::emu_to_inches(width),
                blockdeck::geometry::emu_to_inches(height)
            );
            println!("Slides: {}", deck.slide_count());
            println!("Layouts: {}", deck.layouts().len());
            for (i, layout) in deck.layouts().iter().enumerate() {
                println!(
                    "  {}: {} ({})",
                    i,
                    layout.name(),
                    layout.layout_type().unwrap_or("custom")
                );
            }

            if detailed {
                println!("\nSlides:");
                println!("-------");
                let descriptors = extract_blocks(&deck);
                for (i, slide) in deck.slides().iter().enumerate() {
                    println!("Slide {}: {} elements", i + 1, slide.elements().len());
                    for descriptor in descriptors.iter().filter(|d| d.slide_number == i + 1) {
                        println!(
                            "  {:<12} {:<24} {}",
                            descriptor.block_type.as_str(),
                            descriptor.key,
                            descriptor.placeholder()
                        );
                    }
                }
            }
        }

        Commands::AddSlide {
            input,
            output,
            layout,
        } => {
            let mut deck = open(&input)?;
            let index = match layout {
                Some(layout_index) => deck.add_slide(layout_index)?,
                None => deck.add_blank_slide()?,
            };
            save(&deck, &output)?;
            println!("✓ Added slide {}", index + 1);
        }

        Commands::DeleteSlide {
            input,
            output,
            slide,
        } => {
            let mut deck = open(&input)?;
            deck.delete_slide(slide_index(slide)?)?;
            save(&deck, &output)?;
            println!("✓ Deleted slide {}, {} remain", slide, deck.slide_count());
        }

        Commands::CloneSlide {
            input,
            output,
            slide,
        } => {
            let mut deck = open(&input)?;
            let index = deck.clone_slide(slide_index(slide)?)?;
            save(&deck, &output)?;
            println!("✓ Cloned slide {} as slide {}", slide, index + 1);
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<Presentation> {
    Presentation::open_file(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn save(deck: &Presentation, path: &Path) -> Result<()> {
    deck.save_to_file(path)
        .with_context(|| format!("Failed to save {}", path.display()))
}

fn slide_index(slide_number: usize) -> Result<usize> {
    match slide_number.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("Slide numbers start at 1"),
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected label.name=value, got '{}'", s)),
    }
}

/// Placements from an array, or from an object of values matched against the
/// fields of `block`
fn load_placements(path: &Path, block: Option<&Path>) -> Result<Vec<FieldPlacement>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&json)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(_) => {
            let Some(block) = block else {
                bail!("A value object needs --block to resolve its fields");
            };
            let values: HashMap<String, String> = serde_json::from_value(value)
                .context("Field values must be strings")?;
            let fields = fields_from_descriptors(&extract_blocks(&open(block)?));
            Ok(placements_for(&fields, &values))
        }
        _ => bail!("Expected an array of placements or an object of values"),
    }
}
