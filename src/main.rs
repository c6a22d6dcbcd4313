use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::EnvFilter;

use lacaktani::core::db::{DEFAULT_LIST_LIMIT, HistoryDb, HistoryRepository};
use lacaktani::models::percent;
use lacaktani::{
    Annotator, AnnotatorConfig, DetectorHandle, PredictionPipeline, Settings, SidecarDetector,
};

#[derive(Parser)]
#[command(name = "lacaktani")]
#[command(about = "Annotate coffee cherry detections and keep a prediction history")]
struct Cli {
    /// History database file
    #[arg(long, value_name = "FILE", default_value = "lacaktani.db", global = true)]
    db: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Annotate an image with detections produced by an external model
    Predict {
        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// JSON array of detections written by the model process
        #[arg(long, value_name = "FILE")]
        detections: PathBuf,

        /// Minimum confidence, between 0 and 1
        #[arg(long, default_value_t = lacaktani::settings::DEFAULT_CONFIDENCE)]
        confidence: f32,

        /// Model identifier recorded in the settings
        #[arg(long, default_value = lacaktani::settings::DEFAULT_MODEL)]
        model: String,

        /// Write the annotated JPEG here
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// TrueType font for labels
        #[arg(long, value_name = "FILE")]
        font: Option<PathBuf>,

        #[arg(long, default_value_t = 95)]
        jpeg_quality: u8,

        /// Store the result in the history database
        #[arg(long)]
        save: bool,

        /// Print the full prediction response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or manage saved predictions
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List saved predictions, newest first
    List {
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,
    },
    /// Delete a saved prediction
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Export all predictions as CSV
    Export {
        /// Output file; stdout when omitted
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Predict {
            image_path,
            detections,
            confidence,
            model,
            out,
            font,
            jpeg_quality,
            save,
            json,
        } => {
            let settings = Settings {
                model: model.clone(),
                ..Settings::default()
            }
            .with_confidence(confidence)?;

            let config = AnnotatorConfig {
                font_path: font,
                jpeg_quality,
                ..AnnotatorConfig::default()
            };
            let detector = SidecarDetector::from_file(&detections)?;
            let pipeline = PredictionPipeline::new(
                Annotator::from_config(config),
                DetectorHandle::with_detector(model, detector),
                settings,
            );

            let bytes = tokio::fs::read(&image_path)
                .await
                .with_context(|| format!("Failed to read image {:?}", image_path))?;
            let response = pipeline.predict(bytes.clone()).await?;

            if let Some(out) = &out {
                let jpeg = base64_decode(&response.image_data)?;
                tokio::fs::write(out, jpeg)
                    .await
                    .with_context(|| format!("Failed to write annotated image {:?}", out))?;
                println!("Annotated image written to {:?}", out);
            }

            if save {
                let db = HistoryDb::new(&args.db).await?;
                let created_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
                let id = db.save(&response.to_history(&bytes, created_at)).await?;
                println!("Saved to history with id {}", id);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("\n=== Detection Summary ===");
                println!("Matang:   {}", response.stats.matang);
                println!("Mentah:   {}", response.stats.mentah);
                println!("Berbunga: {}", response.stats.berbunga);
                match &response.top_detection {
                    Some(top) => println!(
                        "Top:      {} {:.1}%",
                        top.label,
                        top.confidence * 100.0
                    ),
                    None => println!("Top:      -"),
                }
            }
        }

        Command::History { command } => {
            let db = HistoryDb::new(&args.db).await?;
            match command {
                HistoryCommand::List { limit } => {
                    let records = db.list(limit).await?;
                    if records.is_empty() {
                        println!("No saved predictions.");
                    }
                    for r in &records {
                        let top = if r.top_label.is_empty() {
                            String::new()
                        } else {
                            format!("  {} {}%", r.top_label, percent(r.top_confidence))
                        };
                        println!(
                            "#{:<5} {}  M:{} N:{} B:{}{}",
                            r.id, r.created_at, r.matang, r.mentah, r.berbunga, top
                        );
                    }
                }
                HistoryCommand::Delete { id } => {
                    if db.delete(id).await? {
                        println!("Deleted history record {}", id);
                    } else {
                        println!("No history record with id {}", id);
                    }
                }
                HistoryCommand::Export { out } => {
                    let csv = db.export_csv().await?;
                    match out {
                        Some(path) => {
                            tokio::fs::write(&path, csv)
                                .await
                                .with_context(|| format!("Failed to write export {:?}", path))?;
                            println!("History exported to {:?}", path);
                        }
                        None => print!("{}", csv),
                    }
                }
            }
        }
    }

    Ok(())
}

fn base64_decode(data: &str) -> anyhow::Result<Vec<u8>> {
    use base64::{Engine, prelude::BASE64_STANDARD};
    Ok(BASE64_STANDARD.decode(data)?)
}
