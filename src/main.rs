// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! SmartScan: leaf-image disease classifier client
//!
//! Drop an image, get the predicted disease and its confidence.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use smartscan::client::HttpClassifier;
use smartscan::config::AppConfig;
use smartscan::dropzone::DropZone;
use smartscan::pipeline::RequestStatus;
use smartscan::view::{Mode, SessionView};
use smartscan::Controller;

/// SmartScan CLI - potato leaf disease classifier client
#[derive(Parser, Debug)]
#[command(name = "smartscan")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Classify leaf images with a remote disease model", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify one image (extra paths are ignored)
    Classify {
        /// Image files; only the first acceptable one is sent
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Line-driven session: type paths, `clear`, `retry`, `status`, `quit`
    Interactive,

    /// Check that the classification service answers
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

/// One line typed in interactive mode
#[derive(Debug, PartialEq)]
enum Input {
    Files(Vec<PathBuf>),
    Clear,
    Retry,
    Status,
    Quit,
    Empty,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line {
        "" => Input::Empty,
        "clear" => Input::Clear,
        "retry" => Input::Retry,
        "status" => Input::Status,
        "quit" | "exit" => Input::Quit,
        _ => Input::Files(line.split_whitespace().map(PathBuf::from).collect()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading {:?}", cli.config))?;

    match cli.command {
        Some(Commands::Classify { paths }) => run_classify(config, paths, &cli.format).await,
        Some(Commands::Interactive) | None => run_interactive(config, &cli.format).await,
        Some(Commands::Status) => run_status(config).await,
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
    }
}

/// Classify a single dropped file and print the outcome
async fn run_classify(config: AppConfig, paths: Vec<PathBuf>, format: &str) -> anyhow::Result<()> {
    config.validate()?;
    let zone = DropZone::new(&config.intake);

    let files = zone.drop_paths(&paths);
    if files.is_empty() {
        bail!("No acceptable image among {} path(s)", paths.len());
    }
    if files.len() > 1 {
        warn!("{} images given, only {} is classified", files.len(), files[0].name());
    }

    let classifier = HttpClassifier::new(&config.api)?;
    info!("Classifier endpoint: {}", classifier.endpoint());
    let mut controller = Controller::new(Arc::new(classifier));

    controller.select_files(files);
    let status = controller.settle().await;
    print_view(&controller.view(), format)?;

    if status == RequestStatus::Failed {
        bail!("Classification failed");
    }
    Ok(())
}

/// Interactive session multiplexing typed commands with request completions
async fn run_interactive(config: AppConfig, format: &str) -> anyhow::Result<()> {
    config.validate()?;
    let zone = DropZone::new(&config.intake);
    let classifier = HttpClassifier::new(&config.api)?;
    info!("Classifier endpoint: {}", classifier.endpoint());
    let mut controller = Controller::new(Arc::new(classifier));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Drop an image path to analyse it. Commands: clear, retry, status, quit");

    loop {
        let waiting = controller.session().pending().is_some();

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Input::Quit => break,
                    Input::Empty => continue,
                    Input::Clear => controller.clear(),
                    Input::Retry => controller.retry(),
                    Input::Status => {}
                    Input::Files(paths) => controller.select_files(zone.drop_paths(&paths)),
                }
                print_view(&controller.view(), format)?;
            }
            Some(_) = controller.next_completion(), if waiting => {
                print_view(&controller.view(), format)?;
            }
        }
    }

    Ok(())
}

fn render_text(view: &SessionView) -> String {
    let name = view.file_name.as_deref().unwrap_or("image");
    match (view.mode, view.status, &view.result) {
        (Mode::NoImage, _, _) => "No image. Drop a leaf image to analyse.".to_string(),
        (_, RequestStatus::InFlight, _) => format!("{}: analysing image...", name),
        (_, RequestStatus::Succeeded, Some(result)) => format!("{}: {}", name, result),
        (_, RequestStatus::Failed, _) => {
            format!("{}: classification failed. Type 'retry' or drop another image.", name)
        }
        _ => format!("{}: {}", name, view.status),
    }
}

fn print_view(view: &SessionView, format: &str) -> anyhow::Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string(view)?),
        _ => println!("{}", render_text(view)),
    }
    Ok(())
}

/// Run status check
async fn run_status(config: AppConfig) -> anyhow::Result<()> {
    let classifier = HttpClassifier::new(&config.api)?;

    println!("SmartScan Status");
    println!("================");
    println!("Endpoint: {}", classifier.endpoint());

    match classifier.health_check().await {
        Ok(()) => println!("Service: Running"),
        Err(e) => println!("Service: Error - {}", e),
    }

    println!("Accepts: {}", config.intake.accept.join(", "));
    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Endpoint: {}", config.api.url);
            println!("  Field: {}", config.api.field_name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartscan::view::ResultView;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["smartscan"]).unwrap();
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_classify_command() {
        let cli = Cli::try_parse_from([
            "smartscan", "classify", "/tmp/leaf.jpg", "/tmp/other.jpg", "--format", "json"
        ]).unwrap();

        assert_eq!(cli.format, "json");
        match cli.command {
            Some(Commands::Classify { paths }) => {
                assert_eq!(paths, vec![PathBuf::from("/tmp/leaf.jpg"), PathBuf::from("/tmp/other.jpg")]);
            }
            _ => panic!("Expected Classify command"),
        }
    }

    #[test]
    fn test_cli_classify_needs_a_path() {
        assert!(Cli::try_parse_from(["smartscan", "classify"]).is_err());
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("  "), Input::Empty);
        assert_eq!(parse_input("clear"), Input::Clear);
        assert_eq!(parse_input("exit"), Input::Quit);
        assert_eq!(
            parse_input("a.jpg b.jpg"),
            Input::Files(vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")])
        );
    }

    #[test]
    fn test_render_text() {
        let mut view = SessionView {
            mode: Mode::Image,
            status: RequestStatus::Succeeded,
            preview_url: None,
            file_name: Some("f1.jpg".to_string()),
            result: Some(ResultView { label: "Healthy".to_string(), confidence: "95.00%".to_string() }),
        };
        assert_eq!(render_text(&view), "f1.jpg: Healthy, 95.00%");

        view.status = RequestStatus::InFlight;
        view.result = None;
        assert_eq!(render_text(&view), "f1.jpg: analysing image...");

        view.mode = Mode::NoImage;
        view.status = RequestStatus::Idle;
        assert!(render_text(&view).starts_with("No image"));
    }
}
