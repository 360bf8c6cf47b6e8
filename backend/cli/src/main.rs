mod analyze_cmd;
mod api;
mod config;
mod doctor_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use photocritic_config::PhotoCriticConfig;
use photocritic_understanding::{GeminiVisionClient, PhotoAnalyzer, PromptBuilder};

use api::AppState;
use terminal_output::{note_error, note_warn};

#[derive(Parser)]
#[command(name = "photocritic")]
#[command(about = "photocritic: AI critique of LinkedIn profile photos")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.photocritic/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level, including the raw model reply
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a profile photo (PNG, JPEG or WEBP)
    Analyze {
        image: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Replay a saved model reply instead of calling the service
        #[arg(long, value_name = "REPLY_FILE")]
        mock_reply: Option<PathBuf>,
    },
    /// Parse and render a saved raw model reply
    Parse {
        reply: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the prompt sent with every image
    Prompt,
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Check credential, config and model settings
    Doctor,
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config with secrets masked
    Show,
    /// Write a config file with default values
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            note_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let path = config::resolve_path(cli.config.as_deref());

    match cli.command {
        Commands::Analyze {
            image,
            json,
            mock_reply,
        } => {
            let config = config::load(&path, cli.verbose).await?;
            analyze_cmd::analyze(&config, &image, json, mock_reply.as_deref(), &mut std::io::stdout())
                .await
        }
        Commands::Parse { reply, json } => {
            let config = config::load(&path, cli.verbose).await?;
            analyze_cmd::parse(&config, &reply, json, &mut std::io::stdout()).await
        }
        Commands::Prompt => {
            println!("{}", PromptBuilder::build());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => config::show(&path).await,
            ConfigAction::Init { force } => config::init(&path, force).await,
        },
        Commands::Doctor => {
            config::init_bootstrap_logger();
            doctor_cmd::run(&path).await
        }
        Commands::Serve { port, bind } => {
            let config = config::load(&path, cli.verbose).await?;
            run_server(config, bind, port).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_server(config: PhotoCriticConfig, bind: Option<String>, port: Option<u16>) -> Result<()> {
    let client = GeminiVisionClient::from_config(&config)?;
    info!(model = client.model(), "Using Gemini vision backend");

    let state = Arc::new(AppState {
        analyzer: Mutex::new(PhotoAnalyzer::from_config(Arc::new(client), &config)),
        max_image_bytes: config.image.max_bytes(),
    });

    let app = api::build_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let bind = bind.unwrap_or_else(|| config.server.bind().to_string());
    let addr = format!("{}:{}", bind, port.unwrap_or(config.server.port()));
    if !is_loopback(&bind) {
        note_warn(&format!("Serving on {addr}; analyses spend your API quota"));
    }

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP API listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn is_loopback(bind: &str) -> bool {
    matches!(bind, "localhost" | "127.0.0.1" | "::1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_analyze_flags() {
        let cli = Cli::parse_from(["photocritic", "analyze", "me.jpg", "--json", "-c", "cfg.yaml"]);
        assert_eq!(cli.config.as_deref(), Some(Path::new("cfg.yaml")));
        match cli.command {
            Commands::Analyze { image, json, mock_reply } => {
                assert_eq!(image, PathBuf::from("me.jpg"));
                assert!(json);
                assert!(mock_reply.is_none());
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn loopback_detection() {
        assert!(is_loopback("127.0.0.1"));
        assert!(!is_loopback("0.0.0.0"));
    }
}
