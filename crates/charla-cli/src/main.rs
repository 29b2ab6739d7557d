//! charla CLI: terminal chat composer with Ollama endpoint monitoring

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use charla_engine::{ConnectionMonitor, ConnectionState, OllamaClient, Settings};

/// Chat composer TUI with Ollama endpoint monitoring
#[derive(Parser)]
#[command(name = "charla")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the TUI (default when no command specified)
    Tui,

    /// Initialize the .charla/ settings file
    Init,

    /// Check whether the Ollama endpoint is reachable
    Check {
        /// Endpoint to check (defaults to the configured one)
        #[arg(long)]
        endpoint: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the models available at the Ollama endpoint
    Models {
        /// Endpoint to query (defaults to the configured one)
        #[arg(long)]
        endpoint: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

const CHARLA_DIR: &str = ".charla";

fn settings_path() -> PathBuf {
    Path::new(CHARLA_DIR).join("settings.json")
}

fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error loading settings: {e}");
                std::process::exit(1);
            }
        }
    } else {
        Settings::default()
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Tui) => {
            let settings = load_settings();
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            if let Err(e) = rt.block_on(charla_tui::run_tui(&settings)) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Init) => {
            cmd_init();
        }
        Some(Commands::Check { endpoint, json }) => {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(cmd_check(endpoint, json));
        }
        Some(Commands::Models { endpoint, json }) => {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(cmd_models(endpoint, json));
        }
    }
}

fn cmd_init() {
    let path = settings_path();
    if path.exists() {
        println!("Settings already exist at {}", path.display());
        return;
    }

    let settings = Settings::default();
    match settings.save(&path) {
        Ok(()) => {
            println!("Created {}", path.display());
            println!("Edit it to point at your backend and Ollama endpoint");
        }
        Err(e) => {
            eprintln!("Failed to write settings: {e}");
            std::process::exit(1);
        }
    }
}

fn build_monitor(endpoint_override: Option<String>) -> ConnectionMonitor {
    let settings = load_settings();
    let endpoint = endpoint_override.unwrap_or_else(|| settings.ollama_endpoint.clone());
    let client = OllamaClient::new(settings.resolve_backend_url());
    ConnectionMonitor::new(client, endpoint, true)
}

async fn cmd_check(endpoint: Option<String>, json: bool) {
    let mut monitor = build_monitor(endpoint);
    monitor.check_connection().await;

    let state = monitor.state();
    if json {
        print_state_json(&monitor, state);
    } else {
        println!("Endpoint: {}", monitor.endpoint());
        if state.is_connected {
            println!("Status: connected");
        } else {
            println!("Status: not connected");
            if let Some(error) = &state.error {
                println!("Error: {error}");
            }
        }
    }

    if !state.is_connected {
        std::process::exit(1);
    }
}

async fn cmd_models(endpoint: Option<String>, json: bool) {
    let mut monitor = build_monitor(endpoint);
    monitor.refresh().await;

    let state = monitor.state();
    if json {
        print_state_json(&monitor, state);
    } else {
        println!("Endpoint: {}", monitor.endpoint());
        if let Some(error) = &state.error {
            println!("Error: {error}");
        } else if state.models.is_empty() {
            println!("No models available");
        } else {
            println!("Models:\n");
            for model in &state.models {
                println!("  {:<24} {}", model.name, model.label);
            }
        }
    }

    if !state.is_connected {
        std::process::exit(1);
    }
}

fn print_state_json(monitor: &ConnectionMonitor, state: &ConnectionState) {
    let output = serde_json::json!({
        "endpoint": monitor.endpoint(),
        "is_connected": state.is_connected,
        "error": state.error,
        "models": state
            .models
            .iter()
            .map(|m| serde_json::json!({ "name": m.name, "label": m.label }))
            .collect::<Vec<_>>(),
        "last_checked": state.last_checked.map(|t| t.to_rfc3339()),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).expect("failed to serialize")
    );
}
