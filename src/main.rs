use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use campus_chat::{client, config::ServeConfig, constants, prompt::Persona, web_server};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the chat web server.
    Serve(ServeConfig),
    /// Chat with a running server from the terminal.
    Chat {
        #[arg(long, env = "CAMPUS_CHAT_SERVER", default_value = constants::DEFAULT_SERVER_URL, help = "Base URL of the chat server.")]
        server: String,
        #[arg(long, default_value = constants::DEFAULT_INSTITUTION)]
        institution: String,
        #[arg(long, default_value = constants::DEFAULT_INSTITUTION_SHORT)]
        institution_short: String,
    },
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,campus_chat=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(config) => {
            info!("Starting chat server on {}...", config.addr());

            let server = web_server::start_web_server(config);
            tokio::select! {
                res = server => {
                    if let Err(e) = &res {
                        error!("Web server failed: {:?}", e);
                    }
                    res?;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down...");
                }
            }
            info!("Shutdown complete.");
        }
        Commands::Chat {
            server,
            institution,
            institution_short,
        } => {
            info!("Starting interactive chat session against {}", server);
            let persona = Persona::new(institution, institution_short);
            let chat_client = client::ChatClient::new(
                &server,
                Duration::from_secs(constants::DEFAULT_REQUEST_TIMEOUT_SECS),
            )?;
            client::run_chat(&chat_client, persona.greeting())
                .await
                .context("Chat session failed")?;
        }
    }

    Ok(())
}
