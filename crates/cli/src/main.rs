//! opsrelay CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the WebSocket chat gateway
//! - `chat`    — Interactive chat or single-message mode, in-process
//! - `tools`   — List the tool catalog or call a tool directly
//! - `config`  — Initialize or show the configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "opsrelay",
    about = "opsrelay — tool-orchestrating chat server for release management",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the WebSocket chat gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat through the pipeline without a gateway
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Inspect or exercise the tool catalog
    Tools {
        #[command(subcommand)]
        command: ToolsCommands,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ToolsCommands {
    /// List the registered tools and their parameters
    List,
    /// Call a tool against the backend, bypassing the model
    Call {
        /// Tool name, e.g. get_environments
        name: String,
        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a default config file if none exists
    Init,
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Tools { command } => match command {
            ToolsCommands::List => commands::tools_cmd::list().await?,
            ToolsCommands::Call { name, params } => {
                commands::tools_cmd::call(&name, &params).await?
            }
        },
        Commands::Config { command } => match command {
            ConfigCommands::Init => commands::config_cmd::init()?,
            ConfigCommands::Show => commands::config_cmd::show()?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn chat_message_flag_parses() {
        let cli = Cli::parse_from(["opsrelay", "chat", "--message", "list envs"]);
        match cli.command {
            Commands::Chat { message } => assert_eq!(message.as_deref(), Some("list envs")),
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn tools_call_defaults_to_empty_params() {
        let cli = Cli::parse_from(["opsrelay", "tools", "call", "get_environments"]);
        match cli.command {
            Commands::Tools {
                command: ToolsCommands::Call { name, params },
            } => {
                assert_eq!(name, "get_environments");
                assert_eq!(params, "{}");
            }
            _ => panic!("expected tools call command"),
        }
    }
}
