use clap::{Parser, Subcommand};
use std::path::PathBuf;

use evflow_client::{ClientConfig, FlowApiClient, ENV_API_TIMEOUT, ENV_API_TOKEN, ENV_API_URL};

use crate::commands;

/// evflow CLI - kubectl-style management of event flows
#[derive(Parser, Debug)]
#[command(name = "evflowctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Flow API base URL
    #[arg(long, global = true, env = ENV_API_URL)]
    pub api_url: Option<String>,

    /// Bearer token for the flow API
    #[arg(long, global = true, env = ENV_API_TOKEN, hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = ENV_API_TIMEOUT)]
    pub timeout: Option<u64>,

    /// Client config file (default: <config dir>/evflow/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a flow or template definition file locally
    Validate {
        /// Definition file (YAML or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Treat the file as a flow template
        #[arg(long)]
        template: bool,
    },

    /// List the registration variables a definition exposes to its actions
    Variables {
        /// Definition file (YAML or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Output format (wide, json, yaml)
        #[arg(short, long, default_value = "wide")]
        output: String,
    },

    /// Manage flows attached to an event
    Flow {
        #[command(subcommand)]
        command: commands::flow::FlowCommands,
    },

    /// Manage organization flow templates
    Template {
        #[command(subcommand)]
        command: commands::template::TemplateCommands,
    },

    /// Show version information
    Version,
}

impl Cli {
    pub async fn execute(self) -> anyhow::Result<()> {
        let overrides = ClientConfig {
            base_url: self.api_url,
            token: self.token,
            timeout_secs: self.timeout,
        };
        let config = self.config;

        match self.command {
            Commands::Validate { file, template } => commands::validate::execute(&file, template),
            Commands::Variables { file, output } => commands::variables::execute(&file, &output),
            Commands::Flow { command } => {
                let client = connect(config.as_deref(), overrides)?;
                commands::flow::execute(&client, command).await
            }
            Commands::Template { command } => {
                let client = connect(config.as_deref(), overrides)?;
                commands::template::execute(&client, command).await
            }
            Commands::Version => {
                println!("evflowctl {}", env!("CARGO_PKG_VERSION"));
                println!("evflow-core {}", evflow_core::VERSION);
                Ok(())
            }
        }
    }
}

/// Build a client from file, environment and flag settings
fn connect(path: Option<&std::path::Path>, overrides: ClientConfig) -> anyhow::Result<FlowApiClient> {
    let config = ClientConfig::load(path)?.merge(overrides);
    tracing::debug!(?config, "Resolved client config");
    Ok(FlowApiClient::new(&config)?)
}
