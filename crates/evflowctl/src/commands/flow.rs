//! Flow CLI commands
//!
//! Commands:
//! - evflowctl flow get [id] --org <org> --event <event>
//! - evflowctl flow describe <id> --org <org> --event <event>
//! - evflowctl flow apply -f flow.yaml --org <org> --event <event>
//! - evflowctl flow delete <id> --org <org> --event <event>

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use evflow_client::{FlowApiClient, FlowScope};
use evflow_core::Flow;

use crate::output::{self, OutputFormat};

/// Event a flow belongs to
#[derive(Args, Debug, Clone)]
pub struct EventArgs {
    /// Organization id (UUID)
    #[arg(long)]
    pub org: String,

    /// Event id (UUID)
    #[arg(long)]
    pub event: String,
}

impl EventArgs {
    fn scope(&self) -> FlowScope {
        FlowScope::event(&self.org, &self.event)
    }
}

#[derive(Subcommand, Debug)]
pub enum FlowCommands {
    /// List flows, or get one flow
    Get {
        /// Flow id (optional - lists all if omitted)
        id: Option<String>,

        #[command(flatten)]
        target: EventArgs,

        /// Output format (wide, json, yaml)
        #[arg(short, long, default_value = "wide")]
        output: String,
    },

    /// Show a flow with its triggers and actions
    Describe {
        /// Flow id
        id: String,

        #[command(flatten)]
        target: EventArgs,
    },

    /// Create or update a flow from a definition file
    Apply {
        /// Definition file (YAML or JSON)
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        target: EventArgs,
    },

    /// Delete a flow
    Delete {
        /// Flow id
        id: String,

        #[command(flatten)]
        target: EventArgs,
    },
}

pub async fn execute(client: &FlowApiClient, cmd: FlowCommands) -> Result<()> {
    match cmd {
        FlowCommands::Get { id, target, output } => {
            get_flows(client, &target.scope(), id.as_deref(), &output).await
        }
        FlowCommands::Describe { id, target } => describe_flow(client, &target.scope(), &id).await,
        FlowCommands::Apply { file, target } => apply_flow(client, &target.scope(), &file).await,
        FlowCommands::Delete { id, target } => {
            client.delete_flow(&target.scope(), &id).await?;
            println!("flow/{} deleted", id);
            Ok(())
        }
    }
}

async fn get_flows(
    client: &FlowApiClient,
    scope: &FlowScope,
    id: Option<&str>,
    output: &str,
) -> Result<()> {
    let format = OutputFormat::parse(output)?;

    if let Some(id) = id {
        let flow = client.get_flow(scope, id).await?;
        if !output::print_structured(&flow, format)? {
            output::print_summaries(&[flow.summary()]);
        }
        return Ok(());
    }

    let flows = client.list_flows(scope).await?;
    if !output::print_structured(&flows, format)? {
        if flows.is_empty() {
            println!("No flows found. Use 'evflowctl flow apply -f <file>' to add one.");
        } else {
            output::print_summaries(&flows);
        }
    }
    Ok(())
}

async fn describe_flow(client: &FlowApiClient, scope: &FlowScope, id: &str) -> Result<()> {
    let flow = client.get_flow(scope, id).await?;

    println!("Name:          {}", flow.name);
    println!("ID:            {}", flow.id);
    if !flow.description.is_empty() {
        println!("Description:   {}", flow.description);
    }
    println!("Still pending: {}", flow.still_pending);
    println!("Multiple runs: {}", flow.multiple_runs);
    if let Some(ref by) = flow.audit.updated_by {
        println!("Updated by:    {}", by);
    }
    println!();
    output::print_children(&flow.triggers, &flow.actions)?;

    if let Err(e) = flow.validate() {
        println!();
        println!("Warning: stored flow does not validate: {}", e);
    }
    Ok(())
}

/// Validate locally, then create (no id) or update (id set)
async fn apply_flow(client: &FlowApiClient, scope: &FlowScope, file: &Path) -> Result<()> {
    info!("Applying flow from: {}", file.display());

    let flow = Flow::from_file(file)
        .with_context(|| format!("Failed to load flow: {}", file.display()))?;
    flow.validate()
        .with_context(|| format!("flow '{}' is invalid", flow.name))?;

    let saved = if flow.id.is_empty() {
        let created = client.create_flow(scope, &flow).await?;
        println!("flow/{} created", created.name);
        created
    } else {
        let updated = client.update_flow(scope, &flow.id, &flow).await?;
        println!("flow/{} configured", updated.name);
        updated
    };
    println!("  ID:       {}", saved.id);
    println!("  Triggers: {}", flow.triggers.len());
    println!("  Actions:  {}", flow.actions.len());
    Ok(())
}
