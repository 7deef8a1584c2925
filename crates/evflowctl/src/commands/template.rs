//! Flow template CLI commands
//!
//! Templates live at the organization level; `instantiate` copies one into an
//! event as a new flow.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use tracing::info;

use evflow_client::{FlowApiClient, FlowScope};
use evflow_core::FlowTemplate;

use crate::output::{self, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List templates, or get one template
    Get {
        /// Template id (optional - lists all if omitted)
        id: Option<String>,

        /// Organization id (UUID)
        #[arg(long)]
        org: String,

        /// Output format (wide, json, yaml)
        #[arg(short, long, default_value = "wide")]
        output: String,
    },

    /// Show a template with its triggers and actions
    Describe {
        id: String,

        #[arg(long)]
        org: String,
    },

    /// Create or update a template from a definition file
    Apply {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long)]
        org: String,
    },

    /// Delete a template
    Delete {
        id: String,

        #[arg(long)]
        org: String,
    },

    /// Copy a template into an event as a new flow
    Instantiate {
        /// Template id
        id: String,

        #[arg(long)]
        org: String,

        /// Target event id (UUID)
        #[arg(long)]
        event: String,
    },
}

pub async fn execute(client: &FlowApiClient, cmd: TemplateCommands) -> Result<()> {
    match cmd {
        TemplateCommands::Get { id, org, output } => {
            get_templates(client, &org, id.as_deref(), &output).await
        }
        TemplateCommands::Describe { id, org } => {
            let template = client.get_template(&org, &id).await?;
            println!("Name:          {}", template.name);
            println!("ID:            {}", template.id);
            if !template.description.is_empty() {
                println!("Description:   {}", template.description);
            }
            println!("Multiple runs: {}", template.multiple_runs);
            println!();
            output::print_children(&template.triggers, &template.actions)
        }
        TemplateCommands::Apply { file, org } => apply_template(client, &org, &file).await,
        TemplateCommands::Delete { id, org } => {
            client.delete_flow(&FlowScope::template(&org), &id).await?;
            println!("template/{} deleted", id);
            Ok(())
        }
        TemplateCommands::Instantiate { id, org, event } => {
            let flow = client.instantiate_template(&org, &id, &event).await?;
            println!("flow/{} created from template/{}", flow.name, id);
            println!("  ID: {}", flow.id);
            Ok(())
        }
    }
}

async fn get_templates(
    client: &FlowApiClient,
    org: &str,
    id: Option<&str>,
    output: &str,
) -> Result<()> {
    let format = OutputFormat::parse(output)?;

    if let Some(id) = id {
        let template = client.get_template(org, id).await?;
        if !output::print_structured(&template, format)? {
            output::print_children(&template.triggers, &template.actions)?;
        }
        return Ok(());
    }

    let templates = client.list_templates(org).await?;
    if !output::print_structured(&templates, format)? {
        if templates.is_empty() {
            println!("No templates found.");
        } else {
            output::print_summaries(&templates);
        }
    }
    Ok(())
}

async fn apply_template(client: &FlowApiClient, org: &str, file: &Path) -> Result<()> {
    info!("Applying template from: {}", file.display());

    let template = FlowTemplate::from_file(file)
        .with_context(|| format!("Failed to load template: {}", file.display()))?;
    template
        .validate()
        .with_context(|| format!("template '{}' is invalid", template.name))?;

    let saved = if template.id.is_empty() {
        let created = client.create_template(org, &template).await?;
        println!("template/{} created", created.name);
        created
    } else {
        let updated = client.update_template(org, &template.id, &template).await?;
        println!("template/{} configured", updated.name);
        updated
    };
    println!("  ID: {}", saved.id);
    Ok(())
}
