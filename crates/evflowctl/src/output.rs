//! Terminal output for flows, templates and variables
//!
//! `wide` renders fixed-width tables; `json` and `yaml` dump the typed model.

use anyhow::{bail, Result};
use serde::Serialize;

use evflow_core::{FlowAction, FlowSummary, FlowTrigger, TriggerVariables};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Wide,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "wide" | "table" => Ok(Self::Wide),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => bail!("Unknown output format: {} (expected wide, json or yaml)", other),
        }
    }
}

/// Print `value` as JSON or YAML; returns false for `wide`
pub fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Wide => return Ok(false),
    }
    Ok(true)
}

pub fn print_summaries(items: &[FlowSummary]) {
    println!("{:<38} {:<28} {:<9} {:<6} {}", "ID", "NAME", "PENDING", "MULTI", "UPDATED");
    for item in items {
        let updated = item
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<38} {:<28} {:<9} {:<6} {}",
            item.id,
            truncate(&item.name, 28),
            yes_no(item.still_pending),
            yes_no(item.multiple_runs),
            updated
        );
    }
}

pub fn print_variables(sets: &[TriggerVariables]) {
    if sets.is_empty() {
        println!("No registration triggers; no variables available.");
        return;
    }
    println!("{:<18} {:<10} {}", "TRIGGER", "VARIABLE", "PATH");
    for set in sets {
        for var in &set.variables {
            println!("{:<18} {:<10} {}", set.label, var.name, var.path);
        }
    }
}

/// Trigger and action listing used by `describe`
pub fn print_children(triggers: &[FlowTrigger], actions: &[FlowAction]) -> Result<()> {
    println!("Triggers:");
    if triggers.is_empty() {
        println!("  <none>");
    }
    for trigger in triggers {
        let details = serde_json::to_string(&trigger.details.to_value()?)?;
        println!("  {:<38} {:<16} {}", trigger.id, trigger.kind().to_string(), details);
    }

    println!("Actions:");
    if actions.is_empty() {
        println!("  <none>");
    }
    for action in actions {
        let details = serde_json::to_string(&action.details.to_value()?)?;
        println!(
            "  {:<38} {:<18} {}",
            action.id,
            action.details.kind().to_string(),
            details
        );
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
