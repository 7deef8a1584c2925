use anyhow::{Context, Result};
use std::path::Path;

use evflow_core::{Flow, FlowTemplate};

/// Validate a definition file without contacting the API
pub fn execute(file: &Path, template: bool) -> Result<()> {
    let (kind, name, triggers, actions, result) = if template {
        let def = FlowTemplate::from_file(file)
            .with_context(|| format!("Failed to load template: {}", file.display()))?;
        let result = def.validate();
        ("template", def.name, def.triggers.len(), def.actions.len(), result)
    } else {
        let def = Flow::from_file(file)
            .with_context(|| format!("Failed to load flow: {}", file.display()))?;
        let result = def.validate();
        ("flow", def.name, def.triggers.len(), def.actions.len(), result)
    };

    result.with_context(|| format!("{} '{}' is invalid", kind, name))?;

    println!("{}/{} valid", kind, name);
    println!("  Triggers: {}", triggers);
    println!("  Actions:  {}", actions);
    Ok(())
}
