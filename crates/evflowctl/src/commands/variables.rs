use anyhow::{Context, Result};
use std::path::Path;

use evflow_core::Flow;

use crate::output::{self, OutputFormat};

/// List the `trigger.<id>.user.*` variables available to actions
pub fn execute(file: &Path, output: &str) -> Result<()> {
    let format = OutputFormat::parse(output)?;
    let flow = Flow::from_file(file)
        .with_context(|| format!("Failed to load flow: {}", file.display()))?;

    let sets = flow.trigger_variables();
    if !output::print_structured(&sets, format)? {
        output::print_variables(&sets);
    }
    Ok(())
}
