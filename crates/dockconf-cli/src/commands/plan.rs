//! `dockconf plan` — Display the resolved run order before applying it.

use std::path::PathBuf;

use clap::Args;
use dockconf_common::constants::{DEFAULT_COMPOSITION_FILE, IMAGE_KEY};
use dockconf_compose::Plan;

use super::{Settings, load_composition};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the composition document.
    #[arg(default_value = DEFAULT_COMPOSITION_FILE)]
    pub file: PathBuf,
}

/// Executes the `plan` command.
///
/// Resolves templates, builds the link graph, and prints the run order
/// together with each container's template lineage and dependencies.
///
/// # Errors
///
/// Returns an error if loading or resolving the composition fails.
#[allow(clippy::print_stdout)]
pub fn execute(args: &PlanArgs, settings: &Settings) -> anyhow::Result<()> {
    let composition = load_composition(&args.file)?;
    let plan = settings.composer().plan(&composition)?;
    print!("{}", render_plan(&args.file.display().to_string(), &plan));
    Ok(())
}

/// Formats a plan as human-readable text.
#[must_use]
pub fn render_plan(source: &str, plan: &Plan) -> String {
    let mut out = String::new();
    out.push_str(&format!("Run plan for: {source}\n"));
    out.push_str(&"\u{2550}".repeat(35));
    out.push_str("\n\n");

    for (position, container) in plan.containers.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", position + 1, container.name));
        out.push_str(&format!(
            "      template: {}\n",
            container.lineage.join(" -> ")
        ));
        if let Some(image) = container.options.get(IMAGE_KEY) {
            out.push_str(&format!("      image: {image}\n"));
        }
        let deps = plan.graph.dependencies_of(&container.name);
        if !deps.is_empty() {
            out.push_str(&format!("      after: {}\n", deps.join(", ")));
        }
    }

    out.push('\n');
    out.push_str(&format!(
        "  {} container(s) will be configured.\n",
        plan.containers.len()
    ));
    out
}
