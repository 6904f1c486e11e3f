//! CLI command definitions and dispatch.

pub mod plan;
pub mod render;

use std::path::Path;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dockconf_common::config::ComposeConfig;
use dockconf_common::constants::DEFAULT_LINKS_KEY;
use dockconf_compose::render::VariableRenderer;
use dockconf_compose::{Composer, Composition};

/// dockconf — resolve container templates into an ordered run plan.
#[derive(Parser, Debug)]
#[command(name = "dockconf", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Resolution settings shared by every subcommand.
    #[command(flatten)]
    pub settings: Settings,
}

/// Global resolution flags.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Option whose entries name linked containers.
    #[arg(long, global = true, env = "DOCKCONF_LINKS_KEY", default_value = DEFAULT_LINKS_KEY)]
    pub links_key: String,

    /// Merge only known container parameters from configuration entries.
    #[arg(long, global = true, env = "DOCKCONF_STRICT_PARAMETERS")]
    pub strict_parameters: bool,

    /// Accept containers that end up without an image.
    #[arg(long, global = true, env = "DOCKCONF_SKIP_IMAGE_CHECK")]
    pub skip_image_check: bool,

    /// Leave `{{ variable }}` placeholders unrendered.
    #[arg(long, global = true)]
    pub no_render: bool,
}

impl Settings {
    /// Maps the flags onto the engine's settings model.
    #[must_use]
    pub fn compose_config(&self) -> ComposeConfig {
        ComposeConfig {
            links_key: self.links_key.clone(),
            strict_parameters: self.strict_parameters,
            require_image: !self.skip_image_check,
        }
    }

    /// Builds the composer these flags describe.
    #[must_use]
    pub fn composer(&self) -> Composer {
        let composer = Composer::new(self.compose_config());
        if self.no_render {
            composer
        } else {
            composer.with_renderer(VariableRenderer)
        }
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the resolved run order with lineage and link dependencies.
    Plan(plan::PlanArgs),
    /// Emit the ordered container records as facts.
    Render(render::RenderArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Plan(args) => plan::execute(&args, &cli.settings),
        Command::Render(args) => render::execute(&args, &cli.settings),
    }
}

/// Reads and parses a composition document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid
/// composition.
pub fn load_composition(path: &Path) -> anyhow::Result<Composition> {
    tracing::info!(path = %path.display(), "loading composition");
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse composition {}", path.display()))
}
