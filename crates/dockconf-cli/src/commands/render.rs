//! `dockconf render` — Emit the ordered container records as facts.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use dockconf_common::constants::DEFAULT_COMPOSITION_FILE;

use super::{Settings, load_composition};
use crate::output::{OutputFormat, serialize};

/// Arguments for the `render` subcommand.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Path to the composition document.
    #[arg(default_value = DEFAULT_COMPOSITION_FILE)]
    pub file: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `render` command.
///
/// # Errors
///
/// Returns an error if the composition cannot be resolved or the output
/// cannot be written.
#[allow(clippy::print_stdout)]
pub fn execute(args: &RenderArgs, settings: &Settings) -> anyhow::Result<()> {
    let text = render_file(args, settings)?;
    if let Some(ref out_path) = args.output {
        std::fs::write(out_path, &text)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        tracing::info!(path = %out_path.display(), "facts written");
    } else {
        print!("{text}");
    }
    Ok(())
}

fn render_file(args: &RenderArgs, settings: &Settings) -> anyhow::Result<String> {
    let composition = load_composition(&args.file)?;
    let plan = settings.composer().plan(&composition)?;
    serialize(&plan.facts(), args.format)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;
    use crate::commands::{Cli, Command};

    const STACK: &str = r#"
templates:
  base:
    detach: true
    name: "{{ CONTAINER_CONFIG_NAME }}"
  web:
    based_on: base
    image: "nginx:{{ tag | default('stable') }}"
  db:
    based_on: base
    image: postgres
config:
  frontend:
    template: web
    links: [database]
  database:
    template: db
"#;

    fn parse(file: &std::path::Path, extra: &[&str]) -> (RenderArgs, Settings) {
        let mut argv = vec!["dockconf", "render"];
        let path = file.to_str().expect("utf-8 path");
        argv.push(path);
        argv.extend_from_slice(extra);
        let cli = Cli::parse_from(argv);
        match cli.command {
            Command::Render(args) => (args, cli.settings),
            Command::Plan(_) => unreachable!("parsed render"),
        }
    }

    fn stack_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(STACK.as_bytes()).expect("write");
        file
    }

    #[test]
    fn renders_facts_in_run_order() {
        let file = stack_file();
        let (args, settings) = parse(file.path(), &[]);
        let text = render_file(&args, &settings).expect("render");

        let facts: serde_json::Value = serde_json::from_str(&text).expect("json");
        let configs = facts["docker_container_configurations"]
            .as_array()
            .expect("list of configurations");
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0]["name"], "database");
        assert_eq!(configs[1]["name"], "frontend");
        assert_eq!(configs[1]["image"], "nginx:stable");
        assert_eq!(configs[1]["detach"], true);
    }

    #[test]
    fn no_render_keeps_placeholders() {
        let file = stack_file();
        let (args, settings) = parse(file.path(), &["--no-render", "--format", "yaml"]);
        let text = render_file(&args, &settings).expect("render");
        assert!(text.contains("{{ CONTAINER_CONFIG_NAME }}"), "got:\n{text}");
    }

    #[test]
    fn output_flag_writes_file() {
        let file = stack_file();
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("facts.json");
        let target_str = target.to_str().expect("utf-8 path");
        let (args, settings) = parse(file.path(), &["--output", target_str]);
        execute(&args, &settings).expect("execute");
        let written = std::fs::read_to_string(&target).expect("read");
        assert!(written.contains("docker_container_configurations"));
    }
}
