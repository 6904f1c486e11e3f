//! Formatted output helpers for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

/// Serialization format for machine-readable output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML document.
    Yaml,
}

/// Serializes `value` in the requested format, newline terminated.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn serialize<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    let mut text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn sample() -> BTreeMap<&'static str, Vec<&'static str>> {
        BTreeMap::from([("links", vec!["db"])])
    }

    #[test]
    fn json_is_pretty_and_terminated() {
        let text = serialize(&sample(), OutputFormat::Json).expect("json");
        assert_eq!(text, "{\n  \"links\": [\n    \"db\"\n  ]\n}\n");
    }

    #[test]
    fn yaml_is_terminated() {
        let text = serialize(&sample(), OutputFormat::Yaml).expect("yaml");
        assert_eq!(text, "links:\n- db\n");
    }
}
