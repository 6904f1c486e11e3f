//! Deferred variable substitution.
//!
//! Resolved containers still carry `{{ variable }}` placeholders bound to
//! their configuration entry. Filling them is the job of a [`Renderer`],
//! which the [`Composer`](crate::pipeline::Composer) applies after instance
//! building and before link extraction.
//!
//! [`VariableRenderer`] understands a deliberately small placeholder
//! language:
//! - `{{ path.to.var }}` looks up a (dotted) variable,
//! - `| required` or `| required("message")` fails on undefined values,
//! - `| default("value")` substitutes a fallback for undefined values.
//!
//! Besides the entry's own bindings, `CONTAINER_CONFIG_NAME` and `template`
//! name the container and the template it was built from.
//!
//! Undefined variables render as an empty string. Empty strings, nulls, and
//! collections that end up empty are pruned from the rendered record.

use std::sync::OnceLock;

use dockconf_common::constants::{CONTAINER_NAME_VARIABLE, OMIT_PLACEHOLDER_PATTERN, TEMPLATE_KEY};
use dockconf_common::error::{DockconfError, Result};
use dockconf_common::types::{OptionRecord, OptionValue};
use regex::Regex;

use crate::instance::ResolvedContainer;

const PLACEHOLDER_PATTERN: &str = r"\{\{\s*(.*?)\s*\}\}";
const FILTER_PATTERN: &str = r#"^(\w+)\s*(?:\(\s*(?:"([^"]*)"|'([^']*)')?\s*\))?$"#;

static OMIT: OnceLock<std::result::Result<Regex, String>> = OnceLock::new();
static PLACEHOLDER: OnceLock<std::result::Result<Regex, String>> = OnceLock::new();
static FILTER: OnceLock<std::result::Result<Regex, String>> = OnceLock::new();

fn compiled(
    cell: &'static OnceLock<std::result::Result<Regex, String>>,
    pattern: &str,
) -> Result<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|message| DockconfError::Config {
            message: format!("invalid pattern {pattern}: {message}"),
        })
}

/// Removes the automation engine's omit markers from `value`.
///
/// # Errors
///
/// Returns an error only if the marker pattern fails to compile.
pub fn strip_omit_placeholder(value: &str) -> Result<String> {
    Ok(compiled(&OMIT, OMIT_PLACEHOLDER_PATTERN)?
        .replace_all(value, "")
        .into_owned())
}

/// Fills deferred placeholders in a resolved container.
pub trait Renderer {
    /// Produces the final option record for `container`.
    ///
    /// # Errors
    ///
    /// Returns [`DockconfError::Render`] if substitution fails.
    fn render(&self, container: &ResolvedContainer) -> Result<OptionRecord>;
}

/// Hands resolved records through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRenderer;

impl Renderer for PassthroughRenderer {
    fn render(&self, container: &ResolvedContainer) -> Result<OptionRecord> {
        Ok(container.options.clone())
    }
}

/// Substitutes `{{ variable }}` placeholders from the entry's variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableRenderer;

impl Renderer for VariableRenderer {
    fn render(&self, container: &ResolvedContainer) -> Result<OptionRecord> {
        let mut context = container.variables.clone();
        let _ = context.insert(
            CONTAINER_NAME_VARIABLE.to_owned(),
            OptionValue::from(container.name.as_str()),
        );
        let _ = context
            .entry(TEMPLATE_KEY.to_owned())
            .or_insert_with(|| OptionValue::from(container.template.as_str()));

        let mut rendered = OptionRecord::new();
        for (key, value) in &container.options {
            let result = render_value(value, &context).map_err(|message| match message {
                RenderFailure::Message(message) => DockconfError::Render {
                    container: container.name.clone(),
                    message: format!("option \"{key}\": {message}"),
                },
                RenderFailure::Fatal(err) => err,
            })?;
            if let Some(value) = result {
                let _ = rendered.insert(key.clone(), value);
            }
        }
        tracing::debug!(container = %container.name, "rendered container options");
        Ok(rendered)
    }
}

enum RenderFailure {
    Message(String),
    Fatal(DockconfError),
}

impl From<DockconfError> for RenderFailure {
    fn from(err: DockconfError) -> Self {
        Self::Fatal(err)
    }
}

type RenderResult<T> = std::result::Result<T, RenderFailure>;

fn render_value(value: &OptionValue, context: &OptionRecord) -> RenderResult<Option<OptionValue>> {
    match value {
        OptionValue::Mapping(record) => {
            let mut out = OptionRecord::new();
            for (key, item) in record {
                if let Some(item) = render_value(item, context)? {
                    let _ = out.insert(key.clone(), item);
                }
            }
            Ok((!out.is_empty()).then_some(OptionValue::Mapping(out)))
        }
        OptionValue::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(item) = render_value(item, context)? {
                    out.push(item);
                }
            }
            Ok((!out.is_empty()).then_some(OptionValue::List(out)))
        }
        OptionValue::String(raw) => render_string(raw, context),
        OptionValue::Null => Ok(None),
        scalar => Ok(Some(scalar.clone())),
    }
}

fn render_string(raw: &str, context: &OptionRecord) -> RenderResult<Option<OptionValue>> {
    let text = strip_omit_placeholder(raw)?;
    let placeholder = compiled(&PLACEHOLDER, PLACEHOLDER_PATTERN)?;

    let captures: Vec<regex::Captures<'_>> = placeholder.captures_iter(&text).collect();
    if let [only] = captures.as_slice() {
        let whole = only.get(0).is_some_and(|m| m.start() == 0 && m.end() == text.len());
        if whole {
            let expr = only.get(1).map_or("", |m| m.as_str());
            return Ok(evaluate(expr, context)?.filter(|value| !is_empty_value(value)));
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for capture in &captures {
        let (Some(whole), Some(expr)) = (capture.get(0), capture.get(1)) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        if let Some(value) = evaluate(expr.as_str(), context)? {
            out.push_str(&value.to_string());
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);

    Ok((!out.is_empty()).then_some(OptionValue::String(out)))
}

fn is_empty_value(value: &OptionValue) -> bool {
    match value {
        OptionValue::Null => true,
        OptionValue::String(s) => s.is_empty(),
        OptionValue::List(items) => items.is_empty(),
        OptionValue::Mapping(record) => record.is_empty(),
        _ => false,
    }
}

fn evaluate(expr: &str, context: &OptionRecord) -> RenderResult<Option<OptionValue>> {
    let mut parts = split_filters(expr).into_iter();
    let path = parts.next().unwrap_or_default();
    let mut value = lookup(context, path.trim()).cloned();

    let filter = compiled(&FILTER, FILTER_PATTERN)?;
    for raw in parts {
        let raw = raw.trim();
        let captures = filter.captures(raw).ok_or_else(|| {
            RenderFailure::Message(format!("malformed filter \"{raw}\" in \"{expr}\""))
        })?;
        let name = captures.get(1).map_or("", |m| m.as_str());
        let argument = captures
            .get(2)
            .or_else(|| captures.get(3))
            .map(|m| m.as_str().to_owned());

        value = match (name, value) {
            ("required", None) => {
                return Err(RenderFailure::Message(argument.unwrap_or_else(|| {
                    format!("variable \"{}\" is required", path.trim())
                })));
            }
            ("default", None) => argument.map(OptionValue::String),
            ("required" | "default", defined) => defined,
            (other, _) => {
                return Err(RenderFailure::Message(format!("unknown filter \"{other}\"")));
            }
        };
    }
    Ok(value)
}

fn lookup<'a>(context: &'a OptionRecord, path: &str) -> Option<&'a OptionValue> {
    let mut segments = path.split('.');
    let mut current = context.get(segments.next()?)?;
    for segment in segments {
        current = current.as_mapping()?.get(segment)?;
    }
    (!current.is_null()).then_some(current)
}

/// Splits `expr` on `|` outside of quoted filter arguments.
fn split_filters(expr: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, ch) in expr.char_indices() {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(q), c) if c == q => quote = None,
            (None, '|') => {
                parts.push(&expr[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(options: &str, variables: &str) -> ResolvedContainer {
        ResolvedContainer {
            name: "web".into(),
            template: "nginx".into(),
            options: serde_yaml::from_str(options).expect("options"),
            variables: serde_yaml::from_str(variables).expect("variables"),
        }
    }

    fn record(yaml: &str) -> OptionRecord {
        serde_yaml::from_str(yaml).expect("valid yaml record")
    }

    #[test]
    fn passthrough_returns_options_unchanged() {
        let c = container("image: '{{ tag }}'", "tag: v1");
        let rendered = PassthroughRenderer.render(&c).expect("render");
        assert_eq!(rendered, c.options);
    }

    #[test]
    fn substitutes_variables_inside_strings() {
        let c = container("image: 'nginx:{{ tag }}'\nname: '{{ CONTAINER_CONFIG_NAME }}'", "tag: '1.25'");
        let rendered = VariableRenderer.render(&c).expect("render");
        assert_eq!(rendered, record("image: 'nginx:1.25'\nname: web"));
    }

    #[test]
    fn whole_placeholder_keeps_variable_type() {
        let c = container("detach: '{{ detach }}'\nports: '{{ ports }}'", "detach: false\nports: [80, 443]");
        let rendered = VariableRenderer.render(&c).expect("render");
        assert_eq!(rendered["detach"], OptionValue::Bool(false));
        assert_eq!(
            rendered["ports"],
            OptionValue::List(vec![OptionValue::Integer(80), OptionValue::Integer(443)])
        );
    }

    #[test]
    fn whole_placeholder_prunes_empty_collections() {
        let c = container(
            "image: nginx\npublished_ports: '{{ p }}'\nlabels: '{{ l }}'",
            "p: []\nl: {}",
        );
        let rendered = VariableRenderer.render(&c).expect("render");
        assert_eq!(rendered, record("image: nginx"));
    }

    #[test]
    fn template_name_is_a_variable() {
        let c = container("labels:\n  origin: 'from-{{ template }}'", "{}");
        let rendered = VariableRenderer.render(&c).expect("render");
        assert_eq!(rendered, record("labels:\n  origin: from-nginx"));
    }

    #[test]
    fn dotted_paths_walk_mappings() {
        let c = container("env:\n  DB_HOST: '{{ db.host }}'", "db:\n  host: postgres");
        let rendered = VariableRenderer.render(&c).expect("render");
        assert_eq!(rendered, record("env:\n  DB_HOST: postgres"));
    }

    #[test]
    fn undefined_values_are_pruned() {
        let c = container(
            "image: nginx\nhostname: '{{ missing }}'\nenv: ['{{ missing }}']\nlabels: {a: '{{ missing }}'}\nuser: ~",
            "{}",
        );
        let rendered = VariableRenderer.render(&c).expect("render");
        assert_eq!(rendered, record("image: nginx"));
    }

    #[test]
    fn required_filter_fails_with_custom_message() {
        let c = container("image: \"{{ tag | required('tag must be set') }}\"", "{}");
        let err = VariableRenderer.render(&c).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("tag must be set"), "got: {msg}");
        assert!(msg.contains("\"web\""), "got: {msg}");
    }

    #[test]
    fn required_filter_passes_defined_values() {
        let c = container("image: '{{ tag | required }}'", "tag: alpine");
        let rendered = VariableRenderer.render(&c).expect("render");
        assert_eq!(rendered["image"], OptionValue::from("alpine"));
    }

    #[test]
    fn default_filter_fills_undefined_values() {
        let c = container("restart: \"{{ policy | default('a|b') }}\"", "{}");
        let rendered = VariableRenderer.render(&c).expect("render");
        assert_eq!(rendered["restart"], OptionValue::from("a|b"));
    }

    #[test]
    fn unknown_filter_is_an_error() {
        let c = container("image: '{{ tag | upper }}'", "tag: x");
        let err = VariableRenderer.render(&c).unwrap_err();
        assert!(err.to_string().contains("unknown filter"), "got: {err}");
    }

    #[test]
    fn omit_placeholders_are_removed() {
        let marker = format!("__omit_place_holder__{}", "0123456789".repeat(4));
        assert_eq!(strip_omit_placeholder(&format!("a{marker}b")).expect("strip"), "ab");

        let c = container(&format!("hostname: '{marker}'\nimage: nginx"), "{}");
        let rendered = VariableRenderer.render(&c).expect("render");
        assert_eq!(rendered, record("image: nginx"));
    }

    #[test]
    fn split_respects_quotes() {
        assert_eq!(
            split_filters(r#"a | default("x|y") | required"#),
            vec!["a ", r#" default("x|y") "#, " required"]
        );
    }
}
