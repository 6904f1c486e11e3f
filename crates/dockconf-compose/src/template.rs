//! Template table and `based_on` inheritance resolution.
//!
//! Templates reference their parents by name through the `based_on` key.
//! Resolution flattens the inheritance chain into one record using the
//! option merger, caching every template it resolves for the rest of the
//! run.

use std::collections::HashMap;

use dockconf_common::constants::BASED_ON_KEY;
use dockconf_common::error::{CycleKind, DockconfError, Result};
use dockconf_common::types::{OptionRecord, OptionValue};
use indexmap::IndexMap;

use crate::merge::merge;
use crate::render::strip_omit_placeholder;

/// A named option record with optional parent references.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Template name.
    pub name: String,
    /// Parent templates, highest priority first.
    pub based_on: Vec<String>,
    /// Options declared directly on this template (without `based_on`).
    pub options: OptionRecord,
}

impl Template {
    /// Builds a template from its raw declaration.
    ///
    /// A `null` body is an empty template. `based_on` may be a name, a
    /// list of names, `null`, or an empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a mapping or `based_on` holds
    /// something other than names.
    pub fn from_value(name: &str, value: &OptionValue) -> Result<Self> {
        let mut options = match value {
            OptionValue::Mapping(record) => record.clone(),
            OptionValue::Null => OptionRecord::new(),
            other => {
                return Err(DockconfError::MergeType {
                    context: "template",
                    name: name.to_owned(),
                    found: other.kind(),
                });
            }
        };

        let based_on = match options.shift_remove(BASED_ON_KEY) {
            None | Some(OptionValue::Null) => Vec::new(),
            Some(OptionValue::String(parent)) => parent_names(name, std::slice::from_ref(&parent))?,
            Some(OptionValue::List(items)) => {
                let mut parents = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        OptionValue::String(parent) => parents.push(parent),
                        other => return Err(invalid_parent(name, other.kind())),
                    }
                }
                parent_names(name, &parents)?
            }
            Some(other) => return Err(invalid_parent(name, other.kind())),
        };

        Ok(Self {
            name: name.to_owned(),
            based_on,
            options,
        })
    }
}

fn parent_names(template: &str, raw: &[String]) -> Result<Vec<String>> {
    let mut parents = Vec::with_capacity(raw.len());
    for parent in raw {
        let parent = strip_omit_placeholder(parent)?;
        let parent = parent.trim();
        if parent.is_empty() {
            continue;
        }
        if parent == template {
            return Err(DockconfError::Cycle {
                kind: CycleKind::Inheritance,
                nodes: vec![template.to_owned(), template.to_owned()],
            });
        }
        parents.push(parent.to_owned());
    }
    Ok(parents)
}

fn invalid_parent(template: &str, found: &str) -> DockconfError {
    DockconfError::Config {
        message: format!(
            "template \"{template}\": {BASED_ON_KEY} must be a template name or a list of names, found {found}"
        ),
    }
}

/// All templates of one composition run, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TemplateTable {
    templates: IndexMap<String, Template>,
}

impl TemplateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from the raw `templates` mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if any template declaration is malformed.
    pub fn from_record(raw: &OptionRecord) -> Result<Self> {
        let mut table = Self::new();
        for (name, value) in raw {
            table.insert(Template::from_value(name, value)?);
        }
        Ok(table)
    }

    /// Adds or replaces a template.
    pub fn insert(&mut self, template: Template) {
        let _ = self.templates.insert(template.name.clone(), template);
    }

    /// Looks up a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Returns `true` if a template with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Number of templates in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` if the table holds no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterates templates in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }
}

/// Flattens templates against a [`TemplateTable`], memoizing results.
///
/// A resolver lives for one composition run; create a new one per run.
#[derive(Debug)]
pub struct TemplateResolver<'a> {
    table: &'a TemplateTable,
    cache: HashMap<String, OptionRecord>,
}

impl<'a> TemplateResolver<'a> {
    /// Creates a resolver over `table` with an empty cache.
    #[must_use]
    pub fn new(table: &'a TemplateTable) -> Self {
        Self {
            table,
            cache: HashMap::new(),
        }
    }

    /// Returns the fully merged record for template `name`.
    ///
    /// `referenced_by` names whoever asked for the template and only
    /// appears in the error when the template does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DockconfError::UnknownTemplate`] for a missing template
    /// or parent and [`DockconfError::Cycle`] if `based_on` loops.
    pub fn resolve(&mut self, name: &str, referenced_by: &str) -> Result<&OptionRecord> {
        if !self.cache.contains_key(name) {
            let mut chain = Vec::new();
            let _ = self.resolve_in_chain(name, referenced_by, &mut chain)?;
        }
        self.cache
            .get(name)
            .ok_or_else(|| DockconfError::UnknownTemplate {
                name: name.to_owned(),
                referenced_by: referenced_by.to_owned(),
            })
    }

    fn resolve_in_chain(
        &mut self,
        name: &str,
        referenced_by: &str,
        chain: &mut Vec<String>,
    ) -> Result<OptionRecord> {
        if let Some(resolved) = self.cache.get(name) {
            return Ok(resolved.clone());
        }
        if let Some(pos) = chain.iter().position(|n| n == name) {
            let mut nodes = chain[pos..].to_vec();
            nodes.push(name.to_owned());
            return Err(DockconfError::Cycle {
                kind: CycleKind::Inheritance,
                nodes,
            });
        }

        let table = self.table;
        let template = table
            .get(name)
            .ok_or_else(|| DockconfError::UnknownTemplate {
                name: name.to_owned(),
                referenced_by: referenced_by.to_owned(),
            })?;

        chain.push(name.to_owned());
        let mut resolved = template.options.clone();
        for parent in &template.based_on {
            let parent_record = self.resolve_in_chain(parent, name, chain)?;
            resolved = merge(&parent_record, &resolved);
        }
        let _ = chain.pop();

        tracing::debug!(template = name, parents = ?template.based_on, "resolved template");
        let _ = self.cache.insert(name.to_owned(), resolved.clone());
        Ok(resolved)
    }

    /// Returns the linearized ancestor chain of `name`, root first.
    ///
    /// The order matches the merge order: each entry is overridden by the
    /// entries after it. Shared ancestors appear once per path.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TemplateResolver::resolve`].
    pub fn lineage(&self, name: &str, referenced_by: &str) -> Result<Vec<String>> {
        let mut lineage = Vec::new();
        let mut chain = Vec::new();
        self.collect_lineage(name, referenced_by, &mut chain, &mut lineage)?;
        Ok(lineage)
    }

    fn collect_lineage(
        &self,
        name: &str,
        referenced_by: &str,
        chain: &mut Vec<String>,
        lineage: &mut Vec<String>,
    ) -> Result<()> {
        if let Some(pos) = chain.iter().position(|n| n == name) {
            let mut nodes = chain[pos..].to_vec();
            nodes.push(name.to_owned());
            return Err(DockconfError::Cycle {
                kind: CycleKind::Inheritance,
                nodes,
            });
        }
        let template = self
            .table
            .get(name)
            .ok_or_else(|| DockconfError::UnknownTemplate {
                name: name.to_owned(),
                referenced_by: referenced_by.to_owned(),
            })?;

        chain.push(name.to_owned());
        for parent in template.based_on.iter().rev() {
            self.collect_lineage(parent, name, chain, lineage)?;
        }
        let _ = chain.pop();
        lineage.push(name.to_owned());
        Ok(())
    }
}
