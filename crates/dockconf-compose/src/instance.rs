//! Configuration entries and per-container record building.

use std::collections::HashSet;

use dockconf_common::constants::{CONTAINER_PARAMETERS, TEMPLATE_KEY};
use dockconf_common::error::{DockconfError, Result};
use dockconf_common::types::{OptionRecord, OptionValue};
use indexmap::IndexMap;
use serde::Serialize;

use crate::merge::merge;

/// A named instantiation of a template.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationEntry {
    /// Entry name, which is also the container's identity in the graph.
    pub name: String,
    /// Template to instantiate.
    pub template: String,
    /// Overrides and variable bindings (without the `template` key).
    pub options: OptionRecord,
}

impl ConfigurationEntry {
    /// Builds an entry from its raw declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a mapping or lacks a string
    /// `template` key.
    pub fn from_value(name: &str, value: &OptionValue) -> Result<Self> {
        let mut options = match value {
            OptionValue::Mapping(record) => record.clone(),
            other => {
                return Err(DockconfError::MergeType {
                    context: "configuration entry",
                    name: name.to_owned(),
                    found: other.kind(),
                });
            }
        };

        let template = match options.shift_remove(TEMPLATE_KEY) {
            Some(OptionValue::String(template)) if !template.trim().is_empty() => {
                template.trim().to_owned()
            }
            Some(other) => {
                return Err(DockconfError::Config {
                    message: format!(
                        "configuration entry \"{name}\": {TEMPLATE_KEY} must be a template name, found {}",
                        other.kind()
                    ),
                });
            }
            None => {
                return Err(DockconfError::Config {
                    message: format!(
                        "configuration entry \"{name}\" does not contain a {TEMPLATE_KEY} declaration"
                    ),
                });
            }
        };

        Ok(Self {
            name: name.to_owned(),
            template,
            options,
        })
    }
}

/// All configuration entries of one run, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationTable {
    entries: IndexMap<String, ConfigurationEntry>,
}

impl ConfigurationTable {
    /// Builds the table from the raw `config` mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is malformed.
    pub fn from_record(raw: &OptionRecord) -> Result<Self> {
        let mut entries = IndexMap::with_capacity(raw.len());
        for (name, value) in raw {
            let _ = entries.insert(name.clone(), ConfigurationEntry::from_value(name, value)?);
        }
        Ok(Self { entries })
    }

    /// Looks up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ConfigurationEntry> {
        self.entries.get(name)
    }

    /// Entry names in declaration order.
    #[must_use]
    pub fn declaration_order(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigurationEntry> {
        self.entries.values()
    }
}

/// The merged option record for one named container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedContainer {
    /// Configuration entry name.
    pub name: String,
    /// Template the entry instantiated.
    pub template: String,
    /// Merged options, possibly still holding placeholders.
    pub options: OptionRecord,
    /// Variable bindings available to deferred substitution.
    #[serde(skip)]
    pub variables: OptionRecord,
}

/// Merges configuration entries onto their resolved templates.
#[derive(Debug, Clone, Default)]
pub struct InstanceBuilder {
    parameters: Option<HashSet<String>>,
}

impl InstanceBuilder {
    /// Creates a builder that merges every entry key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder that merges only known container parameters.
    ///
    /// Other entry keys stay available as variables but never become
    /// container options.
    #[must_use]
    pub fn strict() -> Self {
        Self::with_parameters(CONTAINER_PARAMETERS.iter().copied())
    }

    /// Creates a builder restricted to the given parameter names.
    #[must_use]
    pub fn with_parameters<I, S>(parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameters: Some(parameters.into_iter().map(Into::into).collect()),
        }
    }

    /// Builds the container record for `entry` on top of its template.
    ///
    /// Entry keys win over template keys following the merge rules.
    #[must_use]
    pub fn build(&self, entry: &ConfigurationEntry, resolved_template: &OptionRecord) -> ResolvedContainer {
        let overrides: OptionRecord = match &self.parameters {
            Some(allowed) => entry
                .options
                .iter()
                .filter(|(key, _)| allowed.contains(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            None => entry.options.clone(),
        };

        let mut options = merge(resolved_template, &overrides);
        let _ = options.shift_remove(TEMPLATE_KEY);

        ResolvedContainer {
            name: entry.name.clone(),
            template: entry.template.clone(),
            options,
            variables: entry.options.clone(),
        }
    }
}
