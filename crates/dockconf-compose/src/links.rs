//! Link reference extraction.
//!
//! Which option holds references to other containers depends on the
//! container runtime's schema, so extraction is a strategy: implement
//! [`LinkExtractor`] (or pass a closure) to teach the graph builder a
//! different convention.

use dockconf_common::constants::DEFAULT_LINKS_KEY;
use dockconf_common::types::{OptionRecord, OptionValue};

/// Finds the names of containers an option record links to.
pub trait LinkExtractor {
    /// Returns referenced container names in declaration order.
    fn linked_names(&self, options: &OptionRecord) -> Vec<String>;
}

impl<F> LinkExtractor for F
where
    F: Fn(&OptionRecord) -> Vec<String>,
{
    fn linked_names(&self, options: &OptionRecord) -> Vec<String> {
        self(options)
    }
}

/// Reads links from a single named option.
///
/// The option may hold one string or a list of strings. Each entry may
/// carry an alias (`db:database`); only the part before the first `:` names
/// the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinksOption {
    key: String,
}

impl LinksOption {
    /// Extracts links from the option `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The option this extractor reads.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Default for LinksOption {
    fn default() -> Self {
        Self::new(DEFAULT_LINKS_KEY)
    }
}

impl LinkExtractor for LinksOption {
    fn linked_names(&self, options: &OptionRecord) -> Vec<String> {
        match options.get(&self.key) {
            Some(OptionValue::String(link)) => container_name(link).into_iter().collect(),
            Some(OptionValue::List(items)) => items
                .iter()
                .filter_map(OptionValue::as_str)
                .filter_map(container_name)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn container_name(link: &str) -> Option<String> {
    let name = link.split_once(':').map_or(link, |(name, _alias)| name).trim();
    (!name.is_empty()).then(|| name.to_owned())
}
