//! End-to-end resolution of a composition.
//!
//! Data flows through the engine in one pass:
//!
//! 1. raw templates -> [`TemplateTable`] -> [`TemplateResolver`],
//! 2. raw configuration -> [`ConfigurationTable`] -> [`InstanceBuilder`],
//! 3. the [`Renderer`] fills deferred placeholders,
//! 4. link extraction builds the [`DependencyGraph`],
//! 5. the scheduler fixes the run order.
//!
//! Either the whole composition resolves into a [`Plan`] or the first
//! error aborts the run.

use dockconf_common::config::ComposeConfig;
use dockconf_common::constants::{FACTS_KEY, IMAGE_KEY};
use dockconf_common::error::{DockconfError, Result};
use dockconf_common::types::{OptionRecord, OptionValue};
use serde::{Deserialize, Serialize};

use crate::graph::{DependencyGraph, build_graph};
use crate::instance::{ConfigurationTable, InstanceBuilder, ResolvedContainer};
use crate::links::{LinkExtractor, LinksOption};
use crate::render::{PassthroughRenderer, Renderer};
use crate::scheduler::{self, RunOrderPreference};
use crate::template::{TemplateResolver, TemplateTable};

/// The declarative input of one composition run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Template name -> template body (may contain `based_on`).
    #[serde(default)]
    pub templates: OptionRecord,
    /// Configuration entry name -> entry body (must contain `template`).
    #[serde(default)]
    pub config: OptionRecord,
    /// Optional template priority list.
    #[serde(default)]
    pub run_order: Option<RunOrderPreference>,
}

/// One container in its final, ordered form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedContainer {
    /// Configuration entry name.
    pub name: String,
    /// Template the entry instantiated.
    pub template: String,
    /// Template ancestry, root first.
    pub lineage: Vec<String>,
    /// Final option record for the container runtime.
    pub options: OptionRecord,
}

/// A fully resolved composition.
#[derive(Debug)]
pub struct Plan {
    /// Containers in run order.
    pub containers: Vec<PlannedContainer>,
    /// The link dependency graph the order was derived from.
    pub graph: DependencyGraph,
}

impl Plan {
    /// Container names in run order.
    #[must_use]
    pub fn order(&self) -> Vec<&str> {
        self.containers.iter().map(|c| c.name.as_str()).collect()
    }

    /// Ordered records keyed for the automation engine's fact store.
    #[must_use]
    pub fn facts(&self) -> Facts {
        Facts {
            configurations: self.containers.iter().map(|c| c.options.clone()).collect(),
        }
    }
}

/// The ordered option records handed to the container runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facts {
    /// Final records in run order.
    #[serde(rename = "docker_container_configurations")]
    pub configurations: Vec<OptionRecord>,
}

impl Facts {
    /// Key the records are published under.
    pub const KEY: &'static str = FACTS_KEY;
}

/// Resolves compositions into ordered plans.
pub struct Composer {
    config: ComposeConfig,
    links: Box<dyn LinkExtractor>,
    renderer: Box<dyn Renderer>,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(ComposeConfig::default())
    }
}

impl Composer {
    /// Creates a composer with the `links` option extractor for
    /// `config.links_key` and no variable substitution.
    #[must_use]
    pub fn new(config: ComposeConfig) -> Self {
        let links = Box::new(LinksOption::new(config.links_key.clone()));
        Self {
            config,
            links,
            renderer: Box::new(PassthroughRenderer),
        }
    }

    /// Replaces the link extraction strategy.
    #[must_use]
    pub fn with_link_extractor(mut self, extractor: impl LinkExtractor + 'static) -> Self {
        self.links = Box::new(extractor);
        self
    }

    /// Replaces the variable substitution step.
    #[must_use]
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// The settings this composer runs with.
    #[must_use]
    pub const fn config(&self) -> &ComposeConfig {
        &self.config
    }

    /// Resolves `composition` into containers ordered for processing.
    ///
    /// # Errors
    ///
    /// Returns the first error met while reading, merging, rendering,
    /// linking, or ordering. Nothing is partially returned.
    pub fn plan(&self, composition: &Composition) -> Result<Plan> {
        tracing::info!(
            templates = composition.templates.len(),
            containers = composition.config.len(),
            "resolving composition"
        );

        let templates = TemplateTable::from_record(&composition.templates)?;
        let entries = ConfigurationTable::from_record(&composition.config)?;
        let builder = if self.config.strict_parameters {
            InstanceBuilder::strict()
        } else {
            InstanceBuilder::new()
        };

        let mut resolver = TemplateResolver::new(&templates);
        for template in templates.iter() {
            let _ = resolver.resolve(&template.name, &template.name)?;
        }

        let mut rendered = Vec::with_capacity(entries.len());
        for entry in entries.iter() {
            let template = resolver.resolve(&entry.template, &entry.name)?;
            let resolved = builder.build(entry, template);
            let options = self.renderer.render(&resolved)?;
            if self.config.require_image && !has_image(&options) {
                return Err(DockconfError::MissingImage {
                    container: resolved.name,
                    template: resolved.template,
                });
            }
            rendered.push(ResolvedContainer { options, ..resolved });
        }

        let graph = build_graph(&rendered, self.links.as_ref())?;
        let order = scheduler::order(
            &graph,
            composition.run_order.as_ref(),
            &entries.declaration_order(),
        )?;

        let mut by_name: std::collections::HashMap<String, ResolvedContainer> = rendered
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        let mut containers = Vec::with_capacity(order.len());
        for name in order {
            let Some(container) = by_name.remove(&name) else {
                continue;
            };
            containers.push(PlannedContainer {
                lineage: resolver.lineage(&container.template, &container.name)?,
                name: container.name,
                template: container.template,
                options: container.options,
            });
        }

        tracing::info!(order = ?containers.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), "composition resolved");
        Ok(Plan { containers, graph })
    }
}

fn has_image(options: &OptionRecord) -> bool {
    options.get(IMAGE_KEY).is_some_and(|v| !OptionValue::is_null(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::VariableRenderer;

    fn composition(yaml: &str) -> Composition {
        serde_yaml::from_str(yaml).expect("valid composition")
    }

    #[test]
    fn empty_composition_plans_nothing() {
        let plan = Composer::default().plan(&Composition::default()).expect("plan");
        assert!(plan.containers.is_empty());
        assert!(plan.graph.is_empty());
    }

    #[test]
    fn plan_orders_linked_containers() {
        let input = composition(
            r"
templates:
  base:
    detach: true
  web:
    based_on: base
    image: nginx
  db:
    based_on: base
    image: postgres
config:
  frontend:
    template: web
    links: [database]
  database:
    template: db
",
        );
        let plan = Composer::default().plan(&input).expect("plan");
        assert_eq!(plan.order(), vec!["database", "frontend"]);
        assert_eq!(plan.containers[1].lineage, vec!["base", "web"]);
        assert_eq!(plan.containers[1].options["detach"], OptionValue::Bool(true));
    }

    #[test]
    fn unknown_template_fails_whole_run() {
        let input = composition("config:\n  web:\n    template: ghost\n");
        let err = Composer::default().plan(&input).unwrap_err();
        assert!(matches!(err, DockconfError::UnknownTemplate { .. }), "got: {err}");
    }

    #[test]
    fn missing_image_is_reported_when_required() {
        let input = composition("templates:\n  t: {}\nconfig:\n  web:\n    template: t\n");
        let config = ComposeConfig {
            require_image: true,
            ..ComposeConfig::default()
        };
        let err = Composer::new(config).plan(&input).unwrap_err();
        assert!(matches!(err, DockconfError::MissingImage { .. }), "got: {err}");

        assert!(Composer::default().plan(&input).is_ok());
    }

    #[test]
    fn rendered_links_drive_ordering() {
        let input = composition(
            r"
templates:
  app:
    image: app
    links: ['{{ backend }}']
  store:
    image: redis
config:
  api:
    template: app
    backend: cache
  cache:
    template: store
",
        );
        let plan = Composer::default()
            .with_renderer(VariableRenderer)
            .plan(&input)
            .expect("plan");
        assert_eq!(plan.order(), vec!["cache", "api"]);
    }

    #[test]
    fn custom_link_extractor_is_used() {
        let input = composition(
            "templates:\n  t: {image: x}\nconfig:\n  a:\n    template: t\n    after: b\n  b:\n    template: t\n",
        );
        let after = |options: &OptionRecord| -> Vec<String> {
            options
                .get("after")
                .and_then(OptionValue::as_str)
                .map(str::to_owned)
                .into_iter()
                .collect()
        };
        let plan = Composer::default()
            .with_link_extractor(after)
            .plan(&input)
            .expect("plan");
        assert_eq!(plan.order(), vec!["b", "a"]);
    }

    #[test]
    fn facts_use_automation_key() {
        let input = composition("templates:\n  t: {image: x}\nconfig:\n  a:\n    template: t\n");
        let plan = Composer::default().plan(&input).expect("plan");
        let json = serde_json::to_value(plan.facts()).expect("json");
        assert!(json.get(Facts::KEY).is_some());
    }
}
