//! # dockconf-compose
//!
//! Resolution engine for declarative container compositions.
//!
//! Handles:
//! - **Merge**: Option record merging with list accumulation.
//! - **Template**: `based_on` inheritance resolution with cycle detection.
//! - **Instance**: Building per-container records from configuration entries.
//! - **Links**: Pluggable extraction of inter-container link references.
//! - **Graph**: Dependency graph construction from resolved links.
//! - **Scheduler**: Deterministic, preference-aware topological ordering.
//! - **Render**: The deferred variable substitution seam.
//! - **Pipeline**: The [`Composer`](pipeline::Composer) tying it together.

pub mod graph;
pub mod instance;
pub mod links;
pub mod merge;
pub mod pipeline;
pub mod render;
pub mod scheduler;
pub mod template;

pub use pipeline::{Composer, Composition, Plan};
