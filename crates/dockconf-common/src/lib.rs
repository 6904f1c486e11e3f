//! # dockconf-common
//!
//! Shared option-record model, error definitions, settings, and constants
//! used across the dockconf workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the primitives the resolution engine and the
//! CLI build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
