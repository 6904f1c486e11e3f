//! Unified error type for the dockconf workspace.
//!
//! Every failure aborts the whole resolution run. Variants carry the
//! offending names so an operator can fix the declarative input.

use std::fmt;

use thiserror::Error;

/// Which relation a detected cycle was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleKind {
    /// A `based_on` chain between templates.
    Inheritance,
    /// Link dependencies between containers.
    Link,
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inheritance => write!(f, "template inheritance"),
            Self::Link => write!(f, "container link"),
        }
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DockconfError {
    /// A `template` or `based_on` reference names an absent template.
    #[error("unknown template \"{name}\" referenced by \"{referenced_by}\"")]
    UnknownTemplate {
        /// Name of the missing template.
        name: String,
        /// Template or configuration entry holding the reference.
        referenced_by: String,
    },

    /// A cycle prevents inheritance resolution or run ordering.
    #[error("cyclic {kind} detected: {}", .nodes.join(" -> "))]
    Cycle {
        /// Relation the cycle was found in.
        kind: CycleKind,
        /// Names participating in the cycle.
        nodes: Vec<String>,
    },

    /// A container links to a name that is not part of this composition.
    #[error("container \"{container}\" links to \"{link}\", which is not defined in the configuration")]
    DanglingLink {
        /// Container holding the link.
        container: String,
        /// Unresolvable link target.
        link: String,
    },

    /// A record has a structural shape the merger cannot classify.
    #[error("{context} \"{name}\" must be a mapping, found {found}")]
    MergeType {
        /// What kind of record was being read (template, configuration).
        context: &'static str,
        /// Name of the offending record.
        name: String,
        /// Shape that was found instead.
        found: &'static str,
    },

    /// A rendered container has no image to run.
    #[error("invalid container configuration \"{container}\": template \"{template}\" does not provide an image")]
    MissingImage {
        /// Configuration entry name.
        container: String,
        /// Template the entry was built from.
        template: String,
    },

    /// Variable substitution failed for a container.
    #[error("error while rendering \"{container}\": {message}")]
    Render {
        /// Configuration entry name.
        container: String,
        /// Description of the rendering failure.
        message: String,
    },

    /// The declarative input is malformed.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DockconfError>;
