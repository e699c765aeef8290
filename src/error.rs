//! Engine Error Types
//!
//! All failures surfaced by the assessment engine carry enough identifying
//! detail (offending id, expected vs. actual value) to render a precise
//! operator-facing message. How they surface to an operator is a
//! presentation-layer concern.
//!
//! # Error Policy
//!
//! Structural problems are detected eagerly at load/build time
//! ([`Error::Schema`]), so downstream pure computations assume a valid,
//! closed-world input. They may still fail [`Error::NotFound`] when handed
//! an id foreign to the store. A failed mutation leaves prior state
//! unchanged; nothing is silently swallowed.

use std::fmt;

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Entity kinds referenced by [`Error::NotFound`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A control family
    Family,
    /// A control requirement
    Control,
    /// An assessment objective
    Objective,
    /// A crosswalk entry
    CrosswalkEntry,
    /// A responsibility provider template
    Template,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Family => write!(f, "family"),
            Self::Control => write!(f, "control"),
            Self::Objective => write!(f, "objective"),
            Self::CrosswalkEntry => write!(f, "crosswalk entry"),
            Self::Template => write!(f, "template"),
        }
    }
}

/// Engine error type
#[derive(Debug, Error)]
pub enum Error {
    /// An id was referenced that the store does not contain
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of entity looked up
        entity: Entity,
        /// The offending id
        id: String,
    },

    /// A malformed input value was rejected at the boundary
    #[error("invalid {field} '{actual}': expected {expected}")]
    Validation {
        /// Name of the rejected field
        field: &'static str,
        /// The value that was supplied
        actual: String,
        /// Description of what would have been accepted
        expected: &'static str,
    },

    /// A structural invariant was violated in taxonomy or crosswalk input
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    /// Report assembly was attempted without a required collaborator input
    #[error("report assembly missing required input: {0}")]
    MissingInput(&'static str),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] with an owned id
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Coarse error category, for presentation layers that map errors
    /// to user-visible channels without matching every variant
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Schema(_) => ErrorKind::Schema,
            Self::MissingInput(_) => ErrorKind::MissingInput,
        }
    }
}

/// Coarse error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown id referenced
    NotFound,
    /// Malformed input value
    Validation,
    /// Structural invariant violation, detected at load/build time
    Schema,
    /// Report assembly missing a required input
    MissingInput,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation_error"),
            Self::Schema => write!(f, "schema_error"),
            Self::MissingInput => write!(f, "missing_input"),
        }
    }
}

/// Structural invariant violations in taxonomy or crosswalk input
///
/// Detected at `load`/`build` time, never at use time.
#[derive(Debug, Error)]
pub enum SchemaViolation {
    /// Two entities of the same kind share an id
    #[error("duplicate {entity} id '{id}'")]
    DuplicateId {
        /// Kind of entity duplicated
        entity: Entity,
        /// The duplicated id
        id: String,
    },

    /// A control was loaded with no assessment objectives
    #[error("control '{id}' has no assessment objectives")]
    EmptyControl {
        /// The offending control id
        id: String,
    },

    /// Source controls with no crosswalk entry
    #[error("crosswalk leaves source controls unmapped: {}", ids.join(", "))]
    UnmappedControls {
        /// Every source control id without an entry
        ids: Vec<String>,
    },

    /// A source control matched by more than one crosswalk entry
    #[error("source control '{id}' matched by {count} crosswalk entries, expected exactly one")]
    DuplicateMapping {
        /// The multiply-mapped source control id
        id: String,
        /// How many entries claimed it
        count: usize,
    },

    /// A crosswalk entry whose from/to shape does not fit its change type
    #[error("crosswalk entry '{label}' is malformed: {reason}")]
    MalformedEntry {
        /// Best-effort identifier for the entry (from id, to id, or change type)
        label: String,
        /// What was wrong with it
        reason: String,
    },
}
