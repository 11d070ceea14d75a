//! Error types for configuration resolution

use crate::project::ValidationError;
use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// Result type used across the ciplan crates
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of project entity a lookup was asked to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A build variant
    BuildVariant,
    /// A canonical project task
    Task,
    /// A task group
    TaskGroup,
    /// An external module
    Module,
    /// A task reference inside a build variant
    VariantTask,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildVariant => write!(f, "build variant"),
            Self::Task => write!(f, "task"),
            Self::TaskGroup => write!(f, "task group"),
            Self::Module => write!(f, "module"),
            Self::VariantTask => write!(f, "build variant task"),
        }
    }
}

/// Main error type for ciplan operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A required entity does not exist in the project
    #[error("Could not find {kind} '{name}'")]
    #[diagnostic(code(ciplan::not_found))]
    NotFound {
        /// What kind of entity was requested
        kind: EntityKind,
        /// The name that failed to resolve
        name: String,
    },

    /// An alias pattern failed to compile
    #[error("Error compiling regex: {pattern}")]
    #[diagnostic(
        code(ciplan::alias::invalid_pattern),
        help("alias patterns use Rust regex syntax and are matched against the whole name")
    )]
    InvalidPattern {
        /// The offending pattern as stored in the alias
        pattern: String,
        /// The underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Context objects needed for a lookup are missing or incomplete
    #[error("Inconsistent context: {message}")]
    #[diagnostic(code(ciplan::context::inconsistent))]
    InconsistentContext {
        /// Which piece of context was missing
        message: String,
    },

    /// A configuration document or resolver setting could not be used
    #[error("Configuration error: {message}")]
    #[diagnostic(code(ciplan::config::invalid))]
    Configuration {
        /// The error message describing the configuration issue
        message: String,
    },

    /// The project failed structural validation
    #[error("Project validation failed with {} problem(s): {}", .problems.len(), join_problems(.problems))]
    #[diagnostic(code(ciplan::project::invalid))]
    Validation {
        /// Every problem found by the validator
        problems: Vec<ValidationError>,
    },

    /// The alias store could not answer a lookup
    #[error("Alias store error: {message}")]
    #[diagnostic(code(ciplan::alias::store))]
    AliasStore {
        /// The error message reported by the store
        message: String,
    },

    /// Two distinct task/variant pairs produced the same task ID
    #[error("Task ID '{id}' is generated for both {first} and {second}")]
    #[diagnostic(
        code(ciplan::task_id::duplicate),
        help("variant and task names that differ only in '-', ' ' or '_' placement render to the same ID")
    )]
    DuplicateTaskId {
        /// The colliding ID
        id: String,
        /// The pair that claimed the ID first, as `variant/task`
        first: String,
        /// The pair that produced it again, as `variant/task`
        second: String,
    },

    /// A unit of work panicked and was recovered at the batch boundary
    #[error("Panicked while processing {unit}: {message}")]
    #[diagnostic(code(ciplan::batch::panicked))]
    Panicked {
        /// Description of the unit that panicked
        unit: String,
        /// The panic payload, when it was a string
        message: String,
    },

    /// Several independent units failed
    #[error("{} errors occurred", .errors.len())]
    #[diagnostic(code(ciplan::multiple))]
    Multiple {
        /// The individual failures, in the order they occurred
        #[related]
        errors: Vec<Error>,
    },
}

fn join_problems(problems: &[ValidationError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a not-found error for the given entity
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create an inconsistent context error
    pub fn inconsistent_context(message: impl Into<String>) -> Self {
        Self::InconsistentContext {
            message: message.into(),
        }
    }

    /// Create a configuration error with a message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an alias store error
    pub fn alias_store(message: impl Into<String>) -> Self {
        Self::AliasStore {
            message: message.into(),
        }
    }

    /// Create a duplicate task ID error
    pub fn duplicate_task_id(
        id: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::DuplicateTaskId {
            id: id.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create a recovered-panic error
    pub fn panicked(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Panicked {
            unit: unit.into(),
            message: message.into(),
        }
    }

    /// Collapse accumulated errors.
    ///
    /// Returns `Ok(())` for an empty list, the error itself for a single
    /// failure and [`Error::Multiple`] otherwise.
    pub fn from_accumulated(mut errors: Vec<Error>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Multiple { errors }),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::configuration(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::configuration(err.to_string())
    }
}
