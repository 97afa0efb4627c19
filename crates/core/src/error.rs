//! Error types for registry loading and stub generation.

use thiserror::Error;

/// Everything that can abort a generation run.
///
/// All variants are fatal: the driver stops at the first one it sees.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The text-format registry could not be parsed.
    #[error("registry parse error at {line}:{column}: {message}")]
    RegistryParse {
        /// 1-based line of the offending token.
        line: usize,
        /// 1-based column of the offending token.
        column: usize,
        /// What was expected or found.
        message: String,
    },

    /// The JSON registry could not be deserialized.
    #[error("registry JSON error: {0}")]
    RegistryJson(#[from] serde_json::Error),

    /// A `DT_*` identifier outside the element-type table.
    #[error("unknown data type '{name}'")]
    UnknownDataType {
        /// The identifier as written in the registry.
        name: String,
    },

    /// An attribute kind with no type mapping or binding template.
    #[error("unsupported attribute kind '{kind}' for attribute '{attr}' of operation '{op}'")]
    UnsupportedAttrKind {
        /// Operation declaring the attribute.
        op: String,
        /// Attribute name.
        attr: String,
        /// Declared kind string, e.g. `list(tensor)`.
        kind: String,
    },

    /// A reflected operation name with no registry entry.
    #[error("operation '{name}' not found in registry")]
    UnresolvedOperation {
        /// Reflected name.
        name: String,
    },

    /// A reflected operation name with more than one registry entry.
    #[error("operation '{name}' is defined more than once in registry")]
    DuplicateOperation {
        /// Reflected name.
        name: String,
    },

    /// Two operations normalize to the same exported function name.
    #[error("operations '{first}' and '{second}' both map to function '{function}'")]
    NameCollision {
        /// Normalized function name.
        function: String,
        /// Operation compiled first.
        first: String,
        /// Operation that collided with it.
        second: String,
    },

    /// Compilation of one operation failed.
    #[error("failed to compile operation '{op}': {source}")]
    Compile {
        /// Operation name.
        op: String,
        /// Underlying cause.
        #[source]
        source: Box<GenerateError>,
    },
}

/// Result alias used across the crate.
pub type GenerateResult<T> = Result<T, GenerateError>;
