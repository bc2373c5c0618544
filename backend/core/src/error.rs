use thiserror::Error;

/// Top-level error type for the extension registry.
#[derive(Debug, Error)]
pub enum ExtError {
    #[error("malformed API version: {0:?}")]
    MalformedVersion(String),

    #[error("extension already registered: {0}")]
    DuplicateExtensionName(String),

    #[error("{namespace} redeclared with a different API version (was: {previous}, attempted: {attempted})")]
    VersionMismatchOnRedeclare {
        namespace: String,
        previous: String,
        attempted: String,
    },

    #[error("callback from extension '{owner}' failed in hook '{hook}': {message}")]
    CallbackRuntime {
        owner: String,
        hook: String,
        message: String,
    },

    #[error("required plugin '{plugin}' for hook '{hook}' is missing or disabled")]
    MissingRequiredPlugin { hook: String, plugin: String },

    #[error("invalid extension: {0}")]
    InvalidExtension(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
