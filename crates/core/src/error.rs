use std::io;

use crate::symbols::SymbolId;

/// Errors that can occur while compiling command declarations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported symbol type for {element}: {kind}")]
    UnsupportedElement { element: SymbolId, kind: String },

    #[error("Unsupported arg spec type for {element}: {category}")]
    UnsupportedArgSpec { element: SymbolId, category: String },

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(SymbolId),

    #[error("No method {name}({params}) declared on {owner}")]
    MethodNotFound {
        owner: SymbolId,
        name: String,
        params: String,
    },

    #[error("Cannot bind method-rooted command {element}: {source}")]
    UnresolvableMethod {
        element: SymbolId,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("Invalid type path `{0}`")]
    InvalidTypePath(String),

    #[error("Could not generate code for {element}: {source}")]
    ArtifactWrite {
        element: SymbolId,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Replay error: {0}")]
    ReplayError(String),
}

/// Result type alias for specgen operations
pub type Result<T> = std::result::Result<T, Error>;
