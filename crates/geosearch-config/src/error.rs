//! Error types for geosearch configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or persisting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A configuration document could not be parsed as JSON.
    #[error("failed to parse {context}: {source}")]
    Parse {
        /// What was being parsed (a path or a variable description).
        context: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The project variable holds neither JSON nor a usable file path.
    #[error(
        "project variable '{key}' does not contain JSON and is not a valid file path"
    )]
    VariableNotJson {
        /// The variable key.
        key: String,
    },

    /// No save target could be resolved (the user cancelled, or nothing
    /// was configured). Carries the diagnostic bundle shown to the user.
    #[error("the save operation was cancelled; diagnostics:\n{details}")]
    RouteUnresolved {
        /// Resolution steps tried, one per line.
        details: String,
    },

    /// The backup was taken but the write or atomic rename failed; the
    /// backup has been restored.
    #[error("failed to persist {path}: {source}")]
    Persist {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Writing the project variable failed on every host setter.
    #[error("failed to write project variable '{key}'")]
    VariableWrite {
        /// The variable key.
        key: String,
    },

    /// No external file path could be resolved for writing.
    #[error("no geo_search_json path configured and no saved project to derive one from")]
    ExternalPathUnresolved,

    /// Adding the current layer requires an active layer.
    #[error("no active layer")]
    NoActiveLayer,

    /// A tab to edit or delete could not be located in its source.
    #[error("tab '{title}' (group '{group}') not found in {origin}")]
    TabNotFound {
        /// Tab title.
        title: String,
        /// Tab group.
        group: String,
        /// Source token.
        origin: String,
    },
}
