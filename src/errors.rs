use thiserror::Error;

// Everything that can go wrong around the annotator. The annotation walk
// itself never fails; these come from configuration and input loading.
#[derive(Debug, Error)]
pub enum PluginError {
    // The `match` option is not a valid glob
    #[error("invalid match pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    // Options or a file collection could not be decoded
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    // The file collection itself is not a path-to-entry object
    #[error("file collection must be an object mapping paths to entries, found {found}")]
    InvalidCollection { found: &'static str },

    // A file collection entry that is not an object
    #[error("file entry `{path}` must be an object, found {found}")]
    InvalidEntry { path: String, found: &'static str },

    // A middleware returned without calling its completion callback
    #[error("middleware `{0}` returned without signalling completion")]
    Incomplete(&'static str),
}

pub type Result<T> = std::result::Result<T, PluginError>;
