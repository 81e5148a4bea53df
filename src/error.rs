//! Error types for toolkip.
//!
//! Construction-time problems (bad element types, malformed bindings) are
//! returned to whoever builds the view. Runtime delivery problems are returned
//! by update functions and isolated by the selector fan-out, which logs them.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or updating views.
#[derive(Error, Debug)]
pub enum Error {
    /// A definition named an element type that is not a usable tag name.
    #[error("invalid element type: {0:?}")]
    InvalidType(String),

    /// A binding declaration names no key, value function, update function or
    /// child source.
    #[error("malformed binding on element {0}")]
    MalformedBinding(String),

    /// A selector projection could not produce a value.
    #[error("projection failed: {0}")]
    Projection(String),

    /// A bound update function rejected a value.
    #[error("update of {key} failed: {reason}")]
    Update {
        /// Binding key the update was delivered for.
        key: String,
        /// What went wrong.
        reason: String,
    },

    /// A node id does not refer to a live node in the document.
    #[error("node {0} is not allocated")]
    UnknownNode(usize),

    /// Appending would make a node its own ancestor.
    #[error("node {child} cannot be appended under its descendant {parent}")]
    HierarchyCycle {
        /// Node that would have become the parent.
        parent: usize,
        /// Node that was being appended.
        child: usize,
    },

    /// The view was erased and can no longer be drawn.
    #[error("view has been erased")]
    Erased,

    /// An identifiable view was asked for an id its lookup does not know.
    #[error("no model registered for id {0:?}")]
    UnknownModelId(String),

    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading a configuration file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

impl Error {
    /// Build an [`Error::Update`] from any displayable reason.
    pub fn update(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Update {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}
