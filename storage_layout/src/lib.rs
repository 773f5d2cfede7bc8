//! Solidity storage layout from a compact-AST JSON dump.
//!
//! `ast` mirrors the handful of solc AST nodes that matter for state
//! variables, `types` sizes elementary types and `layout` assigns slots the
//! way solc does.

pub mod ast;
pub mod layout;
pub mod types;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid AST json")]
    Json(#[from] serde_json::Error),
    #[error("unknown solidity type `{0}`")]
    UnknownType(String),
    #[error("unsupported type for `{0}` (only elementary types, mappings and arrays are laid out)")]
    UnsupportedType(String),
    #[error("storage for `{0}` runs past the last addressable slot")]
    SlotOverflow(String),
    #[error("no contract named `{0}` in source unit")]
    ContractNotFound(String),
}
