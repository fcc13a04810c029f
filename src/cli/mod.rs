//! CLI support for logsql-builder
//!
//! Each subcommand of the `logsql` binary is an options struct plus an
//! `execute_*` function returning the text to print, so the commands can be
//! driven from tests and other tools without spawning a process.

mod catalog;
mod fmt;
mod parse;
mod render;
mod tokens;
mod tree;

pub use catalog::{CatalogOptions, execute_catalog};
pub use fmt::{FmtOptions, execute_fmt};
pub use parse::{QueryOptions, execute_parse};
pub use render::{RenderInput, RenderOptions, execute_render};
pub use tokens::{TokensOptions, execute_tokens};
pub use tree::{TreeOptions, execute_tree};

use std::io;

use serde::Serialize;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Library error
    Library(crate::Error),
    /// JSON parsing or encoding error
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
    /// No query or input provided
    NoInput,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Library(e) => write!(f, "Error: {}", e),
            CliError::Json(e) => write!(f, "Invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => write!(f, "No input provided. Pass a query or pipe it to stdin."),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::NoInput => None,
        }
    }
}

impl From<crate::Error> for CliError {
    fn from(e: crate::Error) -> Self {
        CliError::Library(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    Ok(json)
}

fn require_query(query: &str) -> Result<&str, CliError> {
    if query.trim().is_empty() {
        Err(CliError::NoInput)
    } else {
        Ok(query)
    }
}
