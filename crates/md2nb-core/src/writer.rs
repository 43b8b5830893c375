//! Notebook JSON writer
//!
//! Renders a notebook as `.ipynb` JSON: two-space indentation, keys in
//! declaration order, non-ASCII text written literally, no trailing newline.

use crate::notebook::Notebook;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::io;
use thiserror::Error;

/// Indentation unit of the written JSON
const INDENT: &[u8] = b"  ";

/// Notebook serialization errors
#[derive(Debug, Error)]
pub enum NotebookError {
    #[error("Failed to encode notebook JSON: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode notebook JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Notebook text is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Write a notebook as JSON to `writer`
pub fn write_notebook<W: io::Write>(notebook: &Notebook, writer: W) -> Result<(), NotebookError> {
    let mut serializer = Serializer::with_formatter(writer, PrettyFormatter::with_indent(INDENT));
    notebook
        .serialize(&mut serializer)
        .map_err(NotebookError::Encode)
}

/// Serialize a notebook to JSON bytes
pub fn serialize(notebook: &Notebook) -> Result<Vec<u8>, NotebookError> {
    let mut buf = Vec::new();
    write_notebook(notebook, &mut buf)?;
    Ok(buf)
}

/// Serialize a notebook to a JSON string
pub fn to_json_string(notebook: &Notebook) -> Result<String, NotebookError> {
    Ok(String::from_utf8(serialize(notebook)?)?)
}

impl Notebook {
    /// Parse a notebook from JSON bytes
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, NotebookError> {
        serde_json::from_slice(bytes).map_err(NotebookError::Decode)
    }
}
