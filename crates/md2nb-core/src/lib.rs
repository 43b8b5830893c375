//! md2nb-core: Core library for converting Markdown to Jupyter notebooks
//!
//! This crate provides:
//! - Line splitting that keeps each line's terminator
//! - Segmentation of lines into cells at top-level headings (`# `)
//! - Typed nbformat 4 notebook records
//! - JSON serialization of notebooks
//!
//! ## Example
//!
//! ```rust
//! use md2nb_core::{convert, serialize};
//!
//! let notebook = convert("# Intro\nHello\n# Usage\nRun it\n");
//! assert_eq!(notebook.cells.len(), 2);
//! assert_eq!(notebook.cells[1].source, vec!["# Usage\n", "Run it\n"]);
//!
//! let bytes = serialize(&notebook).unwrap();
//! assert!(bytes.starts_with(b"{\n  \"cells\": ["));
//! ```

pub mod lines;
pub mod notebook;
pub mod segment;
pub mod writer;

pub use lines::{Lines, split_lines};
pub use notebook::{
    Cell, CellMetadata, CellType, NBFORMAT, NBFORMAT_MINOR, Notebook, NotebookMetadata,
};
pub use segment::{HEADING_MARKER, Segmenter, is_heading_boundary, segment};
pub use writer::{NotebookError, serialize, to_json_string, write_notebook};

/// Convert Markdown text to a notebook
///
/// Every line of `text` lands, unchanged and in order, in exactly one
/// markdown cell. A new cell starts at each line beginning with `# `.
pub fn convert(text: &str) -> Notebook {
    Notebook::new(segment(Lines::new(text)))
}

/// Convert Markdown text straight to serialized notebook bytes
pub fn markdown_to_ipynb(text: &str) -> Result<Vec<u8>, NotebookError> {
    serialize(&convert(text))
}
