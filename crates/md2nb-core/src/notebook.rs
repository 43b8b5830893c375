//! Jupyter notebook types
//!
//! The subset of the nbformat 4 schema needed for markdown-only notebooks.
//! Reference: https://nbformat.readthedocs.io/en/latest/format_description.html
//!
//! Field order of each struct is the key order of the serialized JSON.

use serde::{Deserialize, Serialize};

/// Major notebook format version
pub const NBFORMAT: u32 = 4;

/// Minor notebook format version
pub const NBFORMAT_MINOR: u32 = 4;

/// Root of a notebook document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    pub metadata: NotebookMetadata,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

impl Notebook {
    /// Create an nbformat 4.4 notebook from cells
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: NotebookMetadata::default(),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
        }
    }

    /// Iterate over all source lines of all cells, in order
    pub fn source_lines(&self) -> impl Iterator<Item = &str> {
        self.cells
            .iter()
            .flat_map(|cell| cell.source.iter().map(String::as_str))
    }
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Notebook-level metadata (always empty)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookMetadata {}

/// A notebook cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    pub metadata: CellMetadata,
    /// Lines of the cell, terminators included
    pub source: Vec<String>,
}

impl Cell {
    /// Create a markdown cell
    pub fn markdown(source: Vec<String>) -> Self {
        Self {
            cell_type: CellType::Markdown,
            metadata: CellMetadata::default(),
            source,
        }
    }

    /// Cell text with the lines joined back together
    pub fn text(&self) -> String {
        self.source.concat()
    }
}

/// Cell kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Markdown,
}

/// Cell-level metadata (always empty)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMetadata {}
