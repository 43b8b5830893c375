//! Segmentation of lines into notebook cells
//!
//! A new cell starts at every top-level heading line. Lines are never
//! dropped, duplicated or reordered, and no cell is ever empty.

use crate::lines::strip_terminator;
use crate::notebook::Cell;

/// Prefix that marks a top-level heading line
pub const HEADING_MARKER: &str = "# ";

/// Check whether a line starts a new cell
///
/// Only an exact prefix match counts: `## `, ` # ` and `#title` do not.
pub fn is_heading_boundary(line: &str) -> bool {
    strip_terminator(line).starts_with(HEADING_MARKER)
}

/// Group lines into markdown cells
pub fn segment<'a, I>(lines: I) -> Vec<Cell>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut segmenter = Segmenter::new();
    for line in lines {
        segmenter.push(line);
    }
    segmenter.finish()
}

/// Segmenter state
///
/// Accumulates lines for the current cell and closes it when the next
/// heading line arrives.
#[derive(Debug, Default)]
pub struct Segmenter {
    /// Lines of the cell being built
    current: Vec<String>,
    /// Finished cells, in encounter order
    cells: Vec<Cell>,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next line
    pub fn push(&mut self, line: &str) {
        if is_heading_boundary(line) {
            self.flush();
        }
        self.current.push(line.to_string());
    }

    /// Finish segmentation and return the cells
    pub fn finish(mut self) -> Vec<Cell> {
        self.flush();
        self.cells
    }

    /// Close the current cell unless it is empty
    fn flush(&mut self) {
        if !self.current.is_empty() {
            let source = std::mem::take(&mut self.current);
            self.cells.push(Cell::markdown(source));
        }
    }
}
