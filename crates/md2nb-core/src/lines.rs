//! Line splitting
//!
//! Breaks Markdown text into lines that keep their original terminators,
//! so joining the lines gives back the input byte-for-byte.

/// Iterator over the lines of a string, terminators included
///
/// Recognised terminators are `\n`, `\r\n`, `\r`, vertical tab, form feed,
/// the file/group/record separators `\x1c`..`\x1e`, NEL (`\u{85}`) and the
/// Unicode line and paragraph separators. A `\r\n` pair is one terminator.
/// The last line has no terminator when the input does not end with one.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    rest: &'a str,
}

impl<'a> Lines<'a> {
    /// Create a new line iterator for the given input
    pub fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    /// Length in bytes of the next line, terminator included
    fn next_line_len(&self) -> usize {
        match self.rest.char_indices().find(|&(_, c)| is_terminator(c)) {
            Some((i, '\r')) if self.rest[i + 1..].starts_with('\n') => i + 2,
            Some((i, c)) => i + c.len_utf8(),
            None => self.rest.len(),
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let (line, rest) = self.rest.split_at(self.next_line_len());
        self.rest = rest;
        Some(line)
    }
}

impl std::iter::FusedIterator for Lines<'_> {}

/// Check whether a character ends a line
pub fn is_terminator(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}'..='\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split text into lines, keeping each line's terminator
pub fn split_lines(input: &str) -> Vec<&str> {
    Lines::new(input).collect()
}

/// Strip a single trailing line terminator, if any
pub fn strip_terminator(line: &str) -> &str {
    if let Some(stripped) = line.strip_suffix("\r\n") {
        return stripped;
    }
    match line.chars().next_back() {
        Some(c) if is_terminator(c) => &line[..line.len() - c.len_utf8()],
        _ => line,
    }
}
