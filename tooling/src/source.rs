use std::fmt;

/// Newline-normalized text held as an ordered list of lines.
///
/// A trailing newline does not produce an empty final line; it is remembered
/// separately so [`SourceBuffer::to_text`] reproduces the normalized input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBuffer {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl SourceBuffer {
    pub fn new(text: &str) -> Self {
        let normalized = normalize_newlines(text);
        SourceBuffer {
            lines: normalized.lines().map(str::to_string).collect(),
            trailing_newline: normalized.ends_with('\n'),
        }
    }

    pub fn from_lines(lines: Vec<String>, trailing_newline: bool) -> Self {
        SourceBuffer {
            lines,
            trailing_newline,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// 1-based line lookup.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn has_trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    /// Count occurrences of `ch` across every line.
    pub fn count_char(&self, ch: char) -> usize {
        self.lines
            .iter()
            .map(|l| l.chars().filter(|c| *c == ch).count())
            .sum()
    }

    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            text.push('\n');
        }
        text
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, bool) {
        (self.lines, self.trailing_newline)
    }
}

impl From<&str> for SourceBuffer {
    fn from(text: &str) -> Self {
        SourceBuffer::new(text)
    }
}

impl fmt::Display for SourceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Split edit content into the lines it occupies once spliced into a buffer.
///
/// Same terminated-line rule as [`SourceBuffer::new`]; empty content is a
/// single empty line.
pub fn split_content(content: &str) -> Vec<String> {
    let normalized = normalize_newlines(content);
    if normalized.is_empty() {
        return vec![String::new()];
    }
    normalized.lines().map(str::to_string).collect()
}

fn normalize_newlines(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}
