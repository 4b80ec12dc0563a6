//! Structural pattern matching over raw lines.
//!
//! Nothing here tokenizes: a call inside a comment or string literal still
//! counts as a call. Literal awareness is limited to finding the closing
//! parenthesis of a call and the start of a trailing `//` comment.

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte offsets of the `(` following each call-like use of `name` in `line`.
pub fn call_sites<'a>(line: &'a str, name: &'a str) -> impl Iterator<Item = usize> + 'a {
    let bytes = line.as_bytes();
    line.match_indices(name).filter_map(move |(pos, _)| {
        let before_ok = pos == 0 || !is_ident_byte(bytes[pos - 1]);
        let paren = pos + name.len();
        let call = bytes.get(paren) == Some(&b'(');
        (before_ok && call).then_some(paren)
    })
}

pub fn has_call(line: &str, name: &str) -> bool {
    call_sites(line, name).next().is_some()
}

/// True for `#include <header>` or `#include "header"`, with optional spacing.
pub fn is_include_of(line: &str, header: &str) -> bool {
    let Some(rest) = line.trim_start().strip_prefix('#') else {
        return false;
    };
    let Some(rest) = rest.trim_start().strip_prefix("include") else {
        return false;
    };
    let rest = rest.trim_start();
    let angled = rest
        .strip_prefix('<')
        .and_then(|r| r.strip_prefix(header))
        .is_some_and(|r| r.starts_with('>'));
    let quoted = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_prefix(header))
        .is_some_and(|r| r.starts_with('"'));
    angled || quoted
}

/// Index of the `)` matching the `(` at `open`, skipping string and char literals.
pub fn matching_paren(line: &str, open: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_literal(bytes, i)?,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Given the opening quote at `start`, return the index of the closing quote.
fn skip_literal(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b if b == quote => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Start of a `//` comment in `text`, ignoring `//` inside literals.
pub fn line_comment_start(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => match skip_literal(bytes, i) {
                Some(end) => i = end,
                None => return None,
            },
            b'/' if bytes.get(i + 1) == Some(&b'/') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Where a `;` must go to terminate the first unterminated call of `name` on
/// `line`, or `None` if every call on the line is terminated.
///
/// A call is unterminated when the text after its closing parenthesis, minus
/// any trailing `//` comment, has no `;`. Calls whose parentheses do not close
/// on this line are skipped. The insertion point is the end of the line, or
/// the end of the code before a trailing comment.
pub fn terminator_position(line: &str, name: &str) -> Option<usize> {
    for open in call_sites(line, name) {
        let Some(close) = matching_paren(line, open) else {
            continue;
        };
        let after = close + 1;
        let trailing = &line[after..];
        match line_comment_start(trailing) {
            Some(comment) => {
                let code = &trailing[..comment];
                if !code.contains(';') {
                    return Some(after + code.trim_end().len());
                }
            }
            None => {
                if !trailing.contains(';') {
                    return Some(line.len());
                }
            }
        }
    }
    None
}

pub fn has_unterminated_call(line: &str, name: &str) -> bool {
    terminator_position(line, name).is_some()
}
