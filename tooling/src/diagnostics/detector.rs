use tracing::{debug, trace};

use super::rules::Ruleset;
use super::scan;
use super::{Diagnostic, DiagnosticKind};
use crate::source::SourceBuffer;

/// Runs every structural check over a buffer.
///
/// Checks are independent: each always runs, and their results are
/// concatenated in check order (not sorted by line).
pub struct Detector<'a> {
    rules: &'a Ruleset,
}

impl<'a> Detector<'a> {
    pub fn new(rules: &'a Ruleset) -> Self {
        Detector { rules }
    }

    pub fn analyze(&self, source: &SourceBuffer) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        self.check_missing_include(source, &mut diags);
        self.check_missing_semicolon(source, &mut diags);
        self.check_extra_semicolons(source, &mut diags);
        self.check_brace_balance(source, &mut diags);
        debug!(lines = source.len(), found = diags.len(), "analysis complete");
        diags
    }

    /// Global: the call is used but its header is never included.
    fn check_missing_include(&self, source: &SourceBuffer, diags: &mut Vec<Diagnostic>) {
        let lines = source.lines();
        let uses_call = lines.iter().any(|l| scan::has_call(l, &self.rules.call));
        if !uses_call {
            return;
        }
        let included = lines
            .iter()
            .any(|l| scan::is_include_of(l, &self.rules.header));
        if !included {
            trace!(call = %self.rules.call, "call used without include");
            diags.push(Diagnostic::global(
                DiagnosticKind::MissingInclude,
                missing_include_message(self.rules),
            ));
        }
    }

    /// First unterminated call only.
    fn check_missing_semicolon(&self, source: &SourceBuffer, diags: &mut Vec<Diagnostic>) {
        if let Some(line) = first_unterminated_call(source, &self.rules.call) {
            trace!(line, "unterminated call");
            diags.push(Diagnostic::at(
                DiagnosticKind::MissingSemicolon,
                line,
                missing_semicolon_message(self.rules, line),
            ));
        }
    }

    /// Every line with `;;` is reported.
    fn check_extra_semicolons(&self, source: &SourceBuffer, diags: &mut Vec<Diagnostic>) {
        for (i, line) in source.lines().iter().enumerate() {
            if line.contains(";;") {
                trace!(line = i + 1, "doubled terminator");
                diags.push(Diagnostic::at(
                    DiagnosticKind::ExtraSemicolon,
                    i + 1,
                    format!("Extra semicolon detected on line {}", i + 1),
                ));
            }
        }
    }

    fn check_brace_balance(&self, source: &SourceBuffer, diags: &mut Vec<Diagnostic>) {
        let opens = source.count_char('{');
        let closes = source.count_char('}');
        if opens != closes {
            trace!(opens, closes, "brace counts differ");
            diags.push(Diagnostic::global(
                DiagnosticKind::UnmatchedBraces,
                "Unmatched braces".to_string(),
            ));
        }
    }
}

/// Analyze with the default ruleset.
pub fn analyze(source: &SourceBuffer) -> Vec<Diagnostic> {
    Detector::new(&Ruleset::default()).analyze(source)
}

/// 1-based number of the first line holding an unterminated call of `name`.
pub(crate) fn first_unterminated_call(source: &SourceBuffer, name: &str) -> Option<usize> {
    source
        .lines()
        .iter()
        .position(|l| scan::has_unterminated_call(l, name))
        .map(|idx| idx + 1)
}

fn missing_include_message(rules: &Ruleset) -> String {
    format!(
        "{} may be undeclared (missing {})",
        rules.call,
        rules.include_directive()
    )
}

fn missing_semicolon_message(rules: &Ruleset, line: usize) -> String {
    format!(
        "Missing semicolon after {} statement on line {line}",
        rules.call
    )
}
