use std::collections::BTreeSet;

use tracing::debug;

use super::detector::first_unterminated_call;
use super::rules::Ruleset;
use super::scan;
use super::{Confidence, Diagnostic, DiagnosticKind, Edit, EditOp};
use crate::source::SourceBuffer;

/// Derives at most one minimal edit per diagnostic kind.
///
/// Each edit is located by rescanning the buffer, not by trusting the line
/// carried on the diagnostic, so a stale diagnostic can yield no edit.
pub struct FixSynthesizer<'a> {
    rules: &'a Ruleset,
}

impl<'a> FixSynthesizer<'a> {
    pub fn new(rules: &'a Ruleset) -> Self {
        FixSynthesizer { rules }
    }

    pub fn suggest(&self, source: &SourceBuffer, diagnostics: &[Diagnostic]) -> Vec<Edit> {
        let present: BTreeSet<DiagnosticKind> = diagnostics.iter().map(|d| d.kind).collect();

        // BTreeSet iterates in declaration order, which is the emission order
        let edits: Vec<Edit> = present
            .into_iter()
            .filter_map(|kind| self.suggest_for(kind, source))
            .collect();
        debug!(
            diagnostics = diagnostics.len(),
            edits = edits.len(),
            "fix synthesis complete"
        );
        edits
    }

    fn suggest_for(&self, kind: DiagnosticKind, source: &SourceBuffer) -> Option<Edit> {
        match kind {
            DiagnosticKind::MissingInclude => Some(self.suggest_include()),
            DiagnosticKind::MissingSemicolon => self.suggest_semicolon(source),
            DiagnosticKind::UnmatchedBraces => suggest_brace(source),
            DiagnosticKind::ExtraSemicolon => suggest_collapse_semicolon(source),
        }
    }

    fn suggest_include(&self) -> Edit {
        Edit {
            kind: DiagnosticKind::MissingInclude,
            description: format!(
                "Add {} at the top to declare {}",
                self.rules.include_directive(),
                self.rules.call
            ),
            confidence: Confidence::new(0.9),
            edit: EditOp::Insert {
                line: 1,
                content: format!("{}\n", self.rules.include_directive()),
            },
        }
    }

    fn suggest_semicolon(&self, source: &SourceBuffer) -> Option<Edit> {
        let line_num = first_unterminated_call(source, &self.rules.call)?;
        let original = source.line(line_num)?;
        let at = scan::terminator_position(original, &self.rules.call)?;

        let mut replacement = String::with_capacity(original.len() + 1);
        replacement.push_str(&original[..at]);
        replacement.push(';');
        replacement.push_str(&original[at..]);

        Some(Edit {
            kind: DiagnosticKind::MissingSemicolon,
            description: "Add missing semicolon to end of statement".to_string(),
            confidence: Confidence::new(0.95),
            edit: EditOp::Replace {
                line: line_num,
                original: original.to_string(),
                replacement,
            },
        })
    }
}

/// Synthesize edits with the default ruleset.
pub fn suggest_fixes(source: &SourceBuffer, diagnostics: &[Diagnostic]) -> Vec<Edit> {
    FixSynthesizer::new(&Ruleset::default()).suggest(source, diagnostics)
}

fn suggest_brace(source: &SourceBuffer) -> Option<Edit> {
    let opens = source.count_char('{');
    let closes = source.count_char('}');

    if opens > closes {
        let missing = opens - closes;
        let description = if missing == 1 {
            "Add missing closing brace at end of file".to_string()
        } else {
            format!("Add {missing} missing closing braces at end of file")
        };
        return Some(Edit {
            kind: DiagnosticKind::UnmatchedBraces,
            description,
            confidence: Confidence::new(0.85),
            edit: EditOp::Insert {
                line: source.len() + 1,
                content: "\n}".repeat(missing),
            },
        });
    }

    if closes > opens {
        let idx = source.lines().iter().rposition(|l| l.contains('}'))?;
        return Some(Edit {
            kind: DiagnosticKind::UnmatchedBraces,
            description: "Remove unmatched closing brace".to_string(),
            confidence: Confidence::new(0.6),
            edit: EditOp::Replace {
                line: idx + 1,
                original: source.lines()[idx].clone(),
                replacement: String::new(),
            },
        });
    }

    None
}

/// Collapse the first `;;` on the first line that has one.
fn suggest_collapse_semicolon(source: &SourceBuffer) -> Option<Edit> {
    let idx = source.lines().iter().position(|l| l.contains(";;"))?;
    let original = &source.lines()[idx];
    Some(Edit {
        kind: DiagnosticKind::ExtraSemicolon,
        description: "Remove extra semicolon".to_string(),
        confidence: Confidence::new(0.9),
        edit: EditOp::Replace {
            line: idx + 1,
            original: original.clone(),
            replacement: original.replacen(";;", ";", 1),
        },
    })
}
