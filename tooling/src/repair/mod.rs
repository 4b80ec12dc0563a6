use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info};

use crate::diagnostics::detector::Detector;
use crate::diagnostics::rules::Ruleset;
use crate::diagnostics::suggest::FixSynthesizer;
use crate::diagnostics::{DiagnosticKind, Edit, EditOp};
use crate::source::{split_content, SourceBuffer};

/// Default bound on analyze/fix/apply rounds.
pub const DEFAULT_MAX_PASSES: usize = 16;

/// Apply one edit, returning a new buffer.
///
/// Out-of-range lines are clamped rather than rejected, so an edit computed
/// against an older buffer still lands somewhere sensible.
pub fn apply_edit(source: &SourceBuffer, edit: &Edit) -> SourceBuffer {
    apply_op(source, &edit.edit)
}

pub fn apply_op(source: &SourceBuffer, op: &EditOp) -> SourceBuffer {
    let (mut lines, trailing_newline) = source.clone().into_parts();

    match op {
        EditOp::Insert { line, content } => {
            let idx = line.saturating_sub(1).min(lines.len());
            lines.splice(idx..idx, split_content(content));
        }
        EditOp::Replace { replacement, .. } if lines.is_empty() => {
            lines.extend(split_content(replacement));
        }
        EditOp::Replace {
            line, replacement, ..
        } => {
            let idx = line.saturating_sub(1).min(lines.len() - 1);
            lines.splice(idx..=idx, split_content(replacement));
        }
    }

    SourceBuffer::from_lines(lines, trailing_newline)
}

/// Which synthesized edit a repair pass applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStrategy {
    /// The first edit in fix order.
    First,
    /// The highest-confidence edit; ties go to fix order.
    Best,
    /// Only edits targeting this kind.
    Kind(DiagnosticKind),
}

impl FromStr for RepairStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(RepairStrategy::First),
            "best" => Ok(RepairStrategy::Best),
            other => DiagnosticKind::parse(other)
                .map(RepairStrategy::Kind)
                .ok_or_else(|| {
                    format!("unknown strategy {other:?}: expected first, best or a diagnostic kind")
                }),
        }
    }
}

/// Why the repair loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Re-analysis found nothing.
    Clean,
    /// Diagnostics remain but the strategy selected no edit.
    NoEdit,
    /// The selected edit left the buffer unchanged.
    NoProgress,
    /// Pass budget exhausted.
    PassLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Clean => "clean",
            StopReason::NoEdit => "no applicable edit",
            StopReason::NoProgress => "edit made no progress",
            StopReason::PassLimit => "pass limit reached",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedEdit {
    pub pass: usize,
    pub edit: Edit,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairResult {
    pub applied: Vec<AppliedEdit>,
    pub passes: usize,
    pub diagnostics_before: usize,
    pub diagnostics_after: usize,
    pub verify_passed: bool,
    pub stop: StopReason,
}

/// Drives analyze -> suggest -> apply until the buffer is clean or stuck.
pub struct RepairTool<'a> {
    rules: &'a Ruleset,
    strategy: RepairStrategy,
    max_passes: usize,
}

impl<'a> RepairTool<'a> {
    pub fn new(rules: &'a Ruleset, strategy: RepairStrategy) -> Self {
        RepairTool {
            rules,
            strategy,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    pub fn max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn repair(&self, source: &SourceBuffer) -> (SourceBuffer, RepairResult) {
        let detector = Detector::new(self.rules);
        let synthesizer = FixSynthesizer::new(self.rules);

        let mut current = source.clone();
        let mut diagnostics = detector.analyze(&current);
        let mut result = RepairResult {
            applied: Vec::new(),
            passes: 0,
            diagnostics_before: diagnostics.len(),
            diagnostics_after: diagnostics.len(),
            verify_passed: diagnostics.is_empty(),
            stop: StopReason::Clean,
        };

        loop {
            if diagnostics.is_empty() {
                result.stop = StopReason::Clean;
                break;
            }
            if result.passes >= self.max_passes {
                result.stop = StopReason::PassLimit;
                break;
            }

            let edits = synthesizer.suggest(&current, &diagnostics);
            let Some(edit) = select(&edits, self.strategy) else {
                result.stop = StopReason::NoEdit;
                break;
            };

            let next = apply_edit(&current, edit);
            if next == current {
                result.stop = StopReason::NoProgress;
                break;
            }

            result.passes += 1;
            debug!(pass = result.passes, kind = %edit.kind, "applied edit");
            result.applied.push(AppliedEdit {
                pass: result.passes,
                edit: edit.clone(),
            });
            current = next;
            diagnostics = detector.analyze(&current);
        }

        result.diagnostics_after = diagnostics.len();
        result.verify_passed = diagnostics.is_empty();
        info!(
            passes = result.passes,
            before = result.diagnostics_before,
            after = result.diagnostics_after,
            stop = %result.stop,
            "repair finished"
        );
        (current, result)
    }
}

fn select(edits: &[Edit], strategy: RepairStrategy) -> Option<&Edit> {
    match strategy {
        RepairStrategy::First => edits.first(),
        RepairStrategy::Best => edits.iter().reduce(|best, e| {
            if e.confidence.value() > best.confidence.value() {
                e
            } else {
                best
            }
        }),
        RepairStrategy::Kind(kind) => edits.iter().find(|e| e.kind == kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Confidence;
    use pretty_assertions::assert_eq;

    fn insert(line: usize, content: &str) -> Edit {
        Edit {
            kind: DiagnosticKind::MissingInclude,
            description: "insert".into(),
            confidence: Confidence::new(0.9),
            edit: EditOp::Insert {
                line,
                content: content.into(),
            },
        }
    }

    fn replace(line: usize, replacement: &str) -> Edit {
        Edit {
            kind: DiagnosticKind::ExtraSemicolon,
            description: "replace".into(),
            confidence: Confidence::new(0.9),
            edit: EditOp::Replace {
                line,
                original: String::new(),
                replacement: replacement.into(),
            },
        }
    }

    #[test]
    fn test_insert_before_line() {
        let buf = SourceBuffer::new("a\nb\n");
        let out = apply_edit(&buf, &insert(2, "x"));
        assert_eq!(out.to_text(), "a\nx\nb\n");
    }

    #[test]
    fn test_insert_include_with_trailing_newline() {
        let buf = SourceBuffer::new("int main() {}");
        let out = apply_edit(&buf, &insert(1, "#include <stdio.h>\n"));
        assert_eq!(out.to_text(), "#include <stdio.h>\nint main() {}");
    }

    #[test]
    fn test_insert_append_multiline() {
        let buf = SourceBuffer::new("int main() {\n  return 0;");
        let out = apply_edit(&buf, &insert(3, "\n}"));
        assert_eq!(out.lines(), &["int main() {", "  return 0;", "", "}"]);
    }

    #[test]
    fn test_insert_clamps() {
        let buf = SourceBuffer::new("a\nb");
        assert_eq!(apply_edit(&buf, &insert(0, "x")).lines(), &["x", "a", "b"]);
        assert_eq!(apply_edit(&buf, &insert(99, "x")).lines(), &["a", "b", "x"]);
    }

    #[test]
    fn test_replace_clamps() {
        let buf = SourceBuffer::new("a\nb");
        assert_eq!(apply_edit(&buf, &replace(0, "x")).lines(), &["x", "b"]);
        assert_eq!(apply_edit(&buf, &replace(42, "x")).lines(), &["a", "x"]);
    }

    #[test]
    fn test_replace_with_empty_keeps_line() {
        let buf = SourceBuffer::new("{\n}\n}");
        assert_eq!(apply_edit(&buf, &replace(3, "")).lines(), &["{", "}", ""]);
    }

    #[test]
    fn test_replace_on_empty_buffer() {
        let buf = SourceBuffer::new("");
        assert_eq!(apply_edit(&buf, &replace(1, "x;")).lines(), &["x;"]);
    }

    #[test]
    fn test_apply_does_not_mutate_input() {
        let buf = SourceBuffer::new("a;;");
        let _ = apply_edit(&buf, &replace(1, "a;"));
        assert_eq!(buf.to_text(), "a;;");
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("best".parse::<RepairStrategy>(), Ok(RepairStrategy::Best));
        assert_eq!("first".parse::<RepairStrategy>(), Ok(RepairStrategy::First));
        assert_eq!(
            "ExtraSemicolon".parse::<RepairStrategy>(),
            Ok(RepairStrategy::Kind(DiagnosticKind::ExtraSemicolon))
        );
        assert!("bogus".parse::<RepairStrategy>().is_err());
    }

    #[test]
    fn test_repair_converges() {
        let source = SourceBuffer::new("int main() {\n  printf(\"hi\")\n  int x = 1;;;\n");
        let rules = Ruleset::default();
        let (repaired, result) = RepairTool::new(&rules, RepairStrategy::First).repair(&source);
        assert!(result.verify_passed);
        assert_eq!(result.stop, StopReason::Clean);
        assert_eq!(result.diagnostics_before, 4);
        assert_eq!(result.diagnostics_after, 0);
        // include, semicolon, brace, then the tripled terminator twice
        assert_eq!(result.passes, 5);
        assert_eq!(
            repaired.to_text(),
            "#include <stdio.h>\nint main() {\n  printf(\"hi\");\n  int x = 1;\n\n}\n"
        );
    }

    #[test]
    fn test_repair_best_prefers_confidence() {
        let source = SourceBuffer::new("printf(\"a\")\n");
        let rules = Ruleset::default();
        let (_, result) = RepairTool::new(&rules, RepairStrategy::Best)
            .max_passes(1)
            .repair(&source);
        assert_eq!(result.stop, StopReason::PassLimit);
        assert_eq!(result.applied[0].edit.kind, DiagnosticKind::MissingSemicolon);
    }

    #[test]
    fn test_repair_by_kind_stops_when_kind_resolved() {
        let source = SourceBuffer::new("int a;;\nprintf(\"x\")\n");
        let rules = Ruleset::default();
        let (repaired, result) =
            RepairTool::new(&rules, RepairStrategy::Kind(DiagnosticKind::ExtraSemicolon))
                .repair(&source);
        assert_eq!(result.stop, StopReason::NoEdit);
        assert!(!result.verify_passed);
        assert_eq!(repaired.line(1), Some("int a;"));
    }

    #[test]
    fn test_repair_clean_input_is_untouched() {
        let source = SourceBuffer::new("#include <stdio.h>\nint main(){printf(\"x\");}");
        let rules = Ruleset::default();
        let (repaired, result) = RepairTool::new(&rules, RepairStrategy::Best).repair(&source);
        assert_eq!(repaired, source);
        assert_eq!(result.passes, 0);
        assert!(result.verify_passed);
    }
}
