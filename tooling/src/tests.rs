use pretty_assertions::assert_eq;

use crate::diagnostics::*;
use crate::report::{analyze_code, fix_code, Status};
use crate::{analyze, apply_edit, suggest_fixes, Ruleset, SourceBuffer};

fn kinds_and_lines(diags: &[Diagnostic]) -> Vec<(DiagnosticKind, Option<usize>)> {
    diags.iter().map(|d| (d.kind, d.line)).collect()
}

/// Missing include and missing terminator together.
#[test]
fn test_scenario_a_include_and_semicolon() {
    let source = SourceBuffer::new("int main() {\n  printf(\"hi\")\n  return 0;\n}");

    let diags = analyze(&source);
    assert_eq!(
        kinds_and_lines(&diags),
        vec![
            (DiagnosticKind::MissingInclude, None),
            (DiagnosticKind::MissingSemicolon, Some(2)),
        ]
    );

    let edits = suggest_fixes(&source, &diags);
    assert_eq!(edits.len(), 2);
    assert_eq!(
        edits[0].edit,
        EditOp::Insert {
            line: 1,
            content: "#include <stdio.h>\n".into()
        }
    );
    assert_eq!(
        edits[1].edit,
        EditOp::Replace {
            line: 2,
            original: "  printf(\"hi\")".into(),
            replacement: "  printf(\"hi\");".into(),
        }
    );
}

/// Unclosed function body.
#[test]
fn test_scenario_b_missing_closing_brace() {
    let source = SourceBuffer::new("int main() {\n  printf(\"hi\");\n");
    // The include check also fires here; the brace diagnostic is the one under test
    let diags = analyze(&source);
    let braces: Vec<_> = diags
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnmatchedBraces)
        .collect();
    assert_eq!(braces.len(), 1);
    assert_eq!(braces[0].line, None);

    let edits = suggest_fixes(&source, &diags);
    let brace_edit = edits
        .iter()
        .find(|e| e.kind == DiagnosticKind::UnmatchedBraces)
        .unwrap();
    assert_eq!(
        brace_edit.edit,
        EditOp::Insert {
            line: 3,
            content: "\n}".into()
        }
    );

    let fixed = apply_edit(&source, brace_edit);
    assert!(analyze(&fixed)
        .iter()
        .all(|d| d.kind != DiagnosticKind::UnmatchedBraces));
}

#[test]
fn test_scenario_b_with_include_is_braces_only() {
    let source = SourceBuffer::new("#include <stdio.h>\nint main() {\n  printf(\"hi\");\n");
    let diags = analyze(&source);
    assert_eq!(
        kinds_and_lines(&diags),
        vec![(DiagnosticKind::UnmatchedBraces, None)]
    );
    let edits = suggest_fixes(&source, &diags);
    assert_eq!(
        edits[0].edit,
        EditOp::Insert {
            line: 4,
            content: "\n}".into()
        }
    );
}

/// Doubled terminator.
#[test]
fn test_scenario_c_extra_semicolon() {
    let source = SourceBuffer::new("int x = 1;;\n");
    let diags = analyze(&source);
    assert_eq!(
        kinds_and_lines(&diags),
        vec![(DiagnosticKind::ExtraSemicolon, Some(1))]
    );
    let edits = suggest_fixes(&source, &diags);
    assert_eq!(edits.len(), 1);
    assert_eq!(
        edits[0].edit,
        EditOp::Replace {
            line: 1,
            original: "int x = 1;;".into(),
            replacement: "int x = 1;".into(),
        }
    );
    assert_eq!(apply_edit(&source, &edits[0]).to_text(), "int x = 1;\n");
}

/// Clean input reports success with no edits.
#[test]
fn test_scenario_d_clean_source() {
    let report = analyze_code(
        "#include <stdio.h>\nint main(){printf(\"x\");}",
        &Ruleset::default(),
    );
    assert_eq!(report.status, Status::Success);
    assert!(report.diagnostics.is_empty());
    assert!(report.edits.is_empty());
}

/// Driving analyze -> fix -> apply from outside converges one edit at a time.
#[test]
fn test_manual_fix_loop_converges() {
    let mut source = SourceBuffer::new("int main() {\n  printf(\"hi\")\n  int a = 1;;\n  int b = 2;;\n");
    let mut rounds = 0;
    loop {
        let diags = analyze(&source);
        if diags.is_empty() {
            break;
        }
        let edits = suggest_fixes(&source, &diags);
        assert!(!edits.is_empty(), "stuck with {diags:?}");
        source = apply_edit(&source, &edits[0]);
        rounds += 1;
        assert!(rounds <= 10, "loop did not converge");
    }
    // include, semicolon, brace, and one round per doubled terminator
    assert_eq!(rounds, 5);
    assert_eq!(source.line(1), Some("#include <stdio.h>"));
    assert_eq!(source.line(3), Some("  printf(\"hi\");"));
}

#[test]
fn test_extra_semicolon_diagnostics_exhaustive_fix_single() {
    let code = "int a;;\nint b;;\nint c;;\n";
    let report = analyze_code(code, &Ruleset::default());
    assert_eq!(report.diagnostics.len(), 3);
    assert_eq!(report.edits.len(), 1);
    assert_eq!(fix_code(code, &Ruleset::default()).edits.len(), 1);
}

#[test]
fn test_removing_extra_brace_resolves_imbalance() {
    let source = SourceBuffer::new("int main() {\n  return 0;\n}\n}\n");
    let diags = analyze(&source);
    let edits = suggest_fixes(&source, &diags);
    assert_eq!(edits[0].confidence.value(), 0.6);
    let fixed = apply_edit(&source, &edits[0]);
    assert!(analyze(&fixed).is_empty());
    assert_eq!(fixed.to_text(), "int main() {\n  return 0;\n}\n\n");
}

#[test]
fn test_semicolon_fix_is_idempotent() {
    let source = SourceBuffer::new("#include <stdio.h>\nint main() {\n  printf(\"a\") // say a\n}");
    let edits = suggest_fixes(&source, &analyze(&source));
    let fixed = apply_edit(&source, &edits[0]);
    assert!(analyze(&fixed).is_empty());
}

#[test]
fn test_empty_code_is_success() {
    let report = analyze_code("", &Ruleset::default());
    assert_eq!(report.status, Status::Success);
    assert!(report.tokens.is_empty());
}
