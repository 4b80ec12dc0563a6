use adaptc_lexer::Token;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::detector::Detector;
use crate::diagnostics::rules::Ruleset;
use crate::diagnostics::suggest::FixSynthesizer;
use crate::diagnostics::{Diagnostic, Edit, EditOp};
use crate::repair::apply_op;
use crate::source::SourceBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Response to an analyze request: diagnostics plus eagerly computed edits.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub status: Status,
    pub message: String,
    pub diagnostics: Vec<Diagnostic>,
    pub edits: Vec<Edit>,
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixReport {
    pub edits: Vec<Edit>,
}

/// A buffer and the `edit` member of a chosen fix.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyRequest {
    pub code: String,
    pub edit: EditOp,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub code: String,
}

pub fn analyze_code(code: &str, rules: &Ruleset) -> AnalysisReport {
    let source = SourceBuffer::new(code);
    let diagnostics = Detector::new(rules).analyze(&source);

    if diagnostics.is_empty() {
        let tokens = adaptc_lexer::lex(code).unwrap_or_else(|e| {
            debug!(error = %e, "clean source did not lex, omitting tokens");
            Vec::new()
        });
        return AnalysisReport {
            status: Status::Success,
            message: "Compilation succeeded".to_string(),
            diagnostics,
            edits: Vec::new(),
            tokens,
        };
    }

    let edits = FixSynthesizer::new(rules).suggest(&source, &diagnostics);
    AnalysisReport {
        status: Status::Error,
        message: "Compilation failed".to_string(),
        diagnostics,
        edits,
        tokens: Vec::new(),
    }
}

/// Fresh edits for possibly-edited code; re-runs detection internally.
pub fn fix_code(code: &str, rules: &Ruleset) -> FixReport {
    let source = SourceBuffer::new(code);
    let diagnostics = Detector::new(rules).analyze(&source);
    FixReport {
        edits: FixSynthesizer::new(rules).suggest(&source, &diagnostics),
    }
}

pub fn apply_code(request: &ApplyRequest) -> ApplyReport {
    let source = SourceBuffer::new(&request.code);
    ApplyReport {
        code: apply_op(&source, &request.edit).to_text(),
    }
}

impl AnalysisReport {
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".into())
    }

    pub fn to_human(&self, file: &str) -> String {
        let mut out = String::new();
        for d in &self.diagnostics {
            match d.line {
                Some(line) => out.push_str(&format!("{file}:{line}: [{}] {}\n", d.kind, d.message)),
                None => out.push_str(&format!("{file}: [{}] {}\n", d.kind, d.message)),
            }
        }
        for (i, e) in self.edits.iter().enumerate() {
            out.push_str(&format!("  fix {}: {e}\n", i + 1));
        }
        out
    }
}
