pub mod detector;
pub mod rules;
pub mod scan;
pub mod suggest;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Defect classes the detector can report.
///
/// Declaration order is also the order the fix synthesizer emits edits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DiagnosticKind {
    MissingInclude,
    MissingSemicolon,
    UnmatchedBraces,
    ExtraSemicolon,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 4] = [
        DiagnosticKind::MissingInclude,
        DiagnosticKind::MissingSemicolon,
        DiagnosticKind::UnmatchedBraces,
        DiagnosticKind::ExtraSemicolon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MissingInclude => "MissingInclude",
            DiagnosticKind::MissingSemicolon => "MissingSemicolon",
            DiagnosticKind::UnmatchedBraces => "UnmatchedBraces",
            DiagnosticKind::ExtraSemicolon => "ExtraSemicolon",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected defect. `line` is absent for buffer-global defects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn global(kind: DiagnosticKind, message: String) -> Self {
        Diagnostic {
            kind,
            message,
            line: None,
        }
    }

    pub fn at(kind: DiagnosticKind, line: usize, message: String) -> Self {
        Diagnostic {
            kind,
            message,
            line: Some(line),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] line {}: {}", self.kind, line, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Heuristic likelihood that an edit is the right repair, clamped into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Confidence(0.0);
        }
        Confidence(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// A single-line textual operation. Line numbers are 1-based.
///
/// On input, a replace may spell its new text as `replacement` or `content`;
/// `replacement` wins when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", try_from = "EditOpWire")]
pub enum EditOp {
    /// Insert `content` before `line`; `len + 1` appends.
    Insert { line: usize, content: String },
    /// Overwrite `line` with `replacement`.
    Replace {
        line: usize,
        original: String,
        replacement: String,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum EditOpWire {
    Insert {
        line: usize,
        content: String,
    },
    Replace {
        line: usize,
        #[serde(default)]
        original: String,
        replacement: Option<String>,
        content: Option<String>,
    },
}

impl TryFrom<EditOpWire> for EditOp {
    type Error = String;

    fn try_from(wire: EditOpWire) -> Result<Self, Self::Error> {
        match wire {
            EditOpWire::Insert { line, content } => Ok(EditOp::Insert { line, content }),
            EditOpWire::Replace {
                line,
                original,
                replacement,
                content,
            } => {
                let replacement = replacement
                    .or(content)
                    .ok_or_else(|| "replace edit needs `replacement` or `content`".to_string())?;
                Ok(EditOp::Replace {
                    line,
                    original,
                    replacement,
                })
            }
        }
    }
}

impl EditOp {
    pub fn line(&self) -> usize {
        match self {
            EditOp::Insert { line, .. } | EditOp::Replace { line, .. } => *line,
        }
    }
}

/// A proposed repair for one diagnostic kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    pub kind: DiagnosticKind,
    pub description: String,
    pub confidence: Confidence,
    pub edit: EditOp,
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match &self.edit {
            EditOp::Insert { line, .. } => format!("insert before line {line}"),
            EditOp::Replace { line, .. } => format!("replace line {line}"),
        };
        write!(
            f,
            "{} ({action}) [confidence: {:.2}]",
            self.description,
            self.confidence.value()
        )
    }
}
