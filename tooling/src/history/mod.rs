//! Persistent diagnostic history and the frequency summary built from it.
//!
//! Lives outside the analysis core: [`crate::analyze`] never reads or writes
//! history. Callers opt in by recording reports after the fact.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::diagnostics::{Diagnostic, DiagnosticKind};

/// A message seen more than this many times is reported as frequent.
pub const FREQUENT_THRESHOLD: usize = 3;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read history {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write history {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only list of past diagnostics, stored as a JSON array.
#[derive(Debug, Clone)]
pub struct ErrorHistory {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl ErrorHistory {
    pub fn new(path: &Path) -> Self {
        ErrorHistory {
            path: path.to_path_buf(),
            entries: Vec::new(),
        }
    }

    /// Load the history at `path`. A missing file is an empty history; so is
    /// a file that does not parse, which is logged and then overwritten on
    /// the next save.
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        if !path.exists() {
            debug!(path = %path.display(), "no history file yet");
            return Ok(Self::new(path));
        }
        let text = std::fs::read_to_string(path).map_err(|source| HistoryError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let entries = match serde_json::from_str::<Vec<HistoryEntry>>(&text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable history, starting fresh");
                Vec::new()
            }
        };
        Ok(ErrorHistory {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn record(&mut self, diagnostics: &[Diagnostic]) {
        self.record_at(diagnostics, Utc::now());
    }

    pub fn record_at(&mut self, diagnostics: &[Diagnostic], at: DateTime<Utc>) {
        self.entries
            .extend(diagnostics.iter().map(|d| HistoryEntry {
                kind: d.kind,
                message: d.message.clone(),
                line: d.line,
                recorded_at: at,
            }));
    }

    pub fn save(&self) -> Result<(), HistoryError> {
        let write_err = |source| HistoryError::Write {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json).map_err(write_err)?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "saved history");
        Ok(())
    }

    /// Group entries by kind, in order of first appearance. Each insight
    /// carries a line-free label and the lines the kind was reported on.
    pub fn summary(&self) -> AdaptiveSummary {
        let mut groups: Vec<(DiagnosticKind, usize, BTreeSet<usize>)> = Vec::new();
        for entry in &self.entries {
            let idx = match groups.iter().position(|(kind, ..)| *kind == entry.kind) {
                Some(idx) => idx,
                None => {
                    groups.push((entry.kind, 0, BTreeSet::new()));
                    groups.len() - 1
                }
            };
            let (_, count, lines) = &mut groups[idx];
            *count += 1;
            lines.extend(entry.line);
        }

        let insights = groups
            .into_iter()
            .map(|(kind, count, lines)| {
                let frequent = count > FREQUENT_THRESHOLD;
                Insight {
                    message: kind_label(kind).to_string(),
                    kind,
                    count,
                    lines: lines.into_iter().collect(),
                    frequency: if frequent {
                        Frequency::Frequent
                    } else {
                        Frequency::New
                    },
                    suggestion: frequent.then(|| suggested_fix(kind).to_string()),
                }
            })
            .collect();

        AdaptiveSummary {
            total: self.entries.len(),
            insights,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Frequent,
    New,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub message: String,
    pub kind: DiagnosticKind,
    pub count: usize,
    /// Distinct lines the kind was reported on, ascending.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<usize>,
    pub frequency: Frequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AdaptiveSummary {
    pub total: usize,
    pub insights: Vec<Insight>,
}

impl AdaptiveSummary {
    pub fn to_human(&self) -> String {
        if self.insights.is_empty() {
            return "No errors recorded yet. Clean run!\n".to_string();
        }
        let mut out = String::new();
        for i in &self.insights {
            match i.frequency {
                Frequency::Frequent => {
                    out.push_str(&format!(
                        "[Frequent Error] '{}' occurred {} times.\n",
                        i.message, i.count
                    ));
                    if let Some(s) = &i.suggestion {
                        out.push_str(&format!("  suggested auto-fix: {s}\n"));
                    }
                }
                Frequency::New => out.push_str(&format!(
                    "[New Error] '{}' detected {} time(s).\n",
                    i.message, i.count
                )),
            }
        }
        out
    }
}

fn kind_label(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::MissingInclude => "Missing #include directive",
        DiagnosticKind::MissingSemicolon => "Missing semicolon",
        DiagnosticKind::UnmatchedBraces => "Unmatched braces",
        DiagnosticKind::ExtraSemicolon => "Extra semicolon",
    }
}

fn suggested_fix(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::MissingSemicolon => "Add a missing ';' at the end of the statement.",
        DiagnosticKind::ExtraSemicolon => "Remove the duplicated ';'.",
        DiagnosticKind::UnmatchedBraces => "Balance '{' and '}' by adding or removing a brace.",
        DiagnosticKind::MissingInclude => {
            "Add the missing #include directive at the top of the file."
        }
    }
}
