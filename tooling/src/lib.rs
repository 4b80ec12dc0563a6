//! Heuristic defect detection and single-edit repair for C-like source text.
//!
//! [`analyze`] runs every structural check over a [`SourceBuffer`];
//! [`suggest_fixes`] turns the resulting diagnostics into at most one [`Edit`]
//! per diagnostic kind; [`apply_edit`] splices a chosen edit into a fresh buffer.
//! None of these keep state between calls.

pub mod diagnostics;
pub mod history;
pub mod repair;
pub mod report;
pub mod source;

#[cfg(test)]
mod tests;

pub use diagnostics::detector::{analyze, Detector};
pub use diagnostics::rules::{Ruleset, RulesetError};
pub use diagnostics::suggest::{suggest_fixes, FixSynthesizer};
pub use diagnostics::{Confidence, Diagnostic, DiagnosticKind, Edit, EditOp};
pub use repair::{apply_edit, RepairResult, RepairStrategy, RepairTool};
pub use source::SourceBuffer;
