use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Immutable detection settings shared by the detector and the fix synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ruleset {
    /// Output function whose use requires the header.
    pub call: String,
    /// Header that declares `call`.
    pub header: String,
}

#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("failed to read ruleset {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid ruleset {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid ruleset: {0}")]
    Invalid(String),
}

impl Default for Ruleset {
    fn default() -> Self {
        Ruleset {
            call: "printf".into(),
            header: "stdio.h".into(),
        }
    }
}

impl Ruleset {
    /// Load a JSON ruleset; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, RulesetError> {
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| RulesetError::Read {
            path: shown.clone(),
            source,
        })?;
        let rules: Ruleset = serde_json::from_str(&text).map_err(|source| RulesetError::Parse {
            path: shown.clone(),
            source,
        })?;
        rules.validate()?;
        debug!(path = %shown, call = %rules.call, header = %rules.header, "loaded ruleset");
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RulesetError> {
        let mut chars = self.call.chars();
        let ident_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !ident_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(RulesetError::Invalid(format!(
                "call must be an identifier, got {:?}",
                self.call
            )));
        }
        let header = self.header.trim();
        if header.is_empty() || header.contains(['<', '>', '"', '\n']) {
            return Err(RulesetError::Invalid(format!(
                "header must be a bare file name, got {:?}",
                self.header
            )));
        }
        Ok(())
    }

    /// The directive the missing-include fix inserts.
    pub fn include_directive(&self) -> String {
        format!("#include <{}>", self.header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_ruleset() {
        let rules = Ruleset::default();
        assert_eq!(rules.include_directive(), "#include <stdio.h>");
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_load_partial_ruleset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"call": "puts"}}"#).unwrap();
        let rules = Ruleset::load(file.path()).unwrap();
        assert_eq!(rules.call, "puts");
        assert_eq!(rules.header, "stdio.h");
    }

    #[test]
    fn test_load_rejects_bad_call() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"call": "print f"}}"#).unwrap();
        let err = Ruleset::load(file.path()).unwrap_err();
        assert!(matches!(err, RulesetError::Invalid(_)));
    }

    #[test]
    fn test_load_rejects_unknown_field() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"calls": "puts"}}"#).unwrap();
        assert!(matches!(
            Ruleset::load(file.path()).unwrap_err(),
            RulesetError::Parse { .. }
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Ruleset::load(Path::new("/nonexistent/rules.json")).unwrap_err();
        assert!(matches!(err, RulesetError::Read { .. }));
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = Ruleset::load(file.path()).unwrap_err();
        match &err {
            RulesetError::Parse { path, .. } => {
                assert_eq!(path, &file.path().display().to_string())
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(err
            .to_string()
            .starts_with(&format!("invalid ruleset {}", file.path().display())));

        let err = Ruleset::load(Path::new("/nonexistent/rules.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rules.json"));
    }

    #[test]
    fn test_header_with_brackets_rejected() {
        let rules = Ruleset {
            call: "printf".into(),
            header: "<stdio.h>".into(),
        };
        assert!(rules.validate().is_err());
    }
}
