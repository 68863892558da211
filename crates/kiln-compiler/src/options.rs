//! Lowering configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options controlling how a script is lowered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowerOptions {
    /// Apply peephole constant folding while lowering
    pub fold_constants: bool,
    /// Record the source span of every function definition
    pub generate_source: bool,
    /// Lower everything as strict-mode code
    pub strict: bool,
    /// Only allow `[key, value]` destructuring in for-in heads
    pub legacy_for_in_destructuring: bool,
    /// When set, the pretty-printed IR of each script is written to `<dir>/ir/<name>.txt`
    pub debug_output_dir: Option<PathBuf>,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            fold_constants: true,
            generate_source: false,
            strict: false,
            legacy_for_in_destructuring: true,
            debug_output_dir: None,
        }
    }
}

impl LowerOptions {
    /// Parse options from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = LowerOptions::default();
        assert!(opts.fold_constants);
        assert!(!opts.generate_source);
        assert!(opts.legacy_for_in_destructuring);
        assert!(opts.debug_output_dir.is_none());
    }

    #[test]
    fn test_from_json_partial() {
        let opts = LowerOptions::from_json(r#"{ "fold_constants": false, "debug_output_dir": "/tmp/kiln" }"#).unwrap();
        assert!(!opts.fold_constants);
        assert!(opts.legacy_for_in_destructuring);
        assert_eq!(opts.debug_output_dir, Some(PathBuf::from("/tmp/kiln")));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(LowerOptions::from_json("not json").is_err());
    }
}
