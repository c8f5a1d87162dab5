// Error taxonomy for the reconciliation pipeline
// Structural failures are localized to the affected source: the caller
// treats a failed source as "empty result + reason", never as a crash.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum PipelineError {
    /// Input source file is missing. Fatal to that source, not to the run
    /// when a fallback source exists.
    NotFound { path: PathBuf },

    /// Input file exists but its content is malformed.
    Parse { path: PathBuf, message: String },

    /// Table is structurally unusable (required identifying columns absent).
    Schema { source: String, missing: Vec<String> },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::NotFound { path } => {
                write!(f, "source not found: {}", path.display())
            }
            PipelineError::Parse { path, message } => {
                write!(f, "failed to parse {}: {}", path.display(), message)
            }
            PipelineError::Schema { source, missing } => {
                write!(f, "{}: missing required columns {:?}", source, missing)
            }
        }
    }
}

impl std::error::Error for PipelineError {}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        PipelineError::NotFound { path: path.into() }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PipelineError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn schema(source: impl Into<String>, missing: Vec<String>) -> Self {
        PipelineError::Schema {
            source: source.into(),
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_found() {
        let err = PipelineError::not_found("dados/municipios.json");
        assert_eq!(err.to_string(), "source not found: dados/municipios.json");
    }

    #[test]
    fn test_display_schema() {
        let err = PipelineError::schema("Corretores", vec!["CIDADE".to_string()]);
        assert!(err.to_string().contains("Corretores"));
        assert!(err.to_string().contains("CIDADE"));
    }
}
