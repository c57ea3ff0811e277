use serde::{Serialize, Deserialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid entry at row {row}, column {column}: {reason}")]
    InvalidInputKind {
        row: usize,
        column: usize,
        reason: String,
    },

    #[error("expected {expected} category labels, found {found}")]
    DimensionMismatch {
        expected: usize,
        found: usize,
    },

    #[error("correction must be 'none' or 'uniform', got '{0}'")]
    InvalidCorrectionMode(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    #[error("quantile function unavailable: {0}")]
    Quantile(String),

    #[error("invalid input path: {0}")]
    InvalidInputPath(String),

    #[error("invalid input file: {0}")]
    InvalidInputFile(String),

    #[error("failed to read input")]
    InputReadFailure,

    #[error("invalid JSON ({}) at line {}, column {}", .0.description, .0.line, .0.column)]
    InvalidJson(JsonError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    pub description: String,
    pub category: String,
    pub line: usize,
    pub column: usize,
}

impl From<serde_json::error::Error> for Error {
    fn from(e: serde_json::error::Error) -> Self {
        Self::InvalidJson(JsonError {
            description: format!("{}", e),
            category: format!("{:?}", e.classify()),
            line: e.line(),
            column: e.column(),
        })
    }
}

/// Recoverable condition reported alongside a successful result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    /// The row did not sum to 1 and was divided by `original_sum`.
    RowNormalizationApplied {
        row: usize,
        original_sum: f64,
    },
}

impl Diagnostic {
    pub fn row(&self) -> usize {
        match self {
            Diagnostic::RowNormalizationApplied { row, .. } => *row,
        }
    }
}

/// Output of an operation together with the diagnostics it raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sampled<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Sampled<T> {
    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// True if any input was repaired before use.
    pub fn was_corrected(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Row indices that required normalization, in ascending order.
    pub fn normalized_rows(&self) -> Vec<usize> {
        self.diagnostics.iter().map(|d| d.row()).collect()
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Sampled<U> {
        Sampled { value: f(self.value), diagnostics: self.diagnostics }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_conversion() {
        let e: Error = serde_json::from_str::<Vec<f64>>("[1.0,").unwrap_err().into();
        match e {
            Error::InvalidJson(json_error) => {
                assert_eq!(json_error.line, 1);
                assert_eq!(json_error.category, "Eof");
            },
            _ => panic!("expected InvalidJson, got {:?}", e),
        }
    }

    #[test]
    fn test_sampled_reports_correction() {
        let clean = Sampled::new(vec![1.0], vec![]);
        assert!(!clean.was_corrected());

        let repaired = Sampled::new(
            vec![1.0],
            vec![Diagnostic::RowNormalizationApplied { row: 3, original_sum: 1.1 }],
        );
        assert!(repaired.was_corrected());
        assert_eq!(repaired.normalized_rows(), vec![3]);
        assert_eq!(repaired.map(|v| v.len()).value, 1);
    }
}
