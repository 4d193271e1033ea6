use super::requirements::GapReport;

/// Rejected input value. Raised before any point-grid lookup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} value {value} is outside the accepted range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },
    #[error("{field} value '{value}' is not a recognised label")]
    Unrecognized { field: &'static str, value: String },
    #[error("{field} is malformed: {message}")]
    Malformed { field: &'static str, message: String },
}

/// Scoring refused because minimum inputs are missing. Carries the gap report for the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("score unavailable: missing required fields [{}]", missing_names(.report))]
pub struct GatingError {
    pub report: Box<GapReport>,
}

impl GatingError {
    pub fn new(report: GapReport) -> Self {
        Self {
            report: Box::new(report),
        }
    }
}

fn missing_names(report: &GapReport) -> String {
    report
        .missing_required
        .iter()
        .map(|missing| missing.field.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Policy tables are internally inconsistent. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("point grid invalid: {0}")]
    PointGrid(String),
    #[error("requirement table invalid: {0}")]
    Requirements(String),
    #[error("unable to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse policy file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-request failure of a score computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Gating(#[from] GatingError),
}
