/// Common error type for loading, evaluating and merging calibrations.
#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid csv line {line}: {reason}")]
    InvalidLine { line: u64, reason: String },
    #[error("invalid formula `{formula}`: {reason}")]
    InvalidFormula { formula: String, reason: String },
    #[error("cannot extract a symmetric shift from `{0}`")]
    UnsupportedShift(String),
    #[error("no total-uncertainty bin registered for {0}")]
    UndiscoveredBin(String),
    #[error("nothing selected: {0}")]
    EmptySelection(String),
}

pub type CalibrationResult<T> = Result<T, CalibrationError>;
