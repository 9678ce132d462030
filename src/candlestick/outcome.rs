use super::assertions::{candle_data, extract_result};
use crate::common::{ApiResponse, ConformanceError};

/// How the server signalled an invalid request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorOutcome {
    /// Non-200 HTTP status.
    HardError { status: u16, body: String },
    /// HTTP 200 with a `code` other than 0 (or no code at all).
    SoftNonZero { code: Option<i64> },
    /// HTTP 200, `code` 0, empty `data`.
    SoftEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    HardError,
    SoftNonZero,
    SoftEmpty,
}

impl ErrorOutcome {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorOutcome::HardError { .. } => ErrorKind::HardError,
            ErrorOutcome::SoftNonZero { .. } => ErrorKind::SoftNonZero,
            ErrorOutcome::SoftEmpty => ErrorKind::SoftEmpty,
        }
    }
}

/// Classifies the answer to a request that should have been refused.
/// A response carrying candles is a contract violation; transport errors
/// propagate unchanged.
pub fn classify_error_response(
    response: Result<ApiResponse, ConformanceError>,
) -> Result<ErrorOutcome, ConformanceError> {
    let response = match response {
        Ok(r) => r,
        Err(ConformanceError::ApiError { status, body }) => {
            return Ok(ErrorOutcome::HardError { status, body });
        }
        Err(e) => return Err(e),
    };

    match response.code() {
        Some(0) => {}
        code => return Ok(ErrorOutcome::SoftNonZero { code }),
    }

    let data = candle_data(extract_result(&response.body)?)?;
    if data.is_empty() {
        Ok(ErrorOutcome::SoftEmpty)
    } else {
        Err(ConformanceError::contract(format!(
            "expected an error-indicating response, got code 0 with {} candles",
            data.len()
        )))
    }
}

/// [classify_error_response] plus a membership check against `accepted`.
pub fn expect_error_outcome(
    response: Result<ApiResponse, ConformanceError>,
    accepted: &[ErrorKind],
) -> Result<ErrorOutcome, ConformanceError> {
    let outcome = classify_error_response(response)?;
    if !accepted.contains(&outcome.kind()) {
        return Err(ConformanceError::contract(format!(
            "error outcome {:?} not in accepted set {:?}",
            outcome, accepted
        )));
    }
    Ok(outcome)
}
