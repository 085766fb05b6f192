use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdWordsErrorCode {
    InvalidArgument,
    LoadTimeout,
    ScriptLoad,
    Tracker,
    Internal,
}

impl AdWordsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdWordsErrorCode::InvalidArgument => "adwords/invalid-argument",
            AdWordsErrorCode::LoadTimeout => "adwords/load-timeout",
            AdWordsErrorCode::ScriptLoad => "adwords/script-load",
            AdWordsErrorCode::Tracker => "adwords/tracker",
            AdWordsErrorCode::Internal => "adwords/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AdWordsError {
    pub code: AdWordsErrorCode,
    message: String,
}

impl AdWordsError {
    pub fn new(code: AdWordsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for AdWordsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for AdWordsError {}

pub type AdWordsResult<T> = Result<T, AdWordsError>;

pub fn invalid_argument(message: impl Into<String>) -> AdWordsError {
    AdWordsError::new(AdWordsErrorCode::InvalidArgument, message)
}

pub fn load_timeout(message: impl Into<String>) -> AdWordsError {
    AdWordsError::new(AdWordsErrorCode::LoadTimeout, message)
}

pub fn script_load_error(message: impl Into<String>) -> AdWordsError {
    AdWordsError::new(AdWordsErrorCode::ScriptLoad, message)
}

pub fn tracker_error(message: impl Into<String>) -> AdWordsError {
    AdWordsError::new(AdWordsErrorCode::Tracker, message)
}

pub fn internal_error(message: impl Into<String>) -> AdWordsError {
    AdWordsError::new(AdWordsErrorCode::Internal, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code() {
        let err = load_timeout("google_trackConversion never became available");
        assert_eq!(err.code, AdWordsErrorCode::LoadTimeout);
        assert_eq!(
            err.to_string(),
            "google_trackConversion never became available (adwords/load-timeout)"
        );
    }
}
