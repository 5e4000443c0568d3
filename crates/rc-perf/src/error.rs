use rc_core::error::RcError;
use thiserror::Error;

pub type PerfResult<T> = Result<T, PerfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerfError {
    #[error("invalid result: {what}")]
    InvalidResult { what: String },

    #[error("solution has no {what} for '{component}'")]
    MissingOutput {
        component: String,
        what: &'static str,
    },
}

impl PerfError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        PerfError::InvalidResult { what: what.into() }
    }
}

impl From<PerfError> for RcError {
    fn from(e: PerfError) -> Self {
        RcError::Invariant {
            what: e.to_string(),
        }
    }
}
