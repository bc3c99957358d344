//! Per-sink result of one fan-out round

use crate::error::TeeError;

/// Outcome of writing one line to one sink
#[derive(Debug)]
pub enum WriteOutcome {
    Success,
    Failure(TeeError),
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl<T> From<Result<T, TeeError>> for WriteOutcome {
    fn from(result: Result<T, TeeError>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) => Self::Failure(e),
        }
    }
}
