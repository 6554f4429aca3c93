//! Result of one prediction request.

use crate::domain::{PredictionResponse, PredictionResult};

/// Caller-visible message for any internal failure. Details only go to the log.
pub const INTERNAL_PROCESSING_ERROR: &str = "Internal processing error";
pub const SERVICE_UNAVAILABLE: &str = "Model service unavailable";

/// Opaque failure reason safe to hand to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureReason {
    message: &'static str,
}

impl FailureReason {
    pub fn internal() -> Self {
        Self {
            message: INTERNAL_PROCESSING_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        self.message
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Ready(PredictionResult),
    /// No artifact is loaded; every request fails this way until restart.
    Unavailable,
    /// The request could not be processed; the model remains usable.
    Failed(FailureReason),
}

impl PredictionOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PredictionOutcome::Ready(_))
    }

    /// HTTP status a web front-end should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            PredictionOutcome::Ready(_) => 200,
            PredictionOutcome::Unavailable => 503,
            PredictionOutcome::Failed(_) => 500,
        }
    }

    /// Wire response, or the caller-safe error detail.
    pub fn into_response(self) -> Result<PredictionResponse, &'static str> {
        match self {
            PredictionOutcome::Ready(result) => Ok(result.into()),
            PredictionOutcome::Unavailable => Err(SERVICE_UNAVAILABLE),
            PredictionOutcome::Failed(reason) => Err(reason.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurrencyUnit;

    #[test]
    fn outcomes_map_to_distinct_statuses() {
        let ready = PredictionOutcome::Ready(PredictionResult {
            estimate: 10.0,
            lower_bound: 8.0,
            upper_bound: 12.0,
            unit: CurrencyUnit::Uf,
        });
        assert_eq!(ready.status_code(), 200);
        assert_eq!(PredictionOutcome::Unavailable.status_code(), 503);
        assert_eq!(PredictionOutcome::Failed(FailureReason::internal()).status_code(), 500);

        assert_eq!(ready.into_response().unwrap().estimated_price_uf, 10.0);
        assert_eq!(
            PredictionOutcome::Unavailable.into_response().unwrap_err(),
            SERVICE_UNAVAILABLE
        );
        assert_eq!(
            PredictionOutcome::Failed(FailureReason::internal())
                .into_response()
                .unwrap_err(),
            INTERNAL_PROCESSING_ERROR
        );
    }
}
