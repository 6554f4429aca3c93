//! Shared request-serving logic used by the `predict` command.
//!
//! Keeping this in one place avoids duplicating the request workflow:
//! JSON body -> input validation -> shared context -> tagged outcome

use std::path::Path;

use rayon::prelude::*;
use serde_json::json;
use tracing::info;

use crate::domain::{PropertyFeatures, PropertyInput};
use crate::error::OracleError;
use crate::serve::{PredictionOutcome, ServingContext};

/// Result of serving one request body.
#[derive(Debug)]
pub struct ServedRequest {
    /// 1-based line of the request in its batch file.
    pub line: usize,
    pub outcome: Result<(PropertyFeatures, PredictionOutcome), OracleError>,
}

impl ServedRequest {
    pub fn is_ready(&self) -> bool {
        matches!(&self.outcome, Ok((_, outcome)) if outcome.is_ready())
    }

    /// Wire body for this request: the response, or a `detail` message.
    pub fn to_json(&self) -> serde_json::Value {
        match &self.outcome {
            Ok((_, outcome)) => match outcome.clone().into_response() {
                Ok(response) => json!({
                    "line": self.line,
                    "status": 200,
                    "response": response,
                }),
                Err(detail) => json!({
                    "line": self.line,
                    "status": outcome.status_code(),
                    "detail": detail,
                }),
            },
            Err(e) => json!({
                "line": self.line,
                "status": 422,
                "detail": e.to_string(),
            }),
        }
    }
}

/// Decode and validate one JSON request body.
pub fn parse_request(body: &str) -> Result<PropertyFeatures, OracleError> {
    let input: PropertyInput = serde_json::from_str(body)
        .map_err(|e| OracleError::InvalidInput(format!("malformed request body: {e}")))?;
    input.validate()
}

/// Serve one request body against the shared context.
pub fn serve_request(context: &ServingContext, body: &str) -> Result<(PropertyFeatures, PredictionOutcome), OracleError> {
    let features = parse_request(body)?;
    let outcome = context.predict(&features);
    Ok((features, outcome))
}

/// Serve every non-empty line of a JSON-lines file in parallel.
///
/// Results come back in file order.
pub fn serve_batch(context: &ServingContext, path: &Path) -> Result<Vec<ServedRequest>, OracleError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| OracleError::io(format!("failed to read batch file '{}'", path.display()), e))?;

    let requests: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| (i + 1, l))
        .collect();

    let served: Vec<ServedRequest> = requests
        .par_iter()
        .map(|&(line, body)| ServedRequest {
            line,
            outcome: serve_request(context, body),
        })
        .collect();

    let ready = served.iter().filter(|s| s.is_ready()).count();
    info!(requests = served.len(), ready, "Served batch");
    Ok(served)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parse_request_validates_contract() {
        let features =
            parse_request(r#"{"comuna": "Providencia", "surface_m2": 55, "distance_to_metro": 350}"#).unwrap();
        assert_eq!(features.district, "Providencia");
        assert_eq!(features.surface_m2, 55.0);

        assert!(parse_request(r#"{"comuna": "Atlantis", "surface_m2": 55, "distance_to_metro": 350}"#).is_err());
        assert!(parse_request(r#"{"comuna": "Macul"}"#).is_err());
        assert!(parse_request("not json").is_err());
    }

    #[test]
    fn batch_against_unavailable_context_keeps_order_and_tags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"comuna": "Macul", "surface_m2": 40, "distance_to_metro": 200}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"comuna": "Nowhere", "surface_m2": 40, "distance_to_metro": 200}}"#).unwrap();

        let served = serve_batch(&ServingContext::unavailable(), file.path()).unwrap();
        assert_eq!(served.len(), 2);
        assert_eq!(served[0].line, 1);
        assert!(matches!(&served[0].outcome, Ok((_, PredictionOutcome::Unavailable))));
        assert_eq!(served[0].to_json()["status"], 503);

        assert_eq!(served[1].line, 3);
        assert!(served[1].outcome.is_err());
        assert_eq!(served[1].to_json()["status"], 422);
    }
}
