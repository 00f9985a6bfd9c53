//! DTOs for the shortening endpoint.

use crate::error::ErrorInfo;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten one or more URLs.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 urls per request"))]
    #[validate(nested)]
    pub urls: Vec<UrlItem>,
}

/// Individual URL to be shortened.
///
/// Only the size is checked here; syntax and scheme are checked per item by
/// the service so one bad URL does not fail the whole batch.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UrlItem {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
}

/// Response containing batch processing results.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub summary: BatchSummary,
    pub items: Vec<ShortenResultItem>,
}

/// Individual result for a URL in the batch.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ShortenResultItem {
    Success {
        full_url: String,
        token: String,
        short_url: String,
        row_id: i64,
    },
    Error {
        full_url: String,
        error: ErrorInfo,
    },
}

/// Summary statistics for batch processing.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_fails_validation() {
        let req: ShortenRequest = serde_json::from_str(r#"{"urls": []}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_empty_url_fails_validation() {
        let req: ShortenRequest = serde_json::from_str(r#"{"urls": [{"url": ""}]}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_malformed_url_passes_request_validation() {
        let req: ShortenRequest =
            serde_json::from_str(r#"{"urls": [{"url": "not a url"}]}"#).unwrap();
        assert!(req.validate().is_ok());
    }
}
