//! Image-generation error types

use thiserror::Error;

/// Errors that can occur during an image-generation call
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Error reported by the image API, message text as received
    #[error("API error: {message}")]
    Api { message: String },

    /// The call settled but carried no usable image payload
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GenerateError {
    /// Check if this error signals rate limiting
    ///
    /// Classification inspects only the message text: a 429 status code,
    /// quota exhaustion wording, or the RESOURCE_EXHAUSTED marker. Every
    /// other failure is permanent.
    pub fn is_rate_limit(&self) -> bool {
        is_rate_limit_message(&self.to_string())
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    message.contains("429") || lower.contains("quota") || lower.contains("resource_exhausted")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(message: &str) -> GenerateError {
        GenerateError::Api {
            message: message.to_string(),
        }
    }

    #[test]
    fn test_http_status_classified() {
        assert!(api("429 Too Many Requests").is_rate_limit());
        assert!(api("got status 429 from upstream").is_rate_limit());
        assert!(!api("500 Internal Server Error").is_rate_limit());
    }

    #[test]
    fn test_quota_wording_classified() {
        assert!(api("Quota exceeded for requests per minute").is_rate_limit());
        assert!(api("You have run out of quota").is_rate_limit());
    }

    #[test]
    fn test_resource_exhausted_marker_classified() {
        assert!(api("RESOURCE_EXHAUSTED: try again later").is_rate_limit());
        assert!(api("resource_exhausted").is_rate_limit());
    }

    #[test]
    fn test_other_errors_are_permanent() {
        assert!(!api("invalid argument: bad image data").is_rate_limit());
        assert!(!api("safety filters rejected the prompt").is_rate_limit());
        assert!(!GenerateError::InvalidResponse("no image part in response".to_string()).is_rate_limit());
    }
}
