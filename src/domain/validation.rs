//! Request validation
//!
//! Enforces the request invariants before any provider is touched. The
//! checks mirror the `validator` annotations on the domain types but work on
//! the trimmed text, so whitespace-only input is rejected too.

use crate::domain::error::{Error, Result};
use crate::domain::types::SynthesisRequest;
use crate::infrastructure::constants::MAX_TEXT_CHARS;

/// Validate a synthesis request, classifying violations as `InvalidRequest`
pub fn validate_request(request: &SynthesisRequest) -> Result<()> {
    let trimmed = request.text.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_request("text must not be empty"));
    }
    let chars = trimmed.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(Error::invalid_request(format!(
            "text is too long: {} > {} characters",
            chars, MAX_TEXT_CHARS
        )));
    }
    if !(-100..=100).contains(&request.rate) {
        return Err(Error::invalid_request(format!(
            "rate {} is out of range [-100, 100]",
            request.rate
        )));
    }
    if !(-100..=100).contains(&request.pitch) {
        return Err(Error::invalid_request(format!(
            "pitch {} is out of range [-100, 100]",
            request.pitch
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_request() {
        let request = SynthesisRequest::new("hello world");
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn rejects_empty_text() {
        let request = SynthesisRequest::new("");
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn rejects_whitespace_only_text() {
        let request = SynthesisRequest::new("   \n\t  ");
        let err = validate_request(&request).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }));
    }

    #[test]
    fn rejects_overlong_text() {
        let request = SynthesisRequest::new("x".repeat(MAX_TEXT_CHARS + 1));
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn accepts_text_at_limit_after_trim() {
        let request = SynthesisRequest::new(format!("  {}  ", "x".repeat(MAX_TEXT_CHARS)));
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn rejects_out_of_range_rate_and_pitch() {
        let mut request = SynthesisRequest::new("hi");
        request.rate = 101;
        assert!(validate_request(&request).is_err());

        let mut request = SynthesisRequest::new("hi");
        request.pitch = -101;
        assert!(validate_request(&request).is_err());
    }
}
