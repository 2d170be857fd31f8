//! Decoded remote responses.

/// A response from the remote feed service.
///
/// Carries the numeric status code, the status message and, for successful
/// calls, the decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// Status code (HTTP semantics).
    pub code: u16,
    /// Status message / reason phrase.
    pub message: String,
    /// Decoded payload, if any.
    pub body: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Creates a `200 OK` response carrying `body`.
    pub fn ok(body: T) -> Self {
        Self {
            code: 200,
            message: "OK".into(),
            body: Some(body),
        }
    }

    /// Creates a response with no payload.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            body: None,
        }
    }

    /// Returns true for a 2xx status code.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.code)
    }

    /// Maps the payload, keeping status code and message.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            code: self.code,
            message: self.message,
            body: self.body.map(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(ApiResponse::ok(()).is_success());
        assert!(ApiResponse::<()>::status(204, "No Content").is_success());
        assert!(!ApiResponse::<()>::status(199, "").is_success());
        assert!(!ApiResponse::<()>::status(404, "Not Found").is_success());
        assert!(!ApiResponse::<()>::status(500, "Internal Server Error").is_success());
    }

    #[test]
    fn map_keeps_status() {
        let mapped = ApiResponse::ok(vec![1, 2, 3]).map(|v| v.len());
        assert_eq!(mapped.code, 200);
        assert_eq!(mapped.body, Some(3));
    }
}
