use thiserror::Error;

/// Network-layer failure, distinct from a well-formed HTTP error response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("server unreachable: {0}")]
    Unreachable(String),
    #[error("request aborted")]
    Aborted,
}

/// The fixed causes a login attempt can fail with.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("User doesn't exists")]
    UserNotFound,
    #[error("Failed to connect to the server")]
    Unreachable,
    #[error("Failed to json parse the response")]
    MalformedResponse,
}

impl AuthError {
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Failure of a single, non-retried call against the entity endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("server responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to decode response body: {0}")]
    Decode(String),
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Outcome of a rejected form submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{}", .0.join("\n"))]
    Invalid(Vec<String>),
    #[error("Error while posting")]
    Rejected,
    #[error("You are not allowed to do that")]
    Forbidden,
    #[error("{0}")]
    Auth(#[from] AuthError),
}

impl SubmitError {
    /// A write the server refused or never received.
    pub(crate) fn rejected(err: ApiError) -> Self {
        tracing::warn!(error = %err, "write failed");
        SubmitError::Rejected
    }

    /// Messages as a form would list them.
    pub fn messages(&self) -> Vec<String> {
        match self {
            SubmitError::Invalid(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_messages_are_fixed() {
        assert_eq!(AuthError::UserNotFound.message(), "User doesn't exists");
        assert_eq!(
            AuthError::Unreachable.message(),
            "Failed to connect to the server"
        );
        assert_eq!(
            AuthError::MalformedResponse.message(),
            "Failed to json parse the response"
        );
    }

    #[test]
    fn submit_error_lists_every_violation() {
        let err = SubmitError::Invalid(vec!["a".into(), "b".into()]);
        assert_eq!(err.messages(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(SubmitError::Rejected.messages(), vec!["Error while posting"]);
    }
}
