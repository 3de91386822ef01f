//! HTTP client error types shared by every provider client.

use std::sync::Arc;

use reqwest::StatusCode;
use swingset_core::ProviderError;

/// Errors from the provider HTTP clients.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Provider API key is not configured.
    #[error("missing API key: {0} not set")]
    MissingApiKey(&'static str),

    /// Invalid request parameters.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid count parameter.
    #[error("invalid count: must be 1-{max}")]
    InvalidCount { max: usize },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// Rate limited by the provider.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ClientError::Timeout } else { ClientError::Network(Arc::new(err)) }
    }
}

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::MissingApiKey(var) => ProviderError::MissingApiKey(var.to_string()),
            ClientError::InvalidQuery(msg) => ProviderError::InvalidRequest(msg),
            ClientError::InvalidCount { .. } => ProviderError::InvalidRequest(err.to_string()),
            ClientError::AuthError => ProviderError::Auth,
            ClientError::RateLimited => ProviderError::RateLimited,
            ClientError::HttpError { status } => ProviderError::Http { status },
            ClientError::Timeout => ProviderError::Timeout,
            ClientError::Network(e) => ProviderError::Network(e.to_string()),
            ClientError::Parse(msg) => ProviderError::Parse(msg),
        }
    }
}

/// Map a response status to the typed error it represents, if any.
pub(crate) fn check_status(status: StatusCode) -> Result<(), ClientError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ClientError::AuthError);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ClientError::RateLimited);
    }

    if status.is_client_error() || status.is_server_error() {
        return Err(ClientError::HttpError { status: status.as_u16() });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::MissingApiKey("SWINGSET_BRAVE_API_KEY");
        assert!(err.to_string().contains("SWINGSET_BRAVE_API_KEY"));

        let err = ClientError::InvalidQuery("test".to_string());
        assert!(err.to_string().contains("invalid query"));
    }

    #[test]
    fn test_status_mapping() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(check_status(StatusCode::UNAUTHORIZED), Err(ClientError::AuthError)));
        assert!(matches!(check_status(StatusCode::FORBIDDEN), Err(ClientError::AuthError)));
        assert!(matches!(check_status(StatusCode::TOO_MANY_REQUESTS), Err(ClientError::RateLimited)));
        assert!(matches!(check_status(StatusCode::BAD_GATEWAY), Err(ClientError::HttpError { status: 502 })));
        assert!(matches!(check_status(StatusCode::NOT_FOUND), Err(ClientError::HttpError { status: 404 })));
    }

    #[test]
    fn test_into_provider_error() {
        assert!(matches!(ProviderError::from(ClientError::RateLimited), ProviderError::RateLimited));
        assert!(matches!(ProviderError::from(ClientError::AuthError), ProviderError::Auth));
        assert!(matches!(
            ProviderError::from(ClientError::HttpError { status: 500 }),
            ProviderError::Http { status: 500 }
        ));
        assert!(matches!(
            ProviderError::from(ClientError::MissingApiKey("X")),
            ProviderError::MissingApiKey(var) if var == "X"
        ));
    }
}
