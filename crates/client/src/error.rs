use crate::config::BoxError;
use crate::result::{InvalidResult, RequestResult, ResponseErrors};
use crate::transport::TransportError;
use crate::{Headers, JsonMap, Variables};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// The request that failed, as reported on [`ClientError`].
#[derive(Debug, Clone, PartialEq)]
pub enum RequestContext {
    Single {
        query: String,
        variables: Option<Variables>,
    },
    Batch {
        queries: Vec<String>,
        variables: Vec<Option<Variables>>,
    },
}

/// What the server sent back for a failed call.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub status: u16,
    pub headers: Headers,
    /// The normalized body, when it could be parsed as a GraphQL result.
    pub result: Option<RequestResult>,
    /// The raw body text, when the body was not (or could not be) normalized.
    pub body: Option<String>,
}

impl ErrorResponse {
    /// `data` of a single result.
    #[must_use]
    pub fn data(&self) -> Option<&JsonMap> {
        match &self.result {
            Some(RequestResult::Single(result)) => result.data.as_ref(),
            _ => None,
        }
    }

    /// `errors` of a single result.
    #[must_use]
    pub fn errors(&self) -> Option<&ResponseErrors> {
        match &self.result {
            Some(RequestResult::Single(result)) => result.errors.as_ref(),
            _ => None,
        }
    }

    /// `extensions` of a single result.
    #[must_use]
    pub fn extensions(&self) -> Option<&JsonMap> {
        match &self.result {
            Some(RequestResult::Single(result)) => result.extensions.as_ref(),
            _ => None,
        }
    }

    /// Human-readable summary of the GraphQL errors, falling back to the status.
    fn summary(&self) -> String {
        let messages: Vec<&str> = match &self.result {
            Some(RequestResult::Single(result)) => result
                .errors
                .as_ref()
                .map(ResponseErrors::messages)
                .unwrap_or_default(),
            Some(RequestResult::Batch(results)) => results
                .iter()
                .filter_map(|r| r.errors.as_ref())
                .flat_map(ResponseErrors::messages)
                .collect(),
            None => Vec::new(),
        };

        if messages.is_empty() {
            format!("GraphQL Error (Code: {})", self.status)
        } else {
            messages.join("; ")
        }
    }

    fn body_excerpt(&self) -> &str {
        const MAX_LEN: usize = 200;
        let body = self.body.as_deref().unwrap_or_default();
        match body.char_indices().nth(MAX_LEN) {
            Some((end, _)) => &body[..end],
            None => body,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Request middleware refused the request.
    #[error("Request middleware failed: {0}")]
    Middleware(#[source] BoxError),

    #[error("Invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    /// The server answered with a non-2xx status.
    #[error("HTTP error {}: {}", .response.status, .response.body_excerpt())]
    HttpStatus {
        request: Box<RequestContext>,
        response: Box<ErrorResponse>,
    },

    /// The body of a 2xx response is not a GraphQL result.
    #[error("{reason} (HTTP {})", .response.status)]
    Validation {
        reason: InvalidResult,
        request: Box<RequestContext>,
        response: Box<ErrorResponse>,
    },

    /// The response is well formed but carries GraphQL errors.
    #[error("{}", .response.summary())]
    GraphQL {
        request: Box<RequestContext>,
        response: Box<ErrorResponse>,
    },

    /// `data` did not deserialize into the requested type.
    #[error("Failed to decode response data: {0}")]
    Data(#[source] serde_json::Error),
}

impl ClientError {
    /// The request this error relates to, for response-bearing errors.
    #[must_use]
    pub fn request(&self) -> Option<&RequestContext> {
        match self {
            Self::HttpStatus { request, .. }
            | Self::Validation { request, .. }
            | Self::GraphQL { request, .. } => Some(request.as_ref()),
            _ => None,
        }
    }

    /// The server response, for response-bearing errors.
    #[must_use]
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            Self::HttpStatus { response, .. }
            | Self::Validation { response, .. }
            | Self::GraphQL { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }

    /// HTTP status of the response, if one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }
}
