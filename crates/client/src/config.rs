//! Client configuration.

use crate::executor::Outcome;
use crate::transport::HttpRequest;
use crate::Headers;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Boxed error returned by request middleware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Hook invoked with the fully built request before it is transmitted.
///
/// Returning an error aborts the call without sending anything.
pub type RequestMiddleware =
    Arc<dyn Fn(HttpRequest) -> Result<HttpRequest, BoxError> + Send + Sync>;

/// Hook invoked with the outcome of every call that reached the server.
pub type ResponseMiddleware = Arc<dyn Fn(&Outcome) + Send + Sync>;

/// Preferred HTTP method.
///
/// `Get` only applies to single, non-mutation operations; everything else
/// falls back to `Post`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    #[serde(alias = "POST")]
    Post,
    #[serde(alias = "GET")]
    Get,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Get => "GET",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("post") {
            Ok(Self::Post)
        } else if s.eq_ignore_ascii_case("get") {
            Ok(Self::Get)
        } else {
            Err(format!("Unsupported HTTP method '{s}'. Expected GET or POST"))
        }
    }
}

/// What to do with GraphQL `errors` in an otherwise successful response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Fail the call with [`crate::ClientError::GraphQL`].
    #[default]
    None,
    /// Return the data and drop the errors.
    Ignore,
    /// Return both the data and the errors.
    All,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Ignore => "ignore",
            Self::All => "all",
        })
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "ignore" => Ok(Self::Ignore),
            "all" => Ok(Self::All),
            _ => Err(format!(
                "Unsupported error policy '{s}'. Expected none, ignore or all"
            )),
        }
    }
}

/// Per-client request configuration.
///
/// # Examples
///
/// ```no_run
/// use graphql_request::{ClientConfig, ErrorPolicy, Method};
///
/// let config = ClientConfig::new()
///     .with_header("Authorization", "Bearer my-token")
///     .with_method(Method::Get)
///     .with_error_policy(ErrorPolicy::All);
/// ```
#[derive(Clone, Default)]
pub struct ClientConfig {
    pub(crate) headers: Headers,
    pub(crate) method: Method,
    pub(crate) request_middleware: Option<RequestMiddleware>,
    pub(crate) response_middleware: Option<ResponseMiddleware>,
    pub(crate) exclude_operation_name: bool,
    pub(crate) error_policy: ErrorPolicy,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("headers", &self.headers)
            .field("method", &self.method)
            .field("request_middleware", &self.request_middleware.is_some())
            .field("response_middleware", &self.response_middleware.is_some())
            .field("exclude_operation_name", &self.exclude_operation_name)
            .field("error_policy", &self.error_policy)
            .finish()
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a default header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds multiple default headers from an iterator.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.extend(headers);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Leaves `operationName` out of every request.
    #[must_use]
    pub fn with_exclude_operation_name(mut self, exclude: bool) -> Self {
        self.exclude_operation_name = exclude;
        self
    }

    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    #[must_use]
    pub fn with_request_middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(HttpRequest) -> Result<HttpRequest, BoxError> + Send + Sync + 'static,
    {
        self.request_middleware = Some(Arc::new(middleware));
        self
    }

    #[must_use]
    pub fn with_response_middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(&Outcome) + Send + Sync + 'static,
    {
        self.response_middleware = Some(Arc::new(middleware));
        self
    }

    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub const fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    #[must_use]
    pub const fn exclude_operation_name(&self) -> bool {
        self.exclude_operation_name
    }
}
