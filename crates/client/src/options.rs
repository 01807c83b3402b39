//! Canonical per-call options.
//!
//! Every call shape the client accepts (a bare document, a document with
//! variables, a full options value) converts into one of these types before
//! anything else happens.

use crate::{Headers, Variables};
use tokio_util::sync::CancellationToken;

/// Options for a single operation.
///
/// ```
/// use graphql_request::RequestOptions;
/// use serde_json::json;
///
/// let options = RequestOptions::new("query GetUser($id: ID!) { user(id: $id) { name } }")
///     .with_variables(json!({"id": "1"}).as_object().cloned().unwrap_or_default())
///     .with_header("X-Request-ID", "12345");
/// assert_eq!(options.headers.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub document: String,
    pub variables: Option<Variables>,
    /// Headers for this call only, layered over the client's defaults.
    pub headers: Headers,
    /// Cancels the call while it waits on the transport.
    pub signal: Option<CancellationToken>,
}

impl RequestOptions {
    #[must_use]
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = Some(variables);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers.overlay(&headers);
        self
    }

    #[must_use]
    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

impl From<&str> for RequestOptions {
    fn from(document: &str) -> Self {
        Self::new(document)
    }
}

impl From<String> for RequestOptions {
    fn from(document: String) -> Self {
        Self::new(document)
    }
}

impl<S: Into<String>> From<(S, Variables)> for RequestOptions {
    fn from((document, variables): (S, Variables)) -> Self {
        Self::new(document).with_variables(variables)
    }
}

/// One document of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchRequestDocument {
    pub document: String,
    pub variables: Option<Variables>,
}

impl BatchRequestDocument {
    #[must_use]
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            variables: None,
        }
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = Some(variables);
        self
    }
}

impl From<&str> for BatchRequestDocument {
    fn from(document: &str) -> Self {
        Self::new(document)
    }
}

impl From<String> for BatchRequestDocument {
    fn from(document: String) -> Self {
        Self::new(document)
    }
}

impl<S: Into<String>> From<(S, Variables)> for BatchRequestDocument {
    fn from((document, variables): (S, Variables)) -> Self {
        Self::new(document).with_variables(variables)
    }
}

/// Options for a batch of operations sent in one HTTP call.
#[derive(Debug, Clone, Default)]
pub struct BatchRequestsOptions {
    pub documents: Vec<BatchRequestDocument>,
    pub headers: Headers,
    pub signal: Option<CancellationToken>,
}

impl BatchRequestsOptions {
    pub fn new<I, D>(documents: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<BatchRequestDocument>,
    {
        Self {
            documents: documents.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

impl<D: Into<BatchRequestDocument>> From<Vec<D>> for BatchRequestsOptions {
    fn from(documents: Vec<D>) -> Self {
        Self::new(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_options_from_document() {
        let options = RequestOptions::from("{ me { id } }");
        assert_eq!(options.document, "{ me { id } }");
        assert!(options.variables.is_none());
        assert!(options.headers.is_empty());
        assert!(options.signal.is_none());
    }

    #[test]
    fn test_request_options_from_tuple() {
        let variables = json!({"id": 1}).as_object().cloned().unwrap();
        let options = RequestOptions::from(("query Q($id: Int) { a(id: $id) }", variables.clone()));
        assert_eq!(options.variables, Some(variables));
    }

    #[test]
    fn test_batch_options_from_mixed_documents() {
        let options = BatchRequestsOptions::from(vec![
            BatchRequestDocument::new("{ a }"),
            BatchRequestDocument::new("{ b }")
                .with_variables(json!({"x": 1}).as_object().cloned().unwrap()),
        ])
        .with_header("X-Batch", "1");

        assert_eq!(options.documents.len(), 2);
        assert!(options.documents[0].variables.is_none());
        assert!(options.documents[1].variables.is_some());
        assert_eq!(options.headers.get("x-batch"), Some("1"));
    }
}
