//! Minimal GraphQL client over HTTP.
//!
//! This crate sends GraphQL queries and mutations to an endpoint, alone or
//! batched into one HTTP call, and normalizes whatever the server returns into
//! a typed result or a [`ClientError`].
//!
//! # Examples
//!
//! ## One-off request
//!
//! ```no_run
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let data: Value = graphql_request::request(
//!         "https://api.example.com/graphql",
//!         "{ me { id name } }",
//!     )
//!     .await?;
//!     println!("{data}");
//!     Ok(())
//! }
//! ```
//!
//! ## Configured client
//!
//! ```no_run
//! use graphql_request::{ClientConfig, ErrorPolicy, GraphQLClient, Method, RequestOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new()
//!         .with_header("Authorization", "Bearer my-token")
//!         .with_method(Method::Get)
//!         .with_error_policy(ErrorPolicy::All);
//!     let client = GraphQLClient::with_config("https://api.example.com/graphql", config);
//!
//!     let variables = json!({"id": "1"}).as_object().cloned().unwrap_or_default();
//!     let response = client
//!         .raw_request(
//!             RequestOptions::new("query User($id: ID!) { user(id: $id) { name } }")
//!                 .with_variables(variables),
//!         )
//!         .await?;
//!     println!("{:?} {:?}", response.data, response.errors);
//!     Ok(())
//! }
//! ```
//!
//! ## Batching
//!
//! ```no_run
//! use graphql_request::GraphQLClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GraphQLClient::new("https://api.example.com/graphql");
//!     let results = client.batch_requests(vec!["{ a }", "{ b }"]).await?;
//!     assert_eq!(results.len(), 2);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod document;
mod encode;
mod error;
mod executor;
mod headers;
mod options;
mod result;
mod transport;

pub use client::{ClientResponse, GraphQLClient};
pub use config::{
    BoxError, ClientConfig, ErrorPolicy, Method, RequestMiddleware, ResponseMiddleware,
};
pub use document::{analyze_document, Document, RequestIntent};
pub use encode::{clean_query, effective_method, encode_request, ACCEPT};
pub use error::{ClientError, ErrorResponse, RequestContext, Result};
pub use executor::{apply_error_policy, run_request, GraphQLResponse, Outcome, RunRequest};
pub use headers::Headers;
pub use options::{BatchRequestDocument, BatchRequestsOptions, RequestOptions};
pub use result::{
    is_graphql_content_type, parse_execution_result, parse_graphql_execution_result,
    ExecutionResult, InvalidResult, JsonMap, RequestResult, ResponseErrors, CONTENT_TYPE_GQL,
    CONTENT_TYPE_JSON,
};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

/// Variables of one operation.
pub type Variables = JsonMap;

/// Sends one operation to `url` and deserializes its `data`.
///
/// This is a convenience wrapper around a default [`GraphQLClient`].
#[tracing::instrument(skip(options))]
pub async fn request<D: serde::de::DeserializeOwned>(
    url: &str,
    options: impl Into<RequestOptions>,
) -> Result<D> {
    GraphQLClient::new(url).request(options).await
}

/// Sends one operation to `url` and returns the full response.
#[tracing::instrument(skip(options))]
pub async fn raw_request(url: &str, options: impl Into<RequestOptions>) -> Result<ClientResponse> {
    GraphQLClient::new(url).raw_request(options).await
}

/// Sends several operations to `url` in one HTTP call.
#[tracing::instrument(skip(options))]
pub async fn batch_requests(
    url: &str,
    options: impl Into<BatchRequestsOptions>,
) -> Result<Vec<ExecutionResult>> {
    GraphQLClient::new(url).batch_requests(options).await
}
