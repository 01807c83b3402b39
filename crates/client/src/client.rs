//! The GraphQL client.

use crate::document::{analyze_document, RequestIntent};
use crate::executor::{
    apply_error_policy, run_request, shape_mismatch, GraphQLResponse, RunRequest,
};
use crate::result::{ExecutionResult, RequestResult, ResponseErrors};
use crate::transport::{ReqwestTransport, Transport};
use crate::{
    BatchRequestsOptions, ClientConfig, ClientError, ErrorResponse, Headers, JsonMap,
    RequestOptions, Result,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Full response of a single operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientResponse {
    pub data: Option<JsonMap>,
    /// Only populated under [`crate::ErrorPolicy::All`].
    pub errors: Option<ResponseErrors>,
    pub extensions: Option<JsonMap>,
    pub status: u16,
    pub headers: Headers,
}

/// A GraphQL client bound to one endpoint.
///
/// Calls take `&self` and may run concurrently; each call reads the endpoint
/// and configuration once when it starts. The setters take `&mut self`, so
/// they cannot race an in-flight call.
///
/// # Examples
///
/// ```no_run
/// use graphql_request::{ClientConfig, GraphQLClient};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Me {
///     me: User,
/// }
///
/// #[derive(Deserialize)]
/// struct User {
///     id: String,
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GraphQLClient::with_config(
///     "https://api.example.com/graphql",
///     ClientConfig::new().with_header("Authorization", "Bearer my-token"),
/// );
/// let me: Me = client.request("{ me { id } }").await?;
/// println!("{}", me.me.id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GraphQLClient<T = ReqwestTransport> {
    endpoint: String,
    config: ClientConfig,
    transport: T,
}

impl GraphQLClient {
    /// Creates a client with default configuration and the reqwest transport.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_config(endpoint, ClientConfig::default())
    }

    #[must_use]
    pub fn with_config(endpoint: impl Into<String>, config: ClientConfig) -> Self {
        Self::with_transport(endpoint, config, ReqwestTransport::new())
    }
}

impl<T: Transport> GraphQLClient<T> {
    #[must_use]
    pub fn with_transport(endpoint: impl Into<String>, config: ClientConfig, transport: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            config,
            transport,
        }
    }

    /// Sends one operation and returns the full response.
    #[tracing::instrument(skip(self, options), fields(endpoint = %self.endpoint))]
    pub async fn raw_request(&self, options: impl Into<RequestOptions>) -> Result<ClientResponse> {
        let options = options.into();
        let document = analyze_document(&options.document, self.config.exclude_operation_name);
        tracing::debug!(
            operation = document.operation_name.as_deref().unwrap_or("<anonymous>"),
            mutation = document.is_mutation,
            "Analyzed document"
        );

        let intent = RequestIntent::single(document, options.variables);
        let response = self
            .execute(&intent, &options.headers, options.signal.as_ref())
            .await?;

        let GraphQLResponse {
            status,
            headers,
            result,
        } = response;

        match result {
            RequestResult::Single(ExecutionResult {
                data,
                errors,
                extensions,
            }) => Ok(ClientResponse {
                data,
                errors,
                extensions,
                status,
                headers,
            }),
            batch @ RequestResult::Batch(_) => Err(shape_mismatch(
                &intent,
                "a single execution result, got a batch",
                ErrorResponse {
                    status,
                    headers,
                    result: Some(batch),
                    body: None,
                },
            )),
        }
    }

    /// Sends one operation and deserializes its `data` into `D`.
    ///
    /// A response without `data` deserializes from `null`, so use an
    /// `Option` when the server may omit it.
    pub async fn request<D: DeserializeOwned>(
        &self,
        options: impl Into<RequestOptions>,
    ) -> Result<D> {
        let response = self.raw_request(options).await?;
        let data = response.data.map_or(Value::Null, Value::Object);
        serde_json::from_value(data).map_err(ClientError::Data)
    }

    /// Sends several operations in one HTTP call.
    ///
    /// Results are returned in the order of the documents, one per document.
    #[tracing::instrument(skip(self, options), fields(endpoint = %self.endpoint))]
    pub async fn batch_requests(
        &self,
        options: impl Into<BatchRequestsOptions>,
    ) -> Result<Vec<ExecutionResult>> {
        let options = options.into();
        let count = options.documents.len();
        let exclude_operation_name = self.config.exclude_operation_name;
        let intent = RequestIntent::batch(options.documents.into_iter().map(|entry| {
            (
                analyze_document(&entry.document, exclude_operation_name),
                entry.variables,
            )
        }));
        tracing::debug!(
            documents = count,
            mutations = intent.has_mutations(),
            "Analyzed batch"
        );

        let response = self
            .execute(&intent, &options.headers, options.signal.as_ref())
            .await?;

        match response.result {
            RequestResult::Batch(results) => Ok(results),
            single @ RequestResult::Single(_) => Err(shape_mismatch(
                &intent,
                "an array of execution results for a batch request",
                ErrorResponse {
                    status: response.status,
                    headers: response.headers,
                    result: Some(single),
                    body: None,
                },
            )),
        }
    }

    async fn execute(
        &self,
        intent: &RequestIntent,
        headers: &Headers,
        signal: Option<&CancellationToken>,
    ) -> Result<GraphQLResponse> {
        let outcome = run_request(RunRequest {
            endpoint: &self.endpoint,
            intent,
            config: &self.config,
            headers,
            transport: &self.transport,
            signal,
        })
        .await?;

        apply_error_policy(outcome.into_result()?, self.config.error_policy, intent)
    }

    /// Replaces all default headers.
    pub fn set_headers(&mut self, headers: Headers) -> &mut Self {
        self.config.headers = headers;
        self
    }

    /// Sets one default header. All subsequent requests will send it.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.config.headers.insert(name, value);
        self
    }

    /// Changes the endpoint. All subsequent requests go to `endpoint`.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.endpoint = endpoint.into();
        tracing::debug!(endpoint = %self.endpoint, "Endpoint changed");
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}
