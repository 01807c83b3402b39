//! Request execution pipeline.
//!
//! A call moves through encode, request middleware, transport, response
//! normalization and response middleware, in that order and exactly once.
//! Transport and middleware failures end the call immediately. Everything the
//! server sends back becomes an [`Outcome`].

use crate::document::RequestIntent;
use crate::encode::{encode_request, has_graphql_content_type};
use crate::error::ErrorResponse;
use crate::result::{parse_graphql_execution_result, InvalidResult, RequestResult};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::{ClientConfig, ClientError, ErrorPolicy, Headers};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// A normalized response from a 2xx call.
///
/// GraphQL `errors` may still be present in `result`; see [`ErrorPolicy`].
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQLResponse {
    pub status: u16,
    pub headers: Headers,
    pub result: RequestResult,
}

/// Result of a call that reached the server.
#[derive(Debug)]
pub enum Outcome {
    Success(GraphQLResponse),
    Failed(ClientError),
}

impl Outcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> Result<GraphQLResponse, ClientError> {
        match self {
            Self::Success(response) => Ok(response),
            Self::Failed(error) => Err(error),
        }
    }
}

/// Inputs of one execution.
pub struct RunRequest<'a, T> {
    pub endpoint: &'a str,
    pub intent: &'a RequestIntent,
    pub config: &'a ClientConfig,
    /// Per-call headers, layered over the configured defaults.
    pub headers: &'a Headers,
    pub transport: &'a T,
    pub signal: Option<&'a CancellationToken>,
}

/// Executes one request.
///
/// Returns `Err` when the request could not be built, was refused by request
/// middleware, or failed in transport; response middleware does not run in
/// those cases. Otherwise returns the [`Outcome`] after response middleware
/// has observed it.
#[tracing::instrument(skip_all, fields(endpoint = input.endpoint, kind = input.intent.kind()))]
pub async fn run_request<T: Transport>(input: RunRequest<'_, T>) -> Result<Outcome, ClientError> {
    let RunRequest {
        endpoint,
        intent,
        config,
        headers,
        transport,
        signal,
    } = input;

    let mut request = encode_request(endpoint, intent, config.method, &config.headers, headers)?;

    if let Some(middleware) = &config.request_middleware {
        tracing::debug!("Applying request middleware");
        request = middleware(request).map_err(|e| {
            tracing::warn!(error = %e, "Request middleware failed");
            ClientError::Middleware(e)
        })?;
    }

    tracing::info!(method = %request.method, url = %request.url, "Sending GraphQL request");
    let response = send(transport, request, signal).await.map_err(|e| {
        tracing::warn!(error = %e, "Transport failed");
        ClientError::from(e)
    })?;
    tracing::debug!(status = response.status, "Received response");

    let outcome = normalize(intent, response);
    match &outcome {
        Outcome::Success(response) => tracing::info!(
            status = response.status,
            has_errors = response.result.has_errors(),
            "GraphQL request complete"
        ),
        Outcome::Failed(error) => tracing::error!(error = %error, "GraphQL request failed"),
    }

    if let Some(middleware) = &config.response_middleware {
        middleware(&outcome);
    }

    Ok(outcome)
}

async fn send<T: Transport>(
    transport: &T,
    request: HttpRequest,
    signal: Option<&CancellationToken>,
) -> Result<HttpResponse, TransportError> {
    match signal {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => Err(TransportError::Aborted),
            response = transport.send(request) => response,
        },
        None => transport.send(request).await,
    }
}

/// Classifies a received response.
///
/// A non-2xx response always fails with [`ClientError::HttpStatus`], carrying
/// the parsed body when it had a GraphQL shape. A 2xx response fails with
/// [`ClientError::Validation`] when its body is not a GraphQL result, or when
/// the result does not match the single or batch shape of `intent`.
fn normalize(intent: &RequestIntent, response: HttpResponse) -> Outcome {
    let request = intent.context();
    let success = response.is_success();
    let HttpResponse {
        status,
        headers,
        body,
    } = response;

    let parsed = if has_graphql_content_type(&headers) {
        serde_json::from_str::<Value>(&body)
            .map_err(|e| InvalidResult::json(&e))
            .and_then(parse_graphql_execution_result)
    } else if success {
        parse_graphql_execution_result(Value::String(body.clone()))
    } else {
        tracing::debug!(status, "Non-GraphQL error response, skipping body parsing");
        return Outcome::Failed(ClientError::HttpStatus {
            request: Box::new(request),
            response: Box::new(ErrorResponse {
                status,
                headers,
                result: None,
                body: Some(body),
            }),
        });
    };

    match parsed {
        Ok(result) if success => match expected_shape(intent, &result) {
            None => Outcome::Success(GraphQLResponse {
                status,
                headers,
                result,
            }),
            Some(expected) => Outcome::Failed(shape_mismatch(
                intent,
                &expected,
                ErrorResponse {
                    status,
                    headers,
                    result: Some(result),
                    body: Some(body),
                },
            )),
        },
        Ok(result) => Outcome::Failed(ClientError::HttpStatus {
            request: Box::new(request),
            response: Box::new(ErrorResponse {
                status,
                headers,
                result: Some(result),
                body: Some(body),
            }),
        }),
        Err(reason) if success => Outcome::Failed(ClientError::Validation {
            reason,
            request: Box::new(request),
            response: Box::new(ErrorResponse {
                status,
                headers,
                result: None,
                body: Some(body),
            }),
        }),
        Err(reason) => {
            tracing::debug!(status, %reason, "Unparseable error response");
            Outcome::Failed(ClientError::HttpStatus {
                request: Box::new(request),
                response: Box::new(ErrorResponse {
                    status,
                    headers,
                    result: None,
                    body: Some(body),
                }),
            })
        }
    }
}

/// What `intent` expected instead of `result`, if the two disagree.
///
/// A batch must answer with one result per document.
fn expected_shape(intent: &RequestIntent, result: &RequestResult) -> Option<String> {
    match (intent, result) {
        (RequestIntent::Single { .. }, RequestResult::Batch(_)) => {
            Some("a single execution result, got a batch".to_string())
        }
        (RequestIntent::Batch { .. }, RequestResult::Single(_)) => {
            Some("an array of execution results for a batch request".to_string())
        }
        (RequestIntent::Batch { documents, .. }, RequestResult::Batch(results))
            if documents.len() != results.len() =>
        {
            Some(format!(
                "{} execution results, got {}",
                documents.len(),
                results.len()
            ))
        }
        _ => None,
    }
}

pub(crate) fn shape_mismatch(
    intent: &RequestIntent,
    expected: &str,
    response: ErrorResponse,
) -> ClientError {
    tracing::warn!(
        status = response.status,
        kind = intent.kind(),
        expected,
        "Response shape does not match request"
    );
    ClientError::Validation {
        reason: InvalidResult::shape_mismatch(expected),
        request: Box::new(intent.context()),
        response: Box::new(response),
    }
}

/// Applies `policy` to a successful response.
///
/// Under [`ErrorPolicy::None`] a result carrying errors becomes
/// [`ClientError::GraphQL`]. `errors` are only kept under [`ErrorPolicy::All`].
pub fn apply_error_policy(
    mut response: GraphQLResponse,
    policy: ErrorPolicy,
    intent: &RequestIntent,
) -> Result<GraphQLResponse, ClientError> {
    match policy {
        ErrorPolicy::All => {}
        ErrorPolicy::None if response.result.has_errors() => {
            return Err(ClientError::GraphQL {
                request: Box::new(intent.context()),
                response: Box::new(ErrorResponse {
                    status: response.status,
                    headers: response.headers,
                    result: Some(response.result),
                    body: None,
                }),
            });
        }
        ErrorPolicy::None | ErrorPolicy::Ignore => response.result.clear_errors(),
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::analyze_document;
    use crate::result::{ExecutionResult, ResponseErrors};
    use crate::Method;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct MockTransport {
        response: Result<HttpResponse, TransportError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        fn new(status: u16, content_type: &str, body: &str) -> Self {
            let mut headers = Headers::new();
            headers.insert("content-type", content_type);
            Self {
                response: Ok(HttpResponse {
                    status,
                    headers,
                    body: body.to_string(),
                }),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn json(status: u16, body: &Value) -> Self {
            Self::new(status, "application/json; charset=utf-8", &body.to_string())
        }

        fn failing(error: TransportError) -> Self {
            Self {
                response: Err(error),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.response.clone()
        }
    }

    fn query(document: &str) -> RequestIntent {
        RequestIntent::single(analyze_document(document, false), None)
    }

    async fn run(
        transport: &MockTransport,
        config: &ClientConfig,
        intent: &RequestIntent,
    ) -> Result<Outcome, ClientError> {
        run_request(RunRequest {
            endpoint: "http://localhost:4000/graphql",
            intent,
            config,
            headers: &Headers::new(),
            transport,
            signal: None,
        })
        .await
    }

    #[tokio::test]
    async fn test_success_single() {
        let transport = MockTransport::json(200, &json!({"data": {"me": {"id": "1"}}}));
        let outcome = run(&transport, &ClientConfig::new(), &query("{ me { id } }"))
            .await
            .unwrap();

        let response = outcome.into_result().unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(
            response.result,
            RequestResult::Single(ExecutionResult {
                data: json!({"me": {"id": "1"}}).as_object().cloned(),
                ..ExecutionResult::default()
            })
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_graphql_errors_on_2xx_are_success() {
        let body = json!({"errors": [{"message": "x"}]});
        let transport = MockTransport::json(200, &body);
        let outcome = run(&transport, &ClientConfig::new(), &query("{ me { id } }"))
            .await
            .unwrap();

        let response = outcome.into_result().unwrap();
        let RequestResult::Single(result) = &response.result else {
            panic!("expected single result");
        };
        assert!(result.has_errors());
        assert_eq!(
            result.errors,
            Some(ResponseErrors::List(vec![json!({"message": "x"})]))
        );
    }

    #[tokio::test]
    async fn test_non_json_error_status_is_http_error() {
        let transport = MockTransport::new(500, "text/html", "<h1>Internal Server Error</h1>");
        let outcome = run(&transport, &ClientConfig::new(), &query("{ a }"))
            .await
            .unwrap();

        let Outcome::Failed(ClientError::HttpStatus { response, .. }) = outcome else {
            panic!("expected HTTP status error");
        };
        assert_eq!(response.status, 500);
        assert_eq!(
            response.body.as_deref(),
            Some("<h1>Internal Server Error</h1>")
        );
        assert_eq!(response.result, None);
    }

    #[tokio::test]
    async fn test_json_error_status_carries_result() {
        let transport = MockTransport::json(400, &json!({"errors": [{"message": "bad"}]}));
        let outcome = run(&transport, &ClientConfig::new(), &query("{ a }"))
            .await
            .unwrap();

        let Outcome::Failed(error @ ClientError::HttpStatus { .. }) = outcome else {
            panic!("expected HTTP status error");
        };
        let response = error.response().unwrap();
        assert_eq!(response.status, 400);
        assert_eq!(response.errors().unwrap().messages(), vec!["bad"]);
    }

    #[tokio::test]
    async fn test_malformed_json_error_status_is_http_error() {
        let transport = MockTransport::new(502, "application/json", "Bad Gateway");
        let outcome = run(&transport, &ClientConfig::new(), &query("{ a }"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            Outcome::Failed(ClientError::HttpStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_shape_is_validation_error() {
        let transport = MockTransport::json(200, &json!({"data": "not an object"}));
        let outcome = run(&transport, &ClientConfig::new(), &query("{ a }"))
            .await
            .unwrap();

        let Outcome::Failed(ClientError::Validation {
            reason, response, ..
        }) = outcome
        else {
            panic!("expected validation error");
        };
        assert!(reason.message().contains("data is not plain object"));
        assert_eq!(response.status, 200);
        assert!(response.headers.contains("content-type"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_validation_error() {
        let transport = MockTransport::new(200, "application/json", "{not json");
        let outcome = run(&transport, &ClientConfig::new(), &query("{ a }"))
            .await
            .unwrap();
        let Outcome::Failed(ClientError::Validation { reason, .. }) = outcome else {
            panic!("expected validation error");
        };
        assert!(reason.message().starts_with("Invalid JSON in response body"));
    }

    #[tokio::test]
    async fn test_non_json_success_is_validation_error() {
        let transport = MockTransport::new(200, "text/html", "<html></html>");
        let outcome = run(&transport, &ClientConfig::new(), &query("{ a }"))
            .await
            .unwrap();
        let Outcome::Failed(ClientError::Validation { reason, .. }) = outcome else {
            panic!("expected validation error");
        };
        assert!(reason.message().contains("not object or array"));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let observed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&observed);
        let config = ClientConfig::new().with_response_middleware(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let transport =
            MockTransport::failing(TransportError::Network("connection refused".into()));

        let err = run(&transport, &config, &query("{ a }")).await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::Transport(TransportError::Network(_))
        ));
        assert_eq!(observed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_middleware_can_modify_request() {
        let config = ClientConfig::new().with_request_middleware(|mut request| {
            request.headers.insert("x-request-id", "abc");
            Ok(request)
        });
        let transport = MockTransport::json(200, &json!({"data": {}}));

        run(&transport, &config, &query("{ a }")).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].headers.get("x-request-id"), Some("abc"));
    }

    #[tokio::test]
    async fn test_request_middleware_error_aborts_call() {
        let config =
            ClientConfig::new().with_request_middleware(|_| Err("token expired".into()));
        let transport = MockTransport::json(200, &json!({"data": {}}));

        let err = run(&transport, &config, &query("{ a }")).await.unwrap_err();

        assert!(matches!(err, ClientError::Middleware(_)));
        assert_eq!(err.to_string(), "Request middleware failed: token expired");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_response_middleware_observes_outcome() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let config = ClientConfig::new().with_response_middleware(move |outcome| {
            sink.lock().unwrap().push(outcome.is_success());
        });

        let ok = MockTransport::json(200, &json!({"data": {}}));
        run(&ok, &config, &query("{ a }")).await.unwrap();
        let failing = MockTransport::new(503, "text/plain", "unavailable");
        run(&failing, &config, &query("{ a }")).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_batch_answer_to_single_request_fails_before_middleware() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let config = ClientConfig::new().with_response_middleware(move |outcome| {
            sink.lock().unwrap().push(outcome.is_success());
        });
        let transport = MockTransport::json(200, &json!([{"data": {"a": 1}}]));

        let outcome = run(&transport, &config, &query("{ a }")).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![false]);
        let Outcome::Failed(ClientError::Validation {
            reason, response, ..
        }) = outcome
        else {
            panic!("expected validation error");
        };
        assert_eq!(
            reason.message(),
            "Invalid execution result: expected a single execution result, got a batch"
        );
        assert!(matches!(response.result, Some(RequestResult::Batch(_))));
    }

    #[tokio::test]
    async fn test_batch_result_count_must_match_documents() {
        let intent = RequestIntent::batch(vec![
            (analyze_document("{ a }", false), None),
            (analyze_document("{ b }", false), None),
        ]);

        let short = MockTransport::json(200, &json!([{"data": {"a": 1}}]));
        let outcome = run(&short, &ClientConfig::new(), &intent).await.unwrap();
        let Outcome::Failed(ClientError::Validation { reason, .. }) = outcome else {
            panic!("expected validation error");
        };
        assert!(reason.message().ends_with("expected 2 execution results, got 1"));

        let single = MockTransport::json(200, &json!({"data": {"a": 1}}));
        let outcome = run(&single, &ClientConfig::new(), &intent).await.unwrap();
        assert!(matches!(
            outcome,
            Outcome::Failed(ClientError::Validation { .. })
        ));

        let matching = MockTransport::json(200, &json!([{"data": {"a": 1}}, {"data": {"b": 2}}]));
        let outcome = run(&matching, &ClientConfig::new(), &intent).await.unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_cancelled_signal_aborts_before_sending() {
        let transport = MockTransport::json(200, &json!({"data": {}}));
        let token = CancellationToken::new();
        token.cancel();

        let err = run_request(RunRequest {
            endpoint: "http://localhost:4000/graphql",
            intent: &query("{ a }"),
            config: &ClientConfig::new(),
            headers: &Headers::new(),
            transport: &transport,
            signal: Some(&token),
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Transport(TransportError::Aborted)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_mutation_with_get_preference_is_posted() {
        let config = ClientConfig::new().with_method(Method::Get);
        let transport = MockTransport::json(200, &json!({"data": {}}));

        run(&transport, &config, &query("mutation { a }"))
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Post);
        assert!(requests[0].body.is_some());
    }

    #[test]
    fn test_error_policy() {
        let intent = query("{ a }");
        let response = GraphQLResponse {
            status: 200,
            headers: Headers::new(),
            result: RequestResult::Single(ExecutionResult {
                data: json!({"a": 1}).as_object().cloned(),
                errors: Some(ResponseErrors::List(vec![json!({"message": "x"})])),
                extensions: None,
            }),
        };

        let err = apply_error_policy(response.clone(), ErrorPolicy::None, &intent).unwrap_err();
        assert!(matches!(err, ClientError::GraphQL { .. }));
        assert_eq!(err.to_string(), "x");
        assert_eq!(
            err.response().unwrap().errors(),
            Some(&ResponseErrors::List(vec![json!({"message": "x"})]))
        );

        let ignored = apply_error_policy(response.clone(), ErrorPolicy::Ignore, &intent).unwrap();
        assert!(!ignored.result.has_errors());

        let all = apply_error_policy(response.clone(), ErrorPolicy::All, &intent).unwrap();
        assert_eq!(all, response);
    }

    #[test]
    fn test_error_policy_none_strips_empty_errors() {
        let response = GraphQLResponse {
            status: 200,
            headers: Headers::new(),
            result: RequestResult::Single(ExecutionResult {
                errors: Some(ResponseErrors::List(vec![])),
                ..ExecutionResult::default()
            }),
        };
        let kept = apply_error_policy(response, ErrorPolicy::None, &query("{ a }")).unwrap();
        assert_eq!(kept.result, RequestResult::Single(ExecutionResult::default()));
    }
}
