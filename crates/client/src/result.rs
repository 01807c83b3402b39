//! Parsing and normalization of GraphQL execution results.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A JSON object.
pub type JsonMap = serde_json::Map<String, Value>;

/// Media type for GraphQL-over-HTTP responses.
pub const CONTENT_TYPE_GQL: &str = "application/graphql-response+json";

/// Generic JSON media type.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// The `errors` field of an execution result.
///
/// Servers are expected to send a list, but some send a single error object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseErrors {
    List(Vec<Value>),
    Object(JsonMap),
}

impl ResponseErrors {
    /// Messages of the contained errors, skipping entries without one.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        fn message(error: &Value) -> Option<&str> {
            error.get("message").and_then(Value::as_str)
        }

        match self {
            Self::List(errors) => errors.iter().filter_map(message).collect(),
            Self::Object(error) => error
                .get("message")
                .and_then(Value::as_str)
                .into_iter()
                .collect(),
        }
    }
}

/// The `{data, errors, extensions}` triple returned for one operation.
///
/// Both `data` and `errors` may be present (partial success).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ResponseErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<JsonMap>,
}

impl ExecutionResult {
    /// Whether the result carries GraphQL errors.
    ///
    /// An error list counts when non-empty; an error object always counts.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        match &self.errors {
            Some(ResponseErrors::List(errors)) => !errors.is_empty(),
            Some(ResponseErrors::Object(_)) => true,
            None => false,
        }
    }
}

/// A normalized response body: one result, or one result per batched document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestResult {
    Single(ExecutionResult),
    Batch(Vec<ExecutionResult>),
}

impl RequestResult {
    /// Whether any contained result carries GraphQL errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        match self {
            Self::Single(result) => result.has_errors(),
            Self::Batch(results) => results.iter().any(ExecutionResult::has_errors),
        }
    }

    /// Drops the `errors` field from every contained result.
    pub fn clear_errors(&mut self) {
        match self {
            Self::Single(result) => result.errors = None,
            Self::Batch(results) => {
                for result in results {
                    result.errors = None;
                }
            }
        }
    }
}

/// A response body that does not have the shape of a GraphQL result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvalidResult {
    message: String,
}

impl InvalidResult {
    fn shape(reason: impl std::fmt::Display) -> Self {
        Self {
            message: format!("Invalid execution result: {reason}"),
        }
    }

    pub(crate) fn json(error: &serde_json::Error) -> Self {
        Self {
            message: format!("Invalid JSON in response body: {error}"),
        }
    }

    pub(crate) fn shape_mismatch(expected: &str) -> Self {
        Self::shape(format!("expected {expected}"))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Validates one execution result.
///
/// Keys that are absent map to `None`. A key that is present with the wrong
/// type (including `null`) is rejected.
pub fn parse_execution_result(raw: Value) -> Result<ExecutionResult, InvalidResult> {
    let Value::Object(mut object) = raw else {
        return Err(InvalidResult::shape("result is not object"));
    };

    let errors = match object.remove("errors") {
        None => None,
        Some(Value::Array(errors)) => Some(ResponseErrors::List(errors)),
        Some(Value::Object(error)) => Some(ResponseErrors::Object(error)),
        Some(_) => return Err(InvalidResult::shape("errors is not plain object OR array")),
    };

    let data = match object.remove("data") {
        None => None,
        Some(Value::Object(data)) => Some(data),
        Some(_) => return Err(InvalidResult::shape("data is not plain object")),
    };

    let extensions = match object.remove("extensions") {
        None => None,
        Some(Value::Object(extensions)) => Some(extensions),
        Some(_) => return Err(InvalidResult::shape("extensions is not plain object")),
    };

    Ok(ExecutionResult {
        data,
        errors,
        extensions,
    })
}

/// Normalizes a decoded response body into a single or batch result.
///
/// The first invalid element of a batch fails the whole batch.
pub fn parse_graphql_execution_result(raw: Value) -> Result<RequestResult, InvalidResult> {
    match raw {
        Value::Array(results) => results
            .into_iter()
            .map(parse_execution_result)
            .collect::<Result<Vec<_>, _>>()
            .map(RequestResult::Batch),
        object @ Value::Object(_) => parse_execution_result(object).map(RequestResult::Single),
        other => Err(InvalidResult::shape(format!(
            "result is not object or array. \nGot:\n{}",
            display_value(&other)
        ))),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a `content-type` header value announces a GraphQL or JSON body.
#[must_use]
pub fn is_graphql_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_lowercase();
    content_type.contains(CONTENT_TYPE_GQL) || content_type.contains(CONTENT_TYPE_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_only() {
        let result = parse_execution_result(json!({"data": {"me": {"id": "1"}}})).unwrap();
        assert_eq!(
            result.data,
            json!({"me": {"id": "1"}}).as_object().cloned()
        );
        assert_eq!(result.errors, None);
        assert_eq!(result.extensions, None);
    }

    #[test]
    fn test_empty_object_has_all_fields_missing() {
        let result = parse_execution_result(json!({})).unwrap();
        assert_eq!(result, ExecutionResult::default());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let result = parse_execution_result(json!({"hasNext": false})).unwrap();
        assert_eq!(result, ExecutionResult::default());
    }

    #[test]
    fn test_partial_success_keeps_data_and_errors() {
        let result = parse_execution_result(json!({
            "data": {"a": 1},
            "errors": [{"message": "b failed"}],
            "extensions": {"cost": 3}
        }))
        .unwrap();
        assert!(result.data.is_some());
        assert!(result.extensions.is_some());
        assert_eq!(
            result.errors,
            Some(ResponseErrors::List(vec![json!({"message": "b failed"})]))
        );
    }

    #[test]
    fn test_errors_object_is_accepted() {
        let result = parse_execution_result(json!({"errors": {"message": "x"}})).unwrap();
        assert!(matches!(result.errors, Some(ResponseErrors::Object(_))));
        assert!(result.has_errors());
    }

    #[test]
    fn test_non_object_result() {
        let err = parse_execution_result(json!(3)).unwrap_err();
        assert_eq!(err.message(), "Invalid execution result: result is not object");

        let err = parse_execution_result(Value::Null).unwrap_err();
        assert_eq!(err.message(), "Invalid execution result: result is not object");
    }

    #[test]
    fn test_invalid_errors_field() {
        let err = parse_execution_result(json!({"errors": "boom"})).unwrap_err();
        assert_eq!(
            err.message(),
            "Invalid execution result: errors is not plain object OR array"
        );
    }

    #[test]
    fn test_invalid_data_field() {
        let err = parse_execution_result(json!({"data": [1, 2]})).unwrap_err();
        assert_eq!(
            err.message(),
            "Invalid execution result: data is not plain object"
        );

        let err = parse_execution_result(json!({"data": null})).unwrap_err();
        assert!(err.message().contains("data is not plain object"));
    }

    #[test]
    fn test_invalid_extensions_field() {
        let err = parse_execution_result(json!({"extensions": 1})).unwrap_err();
        assert_eq!(
            err.message(),
            "Invalid execution result: extensions is not plain object"
        );
    }

    #[test]
    fn test_object_is_tagged_single() {
        let result = parse_graphql_execution_result(json!({"data": {"a": 1}})).unwrap();
        assert!(matches!(result, RequestResult::Single(_)));
    }

    #[test]
    fn test_array_is_tagged_batch_in_order() {
        let result = parse_graphql_execution_result(json!([
            {"data": {"n": 1}},
            {"data": {"n": 2}},
            {"data": {"n": 3}}
        ]))
        .unwrap();

        let RequestResult::Batch(results) = result else {
            panic!("expected batch result");
        };
        let order: Vec<_> = results
            .iter()
            .map(|r| r.data.as_ref().unwrap()["n"].clone())
            .collect();
        assert_eq!(order, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_batch_fails_on_first_invalid_element() {
        let err = parse_graphql_execution_result(json!([
            {"data": {"n": 1}},
            {"data": "nope"},
            {"errors": 5}
        ]))
        .unwrap_err();
        assert!(err.message().contains("data is not plain object"));
    }

    #[test]
    fn test_scalar_is_not_object_or_array() {
        for raw in [json!("<html>"), json!(42), json!(true), Value::Null] {
            let err = parse_graphql_execution_result(raw).unwrap_err();
            assert!(err.message().contains("not object or array"), "{err}");
        }
    }

    #[test]
    fn test_has_errors() {
        let empty = ExecutionResult {
            errors: Some(ResponseErrors::List(vec![])),
            ..ExecutionResult::default()
        };
        assert!(!empty.has_errors());

        let some = ExecutionResult {
            errors: Some(ResponseErrors::List(vec![json!({"message": "x"})])),
            ..ExecutionResult::default()
        };
        assert!(some.has_errors());
        assert!(!ExecutionResult::default().has_errors());

        assert!(RequestResult::Batch(vec![ExecutionResult::default(), some.clone()]).has_errors());
        assert!(!RequestResult::Batch(vec![ExecutionResult::default(), empty]).has_errors());
        assert!(RequestResult::Single(some).has_errors());
    }

    #[test]
    fn test_error_messages() {
        let errors = ResponseErrors::List(vec![
            json!({"message": "first"}),
            json!({"code": 1}),
            json!({"message": "second"}),
        ]);
        assert_eq!(errors.messages(), vec!["first", "second"]);

        let error = json!({"message": "only"}).as_object().cloned().unwrap();
        assert_eq!(ResponseErrors::Object(error).messages(), vec!["only"]);
    }

    #[test]
    fn test_graphql_content_type() {
        assert!(is_graphql_content_type("application/json; charset=utf-8"));
        assert!(is_graphql_content_type("Application/GraphQL-Response+JSON"));
        assert!(!is_graphql_content_type("text/html"));
        assert!(!is_graphql_content_type("text/plain; charset=utf-8"));
    }
}
