//! GraphQL-over-HTTP request encoding.
//!
//! Single queries may be sent as GET with the document in the query string.
//! Mutations and batches are always POSTed as JSON, whatever the configured
//! preference.

use crate::document::{Document, RequestIntent};
use crate::result::CONTENT_TYPE_JSON;
use crate::transport::HttpRequest;
use crate::{ClientError, Headers, Method, Variables};
use serde_json::Value;
use url::Url;

/// Value of the `accept` header sent with every request.
pub const ACCEPT: &str = "application/graphql-response+json, application/json";

/// Collapses whitespace, commas and `#` comments into single spaces.
///
/// Used for GET requests, where the document travels in the URL.
#[must_use]
pub fn clean_query(query: &str) -> String {
    let mut cleaned = String::with_capacity(query.len());
    let mut chars = query.chars().peekable();
    let mut separator = false;

    while let Some(c) = chars.next() {
        if c == '#' {
            while chars.next_if(|&n| n != '\n' && n != '\r').is_some() {}
            separator = true;
        } else if c == ',' || c.is_whitespace() {
            separator = true;
        } else {
            if separator && !cleaned.is_empty() {
                cleaned.push(' ');
            }
            separator = false;
            cleaned.push(c);
        }
    }

    cleaned
}

/// The method actually used for `intent` given the caller's preference.
#[must_use]
pub fn effective_method(intent: &RequestIntent, preferred: Method) -> Method {
    match (preferred, intent) {
        (Method::Get, RequestIntent::Single { document, .. }) if !document.is_mutation => {
            Method::Get
        }
        _ => Method::Post,
    }
}

/// Encodes `intent` into an HTTP request against `endpoint`.
///
/// Headers are layered low to high: `default_headers`, `call_headers`, then
/// the headers required by the chosen encoding.
pub fn encode_request(
    endpoint: &str,
    intent: &RequestIntent,
    preferred: Method,
    default_headers: &Headers,
    call_headers: &Headers,
) -> Result<HttpRequest, ClientError> {
    let mut url = Url::parse(endpoint).map_err(|e| ClientError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;

    let method = effective_method(intent, preferred);
    if method != preferred {
        tracing::debug!(
            preferred = %preferred,
            kind = intent.kind(),
            "Falling back to POST for mutation or batch"
        );
    }

    let mut headers = default_headers.clone();
    headers.overlay(call_headers);
    headers.insert("accept", ACCEPT);

    let body = match (method, intent) {
        (
            Method::Get,
            RequestIntent::Single {
                document,
                variables,
            },
        ) => {
            append_query_params(&mut url, document, variables.as_ref());
            None
        }
        (Method::Get, RequestIntent::Batch { .. }) | (Method::Post, _) => {
            headers.insert("content-type", CONTENT_TYPE_JSON);
            Some(post_body(intent).to_string())
        }
    };

    Ok(HttpRequest {
        url: url.into(),
        method,
        headers,
        body,
    })
}

fn append_query_params(url: &mut Url, document: &Document, variables: Option<&Variables>) {
    let mut pairs = url.query_pairs_mut();
    pairs.append_pair("query", &clean_query(&document.expression));
    if let Some(name) = &document.operation_name {
        pairs.append_pair("operationName", name);
    }
    if let Some(variables) = variables.filter(|v| !v.is_empty()) {
        pairs.append_pair("variables", &Value::Object(variables.clone()).to_string());
    }
}

fn post_body(intent: &RequestIntent) -> Value {
    match intent {
        RequestIntent::Single {
            document,
            variables,
        } => operation_payload(document, variables.as_ref()),
        RequestIntent::Batch {
            documents,
            variables,
            ..
        } => Value::Array(
            documents
                .iter()
                .enumerate()
                .map(|(i, document)| {
                    operation_payload(document, variables.get(i).and_then(Option::as_ref))
                })
                .collect(),
        ),
    }
}

fn operation_payload(document: &Document, variables: Option<&Variables>) -> Value {
    let mut payload = serde_json::Map::new();
    if let Some(name) = &document.operation_name {
        payload.insert("operationName".into(), Value::String(name.clone()));
    }
    payload.insert("query".into(), Value::String(document.expression.clone()));
    if let Some(variables) = variables {
        payload.insert("variables".into(), Value::Object(variables.clone()));
    }
    Value::Object(payload)
}

/// Whether the response headers announce a body worth parsing as GraphQL.
pub(crate) fn has_graphql_content_type(headers: &Headers) -> bool {
    headers
        .get("content-type")
        .is_some_and(crate::result::is_graphql_content_type)
}
