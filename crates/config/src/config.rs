use crate::{ConfigError, Result};
use graphql_request::{ClientConfig, ErrorPolicy, Method, ReqwestTransport, TransportError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Name under which a single-endpoint config is exposed.
pub const DEFAULT_ENDPOINT: &str = "default";

/// Top-level configuration.
/// Either a single endpoint or multiple named endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestConfig {
    Multi {
        endpoints: HashMap<String, EndpointConfig>,
    },
    Single(Box<EndpointConfig>),
}

impl RequestConfig {
    /// All endpoints. A single-endpoint config yields one item named "default".
    #[must_use]
    pub fn endpoints(&self) -> Box<dyn Iterator<Item = (&str, &EndpointConfig)> + '_> {
        match self {
            Self::Single(config) => Box::new(std::iter::once((DEFAULT_ENDPOINT, config.as_ref()))),
            Self::Multi { endpoints } => Box::new(
                endpoints
                    .iter()
                    .map(|(name, config)| (name.as_str(), config)),
            ),
        }
    }

    #[must_use]
    pub fn get_endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        match self {
            Self::Single(config) if name == DEFAULT_ENDPOINT => Some(config.as_ref()),
            Self::Single(_) => None,
            Self::Multi { endpoints } => endpoints.get(name),
        }
    }

    /// Like [`RequestConfig::get_endpoint`], but reports the closest known
    /// name when `name` is not configured.
    pub fn endpoint(&self, name: &str) -> Result<&EndpointConfig> {
        self.get_endpoint(name).ok_or_else(|| ConfigError::UnknownEndpoint {
            name: name.to_string(),
            suggestion: self.closest_endpoint(name),
        })
    }

    fn closest_endpoint(&self, name: &str) -> Option<String> {
        self.endpoints()
            .map(|(candidate, _)| (candidate, strsim::jaro_winkler(name, candidate)))
            .filter(|(_, score)| *score > 0.8)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate.to_string())
    }

    #[must_use]
    pub const fn is_multi_endpoint(&self) -> bool {
        matches!(self, Self::Multi { .. })
    }

    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi { endpoints } => endpoints.len(),
        }
    }
}

/// One GraphQL endpoint and the defaults used when calling it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_operation_name: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_policy: Option<ErrorPolicy>,

    /// Request timeout in seconds (default: none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Connect timeout in seconds (default: none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
}

impl EndpointConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: None,
            method: None,
            exclude_operation_name: None,
            error_policy: None,
            timeout: None,
            connect_timeout: None,
        }
    }

    /// Client configuration for this endpoint.
    ///
    /// Headers are applied in name order so the result does not depend on map
    /// iteration order.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let mut headers: Vec<(&String, &String)> =
            self.headers.iter().flat_map(HashMap::iter).collect();
        headers.sort();

        ClientConfig::new()
            .with_headers(headers.into_iter().map(|(k, v)| (k.clone(), v.clone())))
            .with_method(self.method.unwrap_or_default())
            .with_exclude_operation_name(self.exclude_operation_name.unwrap_or(false))
            .with_error_policy(self.error_policy.unwrap_or_default())
    }

    /// HTTP transport honoring the configured timeouts.
    pub fn transport(&self) -> std::result::Result<ReqwestTransport, TransportError> {
        ReqwestTransport::with_timeouts(
            self.timeout.map(Duration::from_secs),
            self.connect_timeout.map(Duration::from_secs),
        )
    }
}
