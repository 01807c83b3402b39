//! Exit codes for `gqlreq`.
//!
//! Scripts can tell a server-reported GraphQL error apart from a network
//! failure or a broken config file by the exit status alone.

use graphql_request::ClientError;
use graphql_request_config::ConfigError;

/// Exit codes used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// The server answered with GraphQL errors
    GraphQLError = 1,
    /// Missing or invalid config file, or invalid arguments
    ConfigError = 2,
    /// Network failure or non-2xx HTTP status
    TransportError = 3,
    /// File read/write failure
    IoError = 4,
    /// The server answered with something that is not a GraphQL result
    InvalidResponse = 5,
}

impl ExitCode {
    /// Exit the process with this exit code.
    pub fn exit(self) -> ! {
        std::process::exit(self as i32)
    }

    /// Classifies a command failure by the first recognized error in its chain.
    #[must_use]
    pub fn from_error(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if let Some(error) = cause.downcast_ref::<ClientError>() {
                return Self::from_client_error(error);
            }
            if let Some(error) = cause.downcast_ref::<ConfigError>() {
                return match error {
                    ConfigError::Io(_) => Self::IoError,
                    _ => Self::ConfigError,
                };
            }
            if cause.is::<std::io::Error>() {
                return Self::IoError;
            }
        }
        Self::ConfigError
    }

    const fn from_client_error(error: &ClientError) -> Self {
        match error {
            ClientError::GraphQL { .. } => Self::GraphQLError,
            ClientError::Validation { .. } | ClientError::Data(_) => Self::InvalidResponse,
            ClientError::Transport(_)
            | ClientError::HttpStatus { .. }
            | ClientError::InvalidEndpoint { .. }
            | ClientError::Middleware(_) => Self::TransportError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::GraphQLError => write!(f, "GraphQL error"),
            Self::ConfigError => write!(f, "configuration error"),
            Self::TransportError => write!(f, "transport error"),
            Self::IoError => write!(f, "I/O error"),
            Self::InvalidResponse => write!(f, "invalid response"),
        }
    }
}
