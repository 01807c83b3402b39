pub mod batch;
pub mod request;

use anyhow::{Context, Result};
use graphql_request::{
    ClientConfig, ErrorPolicy, ExecutionResult, GraphQLClient, Headers, Method, ReqwestTransport,
    Variables,
};
use graphql_request_config::{find_config, load_config, EndpointConfig, DEFAULT_ENDPOINT};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global options shared by every subcommand.
#[derive(Debug, Default, clap::Args)]
pub struct GlobalArgs {
    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Endpoint name (for multi-endpoint configs)
    #[arg(short, long, value_name = "NAME", global = true)]
    pub endpoint: Option<String>,

    /// GraphQL endpoint URL (skips the config file)
    #[arg(long, value_name = "URL", global = true)]
    pub url: Option<String>,

    /// HTTP headers to include in the request (can be specified multiple times)
    /// Format: "Header-Name: Header-Value"
    /// These are merged with headers from the config file (CLI takes precedence)
    #[arg(long = "header", short = 'H', value_name = "HEADER", global = true)]
    pub headers: Vec<String>,

    /// Preferred HTTP method (mutations and batches always use POST)
    #[arg(long, value_name = "METHOD", global = true)]
    pub method: Option<Method>,

    /// What to do with GraphQL errors: none, ignore or all
    #[arg(long, value_name = "POLICY", global = true)]
    pub error_policy: Option<ErrorPolicy>,

    /// Request timeout in seconds (overrides config file)
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,
}

/// Resolved request settings from config file and CLI arguments.
#[derive(Debug)]
pub struct RequestSettings {
    pub url: String,
    pub headers: Headers,
    pub method: Method,
    pub error_policy: ErrorPolicy,
    pub exclude_operation_name: bool,
    pub timeout: Option<u64>,
    pub connect_timeout: Option<u64>,
}

impl RequestSettings {
    pub fn client(&self) -> Result<GraphQLClient<ReqwestTransport>> {
        let transport = ReqwestTransport::with_timeouts(
            self.timeout.map(Duration::from_secs),
            self.connect_timeout.map(Duration::from_secs),
        )
        .context("Failed to create HTTP client")?;

        let config = ClientConfig::new()
            .with_headers(self.headers.iter())
            .with_method(self.method)
            .with_error_policy(self.error_policy)
            .with_exclude_operation_name(self.exclude_operation_name);

        Ok(GraphQLClient::with_transport(&self.url, config, transport))
    }
}

fn load_endpoint(config_path: Option<&Path>, name: &str) -> Result<EndpointConfig> {
    let config_path = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        let current_dir = std::env::current_dir()?;
        find_config(&current_dir)
            .context("Failed to search for config")?
            .context("No config file found. Use --config to specify one or --url to skip it.")?
    };

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    Ok(config.endpoint(name)?.clone())
}

/// Parses a header string in "Name: Value" format.
pub fn parse_header(header: &str) -> Result<(String, String)> {
    let Some((name, value)) = header.split_once(':') else {
        anyhow::bail!("Invalid header format: '{header}'. Expected 'Header-Name: Header-Value'");
    };
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Header name cannot be empty");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Resolve request settings from URL/config and CLI overrides.
pub fn resolve_settings(args: &GlobalArgs) -> Result<RequestSettings> {
    let endpoint = match (&args.url, &args.endpoint) {
        (Some(url), None) if args.config.is_none() => EndpointConfig::new(url),
        (url, name) => {
            let mut endpoint = load_endpoint(
                args.config.as_deref(),
                name.as_deref().unwrap_or(DEFAULT_ENDPOINT),
            )?;
            if let Some(url) = url {
                endpoint.url.clone_from(url);
            }
            endpoint
        }
    };

    // Config headers in name order, then CLI headers on top
    let mut config_headers: Vec<(String, String)> =
        endpoint.headers.clone().unwrap_or_default().into_iter().collect();
    config_headers.sort();
    let mut headers: Headers = config_headers.into_iter().collect();

    for header in &args.headers {
        let (name, value) = parse_header(header).context("Failed to parse headers")?;
        headers.insert(name, value);
    }

    if args.timeout == Some(0) {
        anyhow::bail!("--timeout must be greater than zero");
    }

    Ok(RequestSettings {
        url: endpoint.url,
        headers,
        method: args.method.or(endpoint.method).unwrap_or_default(),
        error_policy: args.error_policy.or(endpoint.error_policy).unwrap_or_default(),
        exclude_operation_name: endpoint.exclude_operation_name.unwrap_or(false),
        timeout: args.timeout.or(endpoint.timeout),
        connect_timeout: endpoint.connect_timeout,
    })
}

/// Reads an argument that is either inline text or `@path` to a file.
pub fn read_input(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
        }
        None => Ok(arg.to_string()),
    }
}

/// Parses `--variables`, given inline or as `@path`, into a JSON object.
pub fn parse_variables(arg: &str) -> Result<Variables> {
    let text = read_input(arg)?;
    match serde_json::from_str(&text).context("Failed to parse variables as JSON")? {
        serde_json::Value::Object(variables) => Ok(variables),
        other => anyhow::bail!("Variables must be a JSON object, got: {other}"),
    }
}

/// Writes `value` as pretty JSON to `output`, or to stdout.
pub fn write_json(value: &impl serde::Serialize, output: Option<&Path>) -> Result<()> {
    use colored::Colorize;
    use std::io::Write;

    let content = serde_json::to_string_pretty(value).context("Failed to serialize response")?;

    if let Some(path) = output {
        std::fs::write(path, format!("{content}\n"))
            .with_context(|| format!("Failed to write to {}", path.display()))?;
        eprintln!(
            "{} Response written to {}",
            "✓".green(),
            path.display().to_string().cyan()
        );
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{content}").context("Failed to write to stdout")?;
    }

    Ok(())
}

/// Shape printed for one operation.
pub fn execution_result(response: graphql_request::ClientResponse) -> ExecutionResult {
    ExecutionResult {
        data: response.data,
        errors: response.errors,
        extensions: response.extensions,
    }
}
