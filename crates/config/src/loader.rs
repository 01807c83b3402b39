use crate::{ConfigError, EndpointConfig, RequestConfig, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names to search for, in order of preference
pub const CONFIG_FILES: &[&str] = &[
    ".graphql-request.yml",
    ".graphql-request.yaml",
    ".graphql-request.json",
    ".graphql-request",
];

/// Find a config file by walking up the directory tree from the given start directory.
#[tracing::instrument(fields(start = %start_dir.display()))]
pub fn find_config(start_dir: &Path) -> Result<Option<PathBuf>> {
    let mut current_dir = start_dir.to_path_buf();
    let mut checked_dirs = 0;

    loop {
        tracing::trace!(dir = %current_dir.display(), "Checking directory for config files");
        for file_name in CONFIG_FILES {
            let config_path = current_dir.join(file_name);
            if config_path.is_file() {
                tracing::info!(path = %config_path.display(), checked_dirs, "Found config file");
                return Ok(Some(config_path));
            }
        }

        checked_dirs += 1;
        if !current_dir.pop() {
            tracing::debug!(checked_dirs, "No config file found");
            break;
        }
    }

    Ok(None)
}

/// Load a config from the specified path.
/// The format is detected from the file extension.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<RequestConfig> {
    tracing::debug!("Reading config file");
    let contents = fs::read_to_string(path)?;
    let config = load_config_from_str(&contents, path)?;
    tracing::info!(
        endpoints = config.endpoint_count(),
        multi_endpoint = config.is_multi_endpoint(),
        "Config loaded successfully"
    );
    Ok(config)
}

/// Load a config from a string.
/// The path is used for error messages and format detection.
#[tracing::instrument(skip(contents), fields(path = %path.display(), size = contents.len()))]
pub fn load_config_from_str(contents: &str, path: &Path) -> Result<RequestConfig> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("");

    tracing::debug!(extension, file_name, "Detecting config format");

    let config = match extension {
        "yml" | "yaml" => parse_yaml(contents, path)?,
        "json" => parse_json(contents, path)?,
        "" if file_name == ".graphql-request" => {
            tracing::trace!("Trying YAML then JSON for extensionless config");
            parse_yaml(contents, path).or_else(|_| parse_json(contents, path))?
        }
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };

    validate_config(&config, path)?;
    Ok(config)
}

fn parse_yaml(contents: &str, path: &Path) -> Result<RequestConfig> {
    serde_saphyr::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("YAML parse error: {e}"),
    })
}

fn parse_json(contents: &str, path: &Path) -> Result<RequestConfig> {
    serde_json::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("JSON parse error: {e}"),
    })
}

#[tracing::instrument(
    skip(config, path),
    fields(path = %path.display(), endpoints = config.endpoint_count())
)]
fn validate_config(config: &RequestConfig, path: &Path) -> Result<()> {
    let invalid = |message: String| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    };

    if config.endpoint_count() == 0 {
        return Err(invalid("No endpoints configured".to_string()));
    }

    for (name, endpoint) in config.endpoints() {
        tracing::trace!(endpoint = name, "Validating endpoint config");
        validate_endpoint(name, endpoint).map_err(invalid)?;
    }

    tracing::debug!("Config validation passed");
    Ok(())
}

fn validate_endpoint(name: &str, endpoint: &EndpointConfig) -> std::result::Result<(), String> {
    let url = endpoint.url.trim();
    if url.is_empty() {
        return Err(format!("Endpoint '{name}' has an empty url"));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!(
            "Endpoint '{name}' has url '{url}', expected an http:// or https:// URL"
        ));
    }

    if let Some(headers) = &endpoint.headers {
        if headers.keys().any(|header| header.trim().is_empty()) {
            return Err(format!("Endpoint '{name}' has an empty header name"));
        }
    }

    if endpoint.timeout == Some(0) {
        return Err(format!("Endpoint '{name}' has a zero timeout"));
    }
    if endpoint.connect_timeout == Some(0) {
        return Err(format!("Endpoint '{name}' has a zero connectTimeout"));
    }

    Ok(())
}
