use super::{execution_result, parse_variables, read_input, write_json, GlobalArgs};
use anyhow::Result;
use graphql_request::RequestOptions;
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
pub struct RequestArgs {
    /// GraphQL document, or @path to a file containing it
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Variables as a JSON object, or @path to a JSON file
    #[arg(long, value_name = "JSON")]
    pub variables: Option<String>,

    /// Do not send the operation name
    #[arg(long)]
    pub operation_name_excluded: bool,

    /// Output file path (writes to stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[tracing::instrument(skip_all)]
pub async fn run(global: &GlobalArgs, args: &RequestArgs) -> Result<()> {
    let mut settings = super::resolve_settings(global)?;
    settings.exclude_operation_name |= args.operation_name_excluded;

    let mut options = RequestOptions::new(read_input(&args.query)?);
    if let Some(variables) = &args.variables {
        options = options.with_variables(parse_variables(variables)?);
    }

    let client = settings.client()?;
    let response = client.raw_request(options).await?;
    tracing::debug!(status = response.status, "Request complete");

    write_json(&execution_result(response), args.output.as_deref())
}
