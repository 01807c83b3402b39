use super::{parse_variables, read_input, write_json, GlobalArgs};
use anyhow::Result;
use graphql_request::{BatchRequestDocument, BatchRequestsOptions};
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
pub struct BatchArgs {
    /// GraphQL documents, inline or as @path, sent in one HTTP request
    #[arg(value_name = "QUERY", required = true)]
    pub documents: Vec<String>,

    /// Variables for the document at the same position (can be specified multiple times)
    #[arg(long, value_name = "JSON")]
    pub variables: Vec<String>,

    /// Output file path (writes to stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Pairs each document with the variables given at the same position.
fn build_documents(args: &BatchArgs) -> Result<Vec<BatchRequestDocument>> {
    if args.variables.len() > args.documents.len() {
        anyhow::bail!(
            "Got {} --variables for {} documents",
            args.variables.len(),
            args.documents.len()
        );
    }

    args.documents
        .iter()
        .enumerate()
        .map(|(i, document)| {
            let document = BatchRequestDocument::new(read_input(document)?);
            match args.variables.get(i) {
                Some(variables) => Ok(document.with_variables(parse_variables(variables)?)),
                None => Ok(document),
            }
        })
        .collect()
}

#[tracing::instrument(skip_all, fields(documents = args.documents.len()))]
pub async fn run(global: &GlobalArgs, args: &BatchArgs) -> Result<()> {
    let settings = super::resolve_settings(global)?;
    let documents = build_documents(args)?;

    let client = settings.client()?;
    let results = client
        .batch_requests(BatchRequestsOptions::new(documents))
        .await?;
    tracing::debug!(results = results.len(), "Batch complete");

    write_json(&results, args.output.as_deref())
}
