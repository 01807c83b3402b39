//! Document analysis and request intents.

use crate::error::RequestContext;
use crate::Variables;
use apollo_parser::cst;

/// A GraphQL document ready to be sent, plus the metadata the executor needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The operation text exactly as supplied by the caller.
    pub expression: String,
    /// Name of the operation, when the document holds exactly one named operation.
    pub operation_name: Option<String>,
    /// Whether any operation in the document is a mutation.
    pub is_mutation: bool,
}

/// Analyzes a GraphQL document.
///
/// The document is parsed with `apollo-parser` to find its operation
/// definitions. The operation name is only extracted when there is exactly one
/// operation, since the server would otherwise need the caller to pick one.
/// A document that fails to parse is still returned (and later sent) verbatim,
/// so the server can report the syntax error.
///
/// `exclude_operation_name` suppresses the name only; mutation detection
/// always runs so that mutations are never encoded as GET requests.
#[must_use]
pub fn analyze_document(document: &str, exclude_operation_name: bool) -> Document {
    let tree = apollo_parser::Parser::new(document).parse();

    if tree.errors().next().is_some() {
        tracing::debug!("Document has syntax errors, sending without analysis");
        return Document {
            expression: document.to_string(),
            operation_name: None,
            is_mutation: false,
        };
    }

    let operations: Vec<cst::OperationDefinition> = tree
        .document()
        .definitions()
        .filter_map(|definition| match definition {
            cst::Definition::OperationDefinition(op) => Some(op),
            _ => None,
        })
        .collect();

    let is_mutation = operations.iter().any(|op| {
        op.operation_type()
            .is_some_and(|op_type| op_type.mutation_token().is_some())
    });

    let operation_name = match operations.as_slice() {
        [op] if !exclude_operation_name => op.name().map(|n| n.text().to_string()),
        _ => None,
    };

    Document {
        expression: document.to_string(),
        operation_name,
        is_mutation,
    }
}

/// What the caller wants executed, independent of how it is encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestIntent {
    Single {
        document: Document,
        variables: Option<Variables>,
    },
    Batch {
        documents: Vec<Document>,
        has_mutations: bool,
        /// One entry per document, positionally aligned with `documents`.
        variables: Vec<Option<Variables>>,
    },
}

impl RequestIntent {
    #[must_use]
    pub const fn single(document: Document, variables: Option<Variables>) -> Self {
        Self::Single {
            document,
            variables,
        }
    }

    /// Builds a batch intent from `(document, variables)` pairs.
    pub fn batch<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Document, Option<Variables>)>,
    {
        let (documents, variables): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        let has_mutations = documents.iter().any(|d| d.is_mutation);
        Self::Batch {
            documents,
            has_mutations,
            variables,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Single { .. } => "single",
            Self::Batch { .. } => "batch",
        }
    }

    #[must_use]
    pub fn has_mutations(&self) -> bool {
        match self {
            Self::Single { document, .. } => document.is_mutation,
            Self::Batch { has_mutations, .. } => *has_mutations,
        }
    }

    /// The request as reported back on errors.
    #[must_use]
    pub fn context(&self) -> RequestContext {
        match self {
            Self::Single {
                document,
                variables,
            } => RequestContext::Single {
                query: document.expression.clone(),
                variables: variables.clone(),
            },
            Self::Batch {
                documents,
                variables,
                ..
            } => RequestContext::Batch {
                queries: documents.iter().map(|d| d.expression.clone()).collect(),
                variables: variables.clone(),
            },
        }
    }
}
