use miette::Diagnostic;
use std::io;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum JmcError {
    #[error("Cannot read '{path}'")]
    #[diagnostic(
        code(jmc::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Error, Debug, Diagnostic)]
pub enum CatalogError {
    #[error("Cannot read snippet catalog '{path}'")]
    #[diagnostic(
        code(jmc::catalog::read),
        help("Check that the snippet file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Snippet catalog is not valid JSON")]
    #[diagnostic(
        code(jmc::catalog::parse),
        help("The snippet file must be a JSON object mapping function names to snippets.")
    )]
    Parse {
        #[source]
        source: serde_json::Error,
    },
}
