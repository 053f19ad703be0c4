use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("element declares `{attribute}` but has no `q:container` ancestor")]
    MissingContainer { attribute: String },
    #[error("invalid handler reference `{reference}`: {source}")]
    InvalidReference {
        reference: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to load module {url}: {source}")]
    ModuleLoad {
        url: Url,
        #[source]
        source: anyhow::Error,
    },
    #[error("module {url} has no export named `{symbol}`")]
    MissingExport { url: Url, symbol: String },
    #[error("container has no local handler `{symbol}`")]
    MissingLocalHandler { symbol: String },
    #[error("failed to parse container state: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("handler `{symbol}` failed: {source}")]
    Handler {
        symbol: String,
        #[source]
        source: anyhow::Error,
    },
}
