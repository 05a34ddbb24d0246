use thiserror::Error;

/// Failure to retrieve a document. Fatal for the listing, recoverable for profiles.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Profile pages that carry no biographical data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Unusable {
    #[error("disambiguation page")]
    Disambiguation,
    #[error("article does not exist or has no content")]
    MissingArticle,
}
