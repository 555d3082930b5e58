use reqwest::Method;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(
        "Failed to call the {method} {url}, expected status code is {expected}, but got {actual}, error msg is {body}"
    )]
    UnexpectedStatus {
        method: Method,
        url: String,
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response of {url} has no usable id in body field `{field}`")]
    MissingBodyId { url: String, field: String },

    #[error("response of {url} has no usable Location header")]
    MissingLocation { url: String },

    #[error("cannot store id from {url}: payload is not a JSON object")]
    PayloadNotObject { url: String },

    #[error("payload has no `{field}` to substitute into {url}")]
    MissingPayloadId { url: String, field: String },

    #[error("invalid base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("resource {0} needs ADMIN_USER_NAME and ADMIN_PASSWORD to prepare its fixtures")]
    MissingAdminCredentials(&'static str),

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CheckError>;
