use rand::RngExt;
use reqwest::Url;

use crate::errors::{CheckError, Result};

/// Four digit suffix for names of resources created during a run.
pub(crate) fn random_suffix() -> u16 {
    rand::rng().random_range(1000..=9999)
}

/// `scheme://[user[:password]@]host[:port]` of the API base url. Default
/// ports are normalised away by the url parser.
pub(crate) fn origin(base_url: &str) -> Result<String> {
    let invalid = |reason: String| CheckError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason,
    };

    let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    let host = url
        .host_str()
        .ok_or_else(|| invalid("missing host".to_string()))?;

    let mut origin = format!("{}://", url.scheme());
    if !url.username().is_empty() {
        origin.push_str(url.username());
        if let Some(password) = url.password() {
            origin.push(':');
            origin.push_str(password);
        }
        origin.push('@');
    }
    origin.push_str(host);
    if let Some(port) = url.port() {
        origin.push_str(&format!(":{}", port));
    }
    Ok(origin)
}
