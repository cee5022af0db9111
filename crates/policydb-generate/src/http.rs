use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use policydb_core::{Error, Result};

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {e}")))
}

/// Send a request and decode a JSON success body. Network failures become
/// `Transport`, non-success statuses become `Provider`.
pub(crate) fn send_json<T: DeserializeOwned>(provider: &str, request: RequestBuilder) -> Result<T> {
    let resp = request.send().map_err(|e| Error::Transport(format!("{provider}: {e}")))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(Error::Provider { provider: provider.to_string(), status: status.as_u16(), body });
    }
    resp.json::<T>().map_err(|e| Error::Provider {
        provider: provider.to_string(),
        status: status.as_u16(),
        body: format!("malformed response: {e}"),
    })
}

/// A 200 reply that carried no completion.
pub(crate) fn empty_response(provider: &str) -> Error {
    Error::Provider { provider: provider.to_string(), status: 200, body: "empty response".into() }
}

pub(crate) fn endpoint(base_url: &str, default_base: &str, path: &str) -> String {
    let base = if base_url.trim().is_empty() { default_base } else { base_url.trim() };
    format!("{}/{}", base.trim_end_matches('/'), path)
}
