use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

use crate::args::Args;
use crate::check::{IdSource, PermissionCheck, PermissionGroup};
use crate::errors::{CheckError, Result};
use crate::response;

const SEPARATOR: &str = "=================================================";

/// Blocking http client bound to one set of basic auth credentials.
pub(crate) struct Session {
    client: Client,
    username: String,
    password: String,
}

impl Session {
    pub(crate) fn new(args: &Args, username: &str, password: &str) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(args.insecure)
            .timeout(Duration::from_secs(args.timeout_secs))
            .build()
            .map_err(CheckError::Client)?;

        Ok(Session {
            client,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub(crate) fn username(&self) -> &str {
        &self.username
    }

    /// Send `payload` as a JSON body; `null` when there is none.
    pub(crate) fn send(&self, method: Method, url: &str, payload: Option<&Value>) -> Result<Response> {
        let body = serde_json::to_string(payload.unwrap_or(&Value::Null))?;

        log::debug!("{} {} as {}", method, url, self.username);
        self.client
            .request(method.clone(), url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|source| CheckError::Transport {
                method,
                url: url.to_string(),
                source,
            })
    }

    /// Perform one check and, when it passes, store the captured id.
    pub(crate) fn call(&self, check: &PermissionCheck, mut payload: Option<&mut Value>) -> Result<()> {
        let url = check.resolve_url(payload.as_deref())?;

        println!("{}", SEPARATOR);
        println!("call: {} {}", check.method, url);
        println!("payload: {}", serde_json::to_string(&payload.as_deref())?);
        println!("{}\n", SEPARATOR);

        let response = self.send(check.method.clone(), &url, payload.as_deref())?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .unwrap_or_else(|_| String::from("No response body"));

        if status != check.expected {
            return Err(CheckError::UnexpectedStatus {
                method: check.method.clone(),
                url,
                expected: check.expected.as_u16(),
                actual: status.as_u16(),
                body: text,
            });
        }

        let (Some(source), Some(field)) = (&check.capture, check.id_field) else {
            return Ok(());
        };

        let id = match source {
            IdSource::Body(res_field) => response::id_from_body(&text, res_field, &url)?,
            IdSource::Location => response::id_from_location(&headers, &url)?,
        };

        log::debug!("captured {}={} from {}", field, id, url);
        store_id(payload.as_deref_mut(), field, id, &url)
    }

    /// Run every check of `group` in order, stopping at the first failure.
    pub(crate) fn run(&self, group: &mut PermissionGroup) -> Result<()> {
        let total = group.len();
        let mut passed = 0;

        if group.is_empty() {
            log::warn!("Nothing to check");
            return Ok(());
        }
        for check in group.checks() {
            log::debug!("planned: {} {} -> {}", check.method, check.url, check.expected);
        }

        group.try_for_each(|check, payload| {
            self.call(check, payload)?;
            passed += 1;
            Ok(())
        })?;

        log::info!("{}/{} checks passed as {}", passed, total, self.username);
        Ok(())
    }
}

/// Write a captured id into the payload so later checks can use it.
fn store_id(payload: Option<&mut Value>, field: &str, id: i64, url: &str) -> Result<()> {
    match payload {
        Some(Value::Object(map)) => {
            map.insert(field.to_string(), Value::from(id));
            Ok(())
        }
        _ => Err(CheckError::PayloadNotObject {
            url: url.to_string(),
        }),
    }
}
