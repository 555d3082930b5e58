use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::errors::{CheckError, Result};

/// Marker substituted with the payload's id field before a call.
pub const ID_PLACEHOLDER: &str = "(id)";

/// Index of a payload owned by a [`PermissionGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadSlot(usize);

/// Where a created resource's id is read from after a passing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSource {
    /// Named field of the JSON response body
    Body(&'static str),
    /// Last path segment of the `Location` header
    Location,
}

/// One request with the status code the caller is expected to get back.
#[derive(Debug, Clone)]
pub struct PermissionCheck {
    pub method: Method,
    pub url: String,
    pub expected: StatusCode,
    pub payload: Option<PayloadSlot>,
    pub capture: Option<IdSource>,
    pub id_field: Option<&'static str>,
}

impl PermissionCheck {
    pub fn new(method: Method, url: impl Into<String>, expected: StatusCode) -> Self {
        Self {
            method,
            url: url.into(),
            expected,
            payload: None,
            capture: None,
            id_field: None,
        }
    }

    pub fn get(url: impl Into<String>, expected: StatusCode) -> Self {
        Self::new(Method::GET, url, expected)
    }

    pub fn post(url: impl Into<String>, expected: StatusCode) -> Self {
        Self::new(Method::POST, url, expected)
    }

    pub fn put(url: impl Into<String>, expected: StatusCode) -> Self {
        Self::new(Method::PUT, url, expected)
    }

    pub fn patch(url: impl Into<String>, expected: StatusCode) -> Self {
        Self::new(Method::PATCH, url, expected)
    }

    pub fn delete(url: impl Into<String>, expected: StatusCode) -> Self {
        Self::new(Method::DELETE, url, expected)
    }

    pub fn with_payload(mut self, slot: PayloadSlot) -> Self {
        self.payload = Some(slot);
        self
    }

    /// Payload field that feeds the placeholder and receives captured ids.
    pub fn id_field(mut self, field: &'static str) -> Self {
        self.id_field = Some(field);
        self
    }

    /// Capture `field` from the response body into the same payload field
    /// unless [`id_field`](Self::id_field) names another one.
    pub fn capture_from_body(mut self, field: &'static str) -> Self {
        self.capture = Some(IdSource::Body(field));
        self.id_field.get_or_insert(field);
        self
    }

    pub fn capture_from_location(mut self, field: &'static str) -> Self {
        self.capture = Some(IdSource::Location);
        self.id_field.get_or_insert(field);
        self
    }

    /// Url with the placeholder replaced by the payload's id.
    pub fn resolve_url(&self, payload: Option<&Value>) -> Result<String> {
        if !self.url.contains(ID_PLACEHOLDER) {
            return Ok(self.url.clone());
        }

        let field = self.id_field.unwrap_or_default();
        let missing = || CheckError::MissingPayloadId {
            url: self.url.clone(),
            field: field.to_string(),
        };

        let id = match payload.and_then(|p| p.get(field)) {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => return Err(missing()),
        };

        Ok(self.url.replace(ID_PLACEHOLDER, &id))
    }
}

/// Ordered checks for one resource plus the payloads they share.
#[derive(Debug, Default)]
pub struct PermissionGroup {
    payloads: Vec<Value>,
    checks: Vec<PermissionCheck>,
}

impl PermissionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_payload(&mut self, payload: Value) -> PayloadSlot {
        self.payloads.push(payload);
        PayloadSlot(self.payloads.len() - 1)
    }

    pub fn push(&mut self, check: PermissionCheck) {
        debug_assert!(check.payload.map_or(true, |s| s.0 < self.payloads.len()));
        self.checks.push(check);
    }

    pub fn checks(&self) -> &[PermissionCheck] {
        &self.checks
    }

    #[cfg(test)]
    pub fn payload(&self, slot: PayloadSlot) -> Option<&Value> {
        self.payloads.get(slot.0)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Visit checks in order, each with mutable access to its payload.
    /// Stops at the first error.
    pub fn try_for_each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&PermissionCheck, Option<&mut Value>) -> Result<()>,
    {
        let PermissionGroup { payloads, checks } = self;
        for check in checks.iter() {
            let payload = check.payload.and_then(|slot| payloads.get_mut(slot.0));
            f(check, payload)?;
        }
        Ok(())
    }
}
