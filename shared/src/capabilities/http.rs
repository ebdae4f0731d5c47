use serde::{Deserialize, Serialize};
use thiserror::Error;

use crux_core::capability::{Capability, CapabilityContext, Operation};

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_REQUEST_BODY_SIZE: usize = 64 * 1024;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MAX_TIMEOUT_MS: u64 = 300_000;
pub const MAX_HEADER_NAME_LENGTH: usize = 256;
pub const MAX_HEADER_VALUE_LENGTH: usize = 8192;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }

    pub fn has_request_body(&self) -> bool {
        matches!(self, HttpMethod::Post)
    }
}

/// A request handed to the shell. The shell owns the actual transport and
/// must report `HttpError::Timeout` once `timeout_ms` has elapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    timeout_ms: u64,
    request_id: String,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Result<Self, HttpError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(HttpError::InvalidRequest {
                reason: "URL cannot be empty".to_string(),
            });
        }
        if url.len() > MAX_URL_LENGTH {
            return Err(HttpError::InvalidRequest {
                reason: format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            });
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        Ok(Self {
            method,
            url,
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                (REQUEST_ID_HEADER.to_string(), request_id.clone()),
            ],
            body: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            request_id,
        })
    }

    pub fn get(url: impl Into<String>) -> Result<Self, HttpError> {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Result<Self, HttpError> {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, HttpError> {
        let name = name.into();
        let value = value.into();
        validate_header(&name, &value)?;

        let lower = name.to_lowercase();
        self.headers.retain(|(n, _)| n.to_lowercase() != lower);
        self.headers.push((name, value));
        Ok(self)
    }

    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, HttpError> {
        if !self.method.has_request_body() {
            return Err(HttpError::InvalidRequest {
                reason: format!("{} requests cannot have a body", self.method.as_str()),
            });
        }

        let body = serde_json::to_vec(value).map_err(|e| HttpError::Serialization {
            message: e.to_string(),
        })?;
        if body.len() > MAX_REQUEST_BODY_SIZE {
            return Err(HttpError::BodyTooLarge {
                size: body.len(),
                max: MAX_REQUEST_BODY_SIZE,
            });
        }

        let mut request = self.with_header("Content-Type", "application/json")?;
        request.body = Some(body);
        Ok(request)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Result<Self, HttpError> {
        if timeout_ms == 0 {
            return Err(HttpError::InvalidRequest {
                reason: "timeout cannot be zero".to_string(),
            });
        }
        if timeout_ms > MAX_TIMEOUT_MS {
            return Err(HttpError::InvalidRequest {
                reason: format!("timeout exceeds maximum of {MAX_TIMEOUT_MS}ms"),
            });
        }
        self.timeout_ms = timeout_ms;
        Ok(self)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| n.to_lowercase() == lower)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn body_json(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_slice(b).ok())
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

fn validate_header(name: &str, value: &str) -> Result<(), HttpError> {
    if name.is_empty() || name.len() > MAX_HEADER_NAME_LENGTH {
        return Err(HttpError::InvalidHeader {
            name: name.chars().take(50).collect(),
            reason: format!("header name must be 1..={MAX_HEADER_NAME_LENGTH} bytes"),
        });
    }
    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
    {
        return Err(HttpError::InvalidHeader {
            name: name.to_string(),
            reason: format!("invalid character '{c}' in header name"),
        });
    }
    if value.len() > MAX_HEADER_VALUE_LENGTH {
        return Err(HttpError::InvalidHeader {
            name: name.to_string(),
            reason: format!("header value exceeds maximum length of {MAX_HEADER_VALUE_LENGTH} bytes"),
        });
    }
    if value.contains(['\r', '\n', '\0']) {
        return Err(HttpError::InvalidHeader {
            name: name.to_string(),
            reason: "header value contains invalid characters (CR, LF, or NULL)".to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_json<T: Serialize>(status: u16, value: &T) -> Result<Self, HttpError> {
        let body = serde_json::to_vec(value).map_err(|e| HttpError::Serialization {
            message: e.to_string(),
        })?;
        Ok(Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| n.to_lowercase() == lower)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::InvalidResponse {
            reason: format!("failed to parse JSON: {e}"),
        })
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("request body too large: {size} bytes exceeds maximum of {max} bytes")]
    BodyTooLarge { size: usize, max: usize },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("connection failed: {message}")]
    Connection { message: String },

    #[error("timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },
}

pub type HttpResult = Result<HttpResponse, HttpError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpOperation {
    Execute(HttpRequest),
}

impl Operation for HttpOperation {
    type Output = HttpResult;
}

pub struct Http<Ev> {
    context: CapabilityContext<HttpOperation, Ev>,
}

impl<Ev> Capability<Ev> for Http<Ev> {
    type Operation = HttpOperation;
    type MappedSelf<MappedEv> = Http<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Http::new(self.context.map_event(f))
    }
}

impl<Ev> Http<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<HttpOperation, Ev>) -> Self {
        Self { context }
    }

    /// Sends `request` to the shell and feeds the outcome back through `callback`.
    pub fn send<F>(&self, request: HttpRequest, callback: F)
    where
        F: FnOnce(HttpResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(HttpOperation::Execute(request))
                .await;
            ctx.update_app(callback(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_json_sets_body_and_content_type() {
        let request = HttpRequest::post("/api/districts")
            .and_then(|r| r.with_json(&serde_json::json!({ "state": "Delhi" })))
            .expect("valid request");

        assert_eq!(request.method(), HttpMethod::Post);
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(
            request.body_json(),
            Some(serde_json::json!({ "state": "Delhi" }))
        );
    }

    #[test]
    fn get_rejects_body() {
        let err = HttpRequest::get("/api/states")
            .and_then(|r| r.with_json(&serde_json::json!({})))
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidRequest { .. }));
    }

    #[test]
    fn request_id_header_matches_field() {
        let request = HttpRequest::get("/api/states").expect("valid request");
        assert_eq!(request.header(REQUEST_ID_HEADER), Some(request.request_id()));
    }

    #[test]
    fn header_injection_rejected() {
        let err = HttpRequest::get("/api/states")
            .and_then(|r| r.with_header("X-Test", "a\r\nb"))
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeader { .. }));
    }

    #[test]
    fn timeout_bounds_enforced() {
        let request = HttpRequest::get("/api/states").expect("valid request");
        assert!(request.clone().with_timeout_ms(0).is_err());
        assert!(request.clone().with_timeout_ms(MAX_TIMEOUT_MS + 1).is_err());
        assert_eq!(
            request.with_timeout_ms(5_000).expect("in range").timeout_ms(),
            5_000
        );
    }

    #[test]
    fn empty_url_rejected() {
        assert!(HttpRequest::get("   ").is_err());
    }

    #[test]
    fn response_json_decodes() {
        let response = HttpResponse::with_json(200, &serde_json::json!({ "success": true }))
            .expect("serializable");
        assert!(response.is_success());
        let value: serde_json::Value = response.json().expect("json body");
        assert_eq!(value["success"], true);
    }

    #[test]
    fn response_invalid_json_is_error() {
        let response = HttpResponse::new(200, b"<html>".to_vec());
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, HttpError::InvalidResponse { .. }));
    }
}
