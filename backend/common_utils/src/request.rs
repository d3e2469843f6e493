//! The wire-agnostic HTTP request a driver builds. Drivers never touch
//! `reqwest` directly — the shared client's thread-safety is the
//! executor's concern, not the driver's; they describe
//! method, URL, headers and body here, and `external-services`' executor
//! turns this into an actual HTTP call, keeping request construction
//! separate from request execution.

use masking::Secret;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// The body a driver hands to the executor. Variants cover every encoding
/// the eight providers need: İyzico/Papara
/// speak JSON, Nkolay speaks multipart form fields, PayTR/PayU speak
/// `application/x-www-form-urlencoded`.
#[derive(Debug, Clone)]
pub enum RequestContent {
    Json(serde_json::Value),
    FormUrlEncoded(Vec<(String, String)>),
    FormData(Vec<(String, String)>),
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    /// Header values are `Secret` so a driver that places a credential in a
    /// header (İyzico's `IYZWS` auth, Stripe's bearer token) cannot have it
    /// land in a `{:?}` log line by accident.
    pub headers: Vec<(String, Secret<String>)>,
    pub body: Option<RequestContent>,
}

pub struct RequestBuilder {
    method: Method,
    url: String,
    headers: Vec<(String, Secret<String>)>,
    body: Option<RequestContent>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: Method::Post,
            url: String::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<Secret<String>>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: Vec<(String, Secret<String>)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn body(mut self, body: RequestContent) -> Self {
        self.body = Some(body);
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The raw bytes an executor hands back to a driver's response handler,
/// before any provider-specific parsing.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

impl RawResponse {
    pub fn body_as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
