//! The raw tenant config map shape every driver's `Initialize` consumes, and
//! the raw webhook request shape every `IncomingWebhook` implementation
//! consumes.

use std::collections::HashMap;

use masking::Secret;

/// Raw tenant config map as handed to a driver's `Initialize`/`ValidateConfig`.
pub type ConfigMap = HashMap<String, Secret<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// The raw inbound data an `IncomingWebhook` implementation validates
/// against.
#[derive(Debug, Clone)]
pub struct RequestDetails {
    pub method: HttpMethod,
    pub uri: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RequestDetails {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
