//! The one concrete `HttpExecutor` every driver's `DriverServices::http`
//! points at: one pooled `reqwest::Client` per proxy configuration, built
//! lazily and reused across requests so concurrent drivers never pay
//! connection setup twice.

use std::time::Duration;

use common_utils::request::{Method, RawResponse, Request, RequestContent};
use domain_types::errors::ConnectorError;
use domain_types::types::Proxy;
use interfaces::ports::HttpExecutor;
use masking::ExposeInterface;
use once_cell::sync::OnceCell;
use reqwest::Client;

/// Default per-call deadline: every provider call gets a 30 s timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static NON_PROXIED_CLIENT: OnceCell<Client> = OnceCell::new();
static PROXIED_CLIENT: OnceCell<Client> = OnceCell::new();

pub struct ReqwestExecutor {
    proxy: Proxy,
    timeout: Duration,
}

impl ReqwestExecutor {
    pub fn new(proxy: Proxy) -> Self {
        Self {
            proxy,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn client(&self, bypass_proxy: bool) -> Result<Client, ConnectorError> {
        let cell = if bypass_proxy || (self.proxy.http_url.is_none() && self.proxy.https_url.is_none()) {
            &NON_PROXIED_CLIENT
        } else {
            &PROXIED_CLIENT
        };
        cell.get_or_try_init(|| build_client(&self.proxy, bypass_proxy))
            .cloned()
    }
}

fn build_client(proxy: &Proxy, bypass_proxy: bool) -> Result<Client, ConnectorError> {
    let mut builder = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_idle_timeout(Duration::from_secs(proxy.idle_pool_connection_timeout.unwrap_or(90)));

    if !bypass_proxy {
        if let Some(url) = proxy.https_url.as_ref() {
            let p = reqwest::Proxy::https(url)
                .map_err(|error| ConnectorError::InvalidConfig(format!("invalid https proxy: {error}")))?;
            builder = builder.proxy(p);
        }
        if let Some(url) = proxy.http_url.as_ref() {
            let p = reqwest::Proxy::http(url)
                .map_err(|error| ConnectorError::InvalidConfig(format!("invalid http proxy: {error}")))?;
            builder = builder.proxy(p);
        }
    }

    builder
        .build()
        .map_err(|error| ConnectorError::InvalidConfig(format!("failed to build http client: {error}")))
}

#[async_trait::async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: Request) -> Result<RawResponse, ConnectorError> {
        let parsed_url = reqwest::Url::parse(&request.url)
            .map_err(|error| ConnectorError::InvalidDataFormat {
                field_name: "url",
                reason: error.to_string(),
            })?;
        let bypass_proxy = self.proxy.bypass_proxy_urls.contains(&parsed_url.to_string());
        let client = self.client(bypass_proxy)?;
        let metrics_host = parsed_url.host_str().unwrap_or("unknown").to_owned();
        let metrics_path = parsed_url.path().to_owned();
        let started_at = std::time::Instant::now();

        let mut builder = match request.method {
            Method::Get => client.get(parsed_url),
            Method::Post => client.post(parsed_url),
            Method::Delete => client.delete(parsed_url),
        }
        .timeout(self.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value.clone().expose());
        }

        builder = match request.body {
            Some(RequestContent::Json(value)) => builder.json(&value),
            Some(RequestContent::FormUrlEncoded(pairs)) => builder.form(&pairs),
            Some(RequestContent::FormData(fields)) => {
                let mut form = reqwest::multipart::Form::new();
                for (key, value) in fields {
                    form = form.text(key, value);
                }
                builder.multipart(form)
            }
            None => builder,
        };

        let response = builder.send().await.map_err(|error| {
            crate::metrics::record_provider_call(
                &metrics_host,
                &metrics_path,
                started_at.elapsed().as_secs_f64(),
                false,
            );
            if error.is_timeout() {
                ConnectorError::RequestTimeout
            } else {
                ConnectorError::RequestNotSent(error.to_string())
            }
        })?;

        let status_code = response.status().as_u16();
        crate::metrics::record_provider_call(
            &metrics_host,
            &metrics_path,
            started_at.elapsed().as_secs_f64(),
            response.status().is_success(),
        );
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_owned())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|error| ConnectorError::RequestNotSent(error.to_string()))?
            .to_vec();

        Ok(RawResponse {
            status_code,
            body,
            headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bypassed_and_direct_urls_share_the_non_proxied_client() {
        let proxy = Proxy::default();
        let executor = ReqwestExecutor::new(proxy);
        assert!(executor.client(true).is_ok());
        assert!(executor.client(false).is_ok());
    }
}
