mod builder;
mod cookies;

use crate::error::{ClientError, Result};
use async_trait::async_trait;
pub use builder::ClientBuilder;
pub use cookies::CookieStore;
use http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use reqwest::Client as ReqwestClient;
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct ClientResponse {
    pub status: u16,
    /// `Location` header of a redirect.
    pub location: Option<String>,
    /// Raw `Set-Cookie` header values, in response order.
    pub set_cookies: Vec<String>,
    pub content: String,
}

impl ClientResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// The HTTP seam of a session. Implementations must not follow redirects:
/// the login outcome is read from the redirect itself.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, cookie: Option<&str>) -> Result<ClientResponse>;

    async fn post_form(&self, url: &Url, form: &str, cookie: Option<&str>)
        -> Result<ClientResponse>;
}

pub struct Client {
    inner: ReqwestClient,
    base_url: Url,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn read(url: &Url, response: reqwest::Response) -> Result<ClientResponse> {
        let status = response.status().as_u16();
        let headers = response.headers();
        let location = headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let set_cookies = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        let content = response.text().await.map_err(|e| ClientError::RequestFailed {
            url: url.to_string(),
            message: format!("Failed to get response text: {}", e),
        })?;

        Ok(ClientResponse {
            status,
            location,
            set_cookies,
            content,
        })
    }
}

#[async_trait]
impl Transport for Client {
    async fn get(&self, url: &Url, cookie: Option<&str>) -> Result<ClientResponse> {
        let mut request = self.inner.get(url.as_str());
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await.map_err(|e| ClientError::RequestFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Self::read(url, response).await
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &str,
        cookie: Option<&str>,
    ) -> Result<ClientResponse> {
        let mut request = self
            .inner
            .post(url.as_str())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("accept", "*/*")
            .body(form.to_string());
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await.map_err(|e| ClientError::RequestFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Self::read(url, response).await
    }
}
