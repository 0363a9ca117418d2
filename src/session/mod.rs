//! Authenticated access to the server.
//!
//! A [`Session`] owns the transport, the cookie store and the endpoint map.
//! Nothing but `login` may reach the server before the session is
//! authenticated.

mod queries;

pub use queries::SearchBy;

use crate::client::{Client, CookieStore, Transport};
use crate::error::{AppError, ClientError, Result, SessionError};
use crate::{log_debug, log_info, log_warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::{form_urlencoded, Url};

/// Name of the cookie that carries the server-side session.
pub const SESSION_COOKIE: &str = "JSESSIONID";

/// Label of the login button, posted with the login form.
const LOGIN_BUTTON: &str = "登录";

#[derive(Clone)]
pub struct SessionConfig {
    pub server_url: String,
    pub organization: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("server_url", &self.server_url)
            .field("organization", &self.organization)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    /// Landing page a successful login redirects to.
    MainController,
    Logout,
    StudentSearch,
    ViewStudent,
    ListCategoryAndClass,
    ViewCategory,
    ViewClass,
    ListStudentsOfClass,
}

impl Endpoint {
    pub const ALL: [Endpoint; 9] = [
        Endpoint::Login,
        Endpoint::MainController,
        Endpoint::Logout,
        Endpoint::StudentSearch,
        Endpoint::ViewStudent,
        Endpoint::ListCategoryAndClass,
        Endpoint::ViewCategory,
        Endpoint::ViewClass,
        Endpoint::ListStudentsOfClass,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Login => "/j_spring_security_check",
            Endpoint::MainController => "/standard/mainController.controller",
            Endpoint::Logout => "/j_spring_security_logout",
            Endpoint::StudentSearch => "/edu/student/search.action",
            Endpoint::ViewStudent => "/edu/student/basicinfo/viewstudent.action",
            Endpoint::ListCategoryAndClass => {
                "/edu/base/clazzInstance/listCategoryAndClazzInstanceForClazzInstance.action"
            }
            Endpoint::ViewCategory => "/edu/base/clazz/viewClazz.action",
            Endpoint::ViewClass => "/edu/base/clazzInstance/viewClazzInstance.action",
            Endpoint::ListStudentsOfClass => {
                "/edu/student/basicinfo/liststudentbyclazzinstance.action"
            }
        }
    }
}

/// Endpoint URLs resolved against the server URL once, at session creation.
#[derive(Debug, Clone)]
pub struct Endpoints {
    urls: HashMap<Endpoint, Url>,
}

impl Endpoints {
    pub fn resolve(base_url: &Url) -> Result<Self> {
        let urls = Endpoint::ALL
            .iter()
            .map(|&endpoint| {
                base_url
                    .join(endpoint.path())
                    .map(|url| (endpoint, url))
                    .map_err(|e| {
                        AppError::from(ClientError::InvalidUrl(format!(
                            "{}: {}",
                            endpoint.path(),
                            e
                        )))
                    })
            })
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self { urls })
    }

    pub fn url(&self, endpoint: Endpoint) -> Result<&Url> {
        self.urls.get(&endpoint).ok_or_else(|| {
            ClientError::InvalidUrl(format!("unresolved endpoint {:?}", endpoint)).into()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NotAuthenticated,
    Authenticated,
}

pub struct Session {
    config: SessionConfig,
    base_url: Url,
    endpoints: Endpoints,
    transport: Arc<dyn Transport>,
    cookies: CookieStore,
    state: AuthState,
}

impl Session {
    /// Creates a session talking to the server through a `reqwest` client
    /// with default settings.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let client = Client::builder()
            .base_url(&config.server_url)
            .timeout(Duration::from_secs(30))
            .header("accept", "text/html,application/xhtml+xml,*/*")?
            .build()?;
        Self::with_client(config, client)
    }

    pub fn with_client(config: SessionConfig, client: Client) -> Result<Self> {
        let base_url = client.base_url().clone();
        Self::from_parts(config, base_url, Arc::new(client))
    }

    /// Creates a session over any transport, e.g. an in-memory server.
    pub fn with_transport(config: SessionConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let base_url = Url::parse(&config.server_url)
            .map_err(|e| ClientError::InvalidUrl(format!("Invalid base URL: {}", e)))?;

        Self::from_parts(config, base_url, transport)
    }

    fn from_parts(
        config: SessionConfig,
        base_url: Url,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let endpoints = Endpoints::resolve(&base_url)?;

        Ok(Self {
            config,
            base_url,
            endpoints,
            transport,
            cookies: CookieStore::new(),
            state: AuthState::NotAuthenticated,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub async fn login(&mut self) -> Result<()> {
        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("dispatcher", "bpm")
            .append_pair(
                "j_username",
                &format!("{},{}", self.config.user, self.config.organization),
            )
            .append_pair("j_yey", &self.config.organization)
            .append_pair("j_username0", &self.config.user)
            .append_pair("j_password", &self.config.password)
            .append_pair("button", LOGIN_BUTTON)
            .finish();

        let url = self.endpoints.url(Endpoint::Login)?;
        log_info!("[session] Logging in to {} as {}", url, self.config.user);
        let response = self.transport.post_form(url, &form, None).await?;

        let location = response.location.clone().unwrap_or_default();
        if !response.is_redirect() || !location.ends_with(Endpoint::MainController.path()) {
            return Err(SessionError::LoginRejected { location }.into());
        }

        // A fresh jar: nothing of an earlier session survives a new login.
        let cookies = CookieStore::new();
        cookies.store(&response.set_cookies, url).await;

        let landing = self.endpoints.url(Endpoint::MainController)?;
        let session_id = cookies.get(landing, SESSION_COOKIE).await.unwrap_or_default();
        if session_id.is_empty() {
            return Err(SessionError::MissingSessionCookie {
                name: SESSION_COOKIE.to_string(),
            }
            .into());
        }

        self.cookies = cookies;
        self.state = AuthState::Authenticated;

        log_info!("[session] Logged in");
        Ok(())
    }

    /// Best-effort logout: the session is unauthenticated afterwards whatever
    /// the server answers.
    pub async fn logout(&mut self) -> Result<()> {
        if !self.is_authenticated() {
            return Ok(());
        }

        let url = self.endpoints.url(Endpoint::Logout)?.clone();
        let cookie = self.cookies.header(&url).await;
        match self.transport.get(&url, cookie.as_deref()).await {
            Ok(response) => {
                log_debug!("[session] Logout answered {}", response.status);
            }
            Err(e) => {
                log_warn!("[session] Logout request failed: {}", e);
            }
        }

        self.cookies.clear().await;
        self.state = AuthState::NotAuthenticated;
        log_info!("[session] Logged out");
        Ok(())
    }

    /// GETs an endpoint with the given query parameters and returns the body.
    pub async fn fetch(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> Result<String> {
        let mut url = self.endpoints.url(endpoint)?.clone();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        self.fetch_url(&url).await
    }

    /// GETs an absolute URL.
    pub async fn fetch_url(&self, url: &Url) -> Result<String> {
        self.ensure_authenticated()?;

        let cookie = self.cookies.header(url).await;
        log_debug!("[session] GET {}", url);
        let response = self.transport.get(url, cookie.as_deref()).await?;

        if !response.is_success() {
            return Err(ClientError::ResponseError {
                status_code: response.status,
                url: url.to_string(),
            }
            .into());
        }

        Ok(response.content)
    }

    /// POSTs a form to an endpoint and returns the body.
    pub async fn post(&self, endpoint: Endpoint, form: &[(&str, &str)]) -> Result<String> {
        self.ensure_authenticated()?;

        let url = self.endpoints.url(endpoint)?;
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let cookie = self.cookies.header(url).await;
        let response = self.transport.post_form(url, &body, cookie.as_deref()).await?;

        if !response.is_success() {
            return Err(ClientError::ResponseError {
                status_code: response.status,
                url: url.to_string(),
            }
            .into());
        }

        Ok(response.content)
    }

    fn ensure_authenticated(&self) -> Result<()> {
        match self.state {
            AuthState::Authenticated => Ok(()),
            AuthState::NotAuthenticated => Err(SessionError::NotAuthenticated.into()),
        }
    }
}
