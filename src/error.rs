use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Scraping error: {0}")]
    Scraper(#[from] ScraperError),

    #[error("Walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AppError {
    /// Short label used when logging the error.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Client(_) => "client",
            AppError::Session(_) => "session",
            AppError::Scraper(_) => "scraper",
            AppError::Walk(_) => "walk",
            AppError::Io(_) => "io",
            AppError::Serde(_) => "serde",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Walk(WalkError::Cancelled))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required configuration: {0}")]
    MissingField(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build client: {0}")]
    BuildError(String),

    #[error("Request to {url} failed: {message}")]
    RequestFailed { url: String, message: String },

    #[error("Response error {status_code} from {url}")]
    ResponseError { status_code: u16, url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Login rejected (user name and password do not match), redirected to {location:?}")]
    LoginRejected { location: String },

    #[error("Login response did not carry the {name} cookie")]
    MissingSessionCookie { name: String },

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Empty search value")]
    EmptySearchValue,
}

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Failed to extract {entity}.{field} at {locator}")]
    Extraction {
        entity: &'static str,
        field: &'static str,
        locator: String,
    },
}

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("{listing} page {page}: {source}")]
    Page {
        listing: String,
        page: usize,
        #[source]
        source: Box<AppError>,
    },

    #[error("{listing} page {page} row {row}: {source}")]
    Row {
        listing: String,
        page: usize,
        row: usize,
        #[source]
        source: Box<AppError>,
    },

    #[error("detail fetch for row {row}: {source}")]
    Detail {
        row: usize,
        #[source]
        source: Box<AppError>,
    },

    #[error("{stage} handler failed for {id}: {source}")]
    Callback {
        stage: &'static str,
        id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Walk cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, AppError>;
