use super::error::{CouchDaoError, CouchResult};

/// Database used when `COUCH_DB` is unset.
pub const DEFAULT_DATABASE: &str = "articulate";

/// Basic-auth credentials sent with every CouchDB request.
#[derive(Debug, Clone)]
pub struct CouchCredentials {
    /// Login name.
    pub username: String,
    /// Password sent in clear over basic auth.
    pub password: String,
}

/// Where the key-value documents live.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server URL, without the database path.
    pub base_url: String,
    /// Database holding one document per key.
    pub database: String,
    /// Credentials; anonymous access when absent.
    pub credentials: Option<CouchCredentials>,
}

impl CouchConfig {
    /// Anonymous access to `database` on the server at `base_url`.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            credentials: None,
        }
    }

    /// Authenticate every request with `username` and `password`.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(CouchCredentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Read `COUCH_BASE_URL`, `COUCH_DB`, `COUCH_USERNAME` and `COUCH_PASSWORD`.
    ///
    /// Credentials are only used when both halves are set.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = std::env::var("COUCH_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(CouchDaoError::MissingEnvVar {
                var: "COUCH_BASE_URL",
            })?;
        let database = std::env::var("COUCH_DB")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.into());

        let config = Self::new(base_url.trim_end_matches('/'), database);
        Ok(
            match (std::env::var("COUCH_USERNAME"), std::env::var("COUCH_PASSWORD")) {
                (Ok(username), Ok(password)) => config.with_credentials(username, password),
                _ => config,
            },
        )
    }
}
