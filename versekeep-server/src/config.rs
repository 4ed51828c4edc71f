//! Server configuration

/// Server configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Session lifetime in days
    pub session_ttl_days: i64,

    /// Minutes a magic-link login code stays valid
    pub login_code_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or(defaults.database_path);

        let session_ttl_days = std::env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.session_ttl_days);

        let login_code_ttl_minutes = std::env::var("LOGIN_CODE_TTL_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.login_code_ttl_minutes);

        Self {
            port,
            database_path,
            session_ttl_days,
            login_code_ttl_minutes,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_path: "versekeep.db".to_string(),
            session_ttl_days: 30,
            login_code_ttl_minutes: 15,
        }
    }
}
