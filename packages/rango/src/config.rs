use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session key.
    pub cookie_name: String,
    /// Lifetime of a session row and of its cookie.
    pub max_age_days: i64,
    /// Mark the cookie `Secure` (only sent over HTTPS).
    pub secure: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Directory that uploaded files are written to and served from.
    pub root: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    pub title: String,
    /// Bold message shown on the index page.
    pub tagline: String,
    /// Name shown on the about page.
    pub author: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub media: MediaConfig,
    pub site: SiteConfig,
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("database.url", "sqlite://rango.db?mode=rwc")?
            .set_default("session.cookie_name", "sessionid")?
            .set_default("session.max_age_days", 14)?
            .set_default("session.secure", false)?
            .set_default("media.root", "./media")?
            .set_default("media.max_upload_bytes", 5 * 1024 * 1024)?
            .set_default("site.title", "Rango")?
            .set_default("site.tagline", "Crunchy, creamy, cookie, candy, cupcake!")?
            .set_default("site.author", "kate")?
            .set_default("seed.enabled", false)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., RANGO__DATABASE__URL)
            .add_source(Environment::with_prefix("RANGO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
