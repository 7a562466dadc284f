//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use url::Url;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): PostgreSQL connection string. Without it the
///   service keeps its documents in memory.
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `PUBLIC_ORIGIN` (optional): origin used in customer and tracking links
/// - `CUSTOMER_LINK_TTL_HOURS` (optional): default customer link lifetime, 48
/// - `UPSIZE_SURCHARGE_CENTS` (optional): surcharge for large drinks, 1000
/// - `SESSION_TTL_HOURS` (optional): staff session lifetime, 12
/// - `BUSINESS_UTC_OFFSET_HOURS` (optional): timezone for "today", 8
/// - `BOOTSTRAP_STAFF_EMAIL` / `BOOTSTRAP_STAFF_PASSWORD` (optional): seed account
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_public_origin")]
    pub public_origin: String,

    #[serde(default = "default_link_ttl_hours")]
    pub customer_link_ttl_hours: u32,

    #[serde(default = "default_upsize_surcharge")]
    pub upsize_surcharge_cents: i64,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,

    #[serde(default = "default_utc_offset_hours")]
    pub business_utc_offset_hours: i32,

    pub bootstrap_staff_email: Option<String>,
    pub bootstrap_staff_password: Option<String>,
}

/// Upper bound for link and session lifetimes, ten years.
const MAX_TTL_HOURS: u32 = 24 * 365 * 10;

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_public_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_link_ttl_hours() -> u32 {
    48
}

/// ₱10.00 in centavos.
fn default_upsize_surcharge() -> i64 {
    1000
}

fn default_session_ttl_hours() -> u32 {
    12
}

/// Philippine Standard Time.
fn default_utc_offset_hours() -> i32 {
    8
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment variable values cannot be parsed into expected types
    /// - `PUBLIC_ORIGIN` is not an absolute http(s) URL
    /// - A numeric setting is out of range
    pub fn from_env() -> anyhow::Result<Self> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.public_origin()?;

        if self.upsize_surcharge_cents < 0 {
            anyhow::bail!("UPSIZE_SURCHARGE_CENTS must not be negative");
        }
        if !(-12..=14).contains(&self.business_utc_offset_hours) {
            anyhow::bail!("BUSINESS_UTC_OFFSET_HOURS must be between -12 and 14");
        }
        if self.customer_link_ttl_hours > MAX_TTL_HOURS {
            anyhow::bail!("CUSTOMER_LINK_TTL_HOURS must be at most {MAX_TTL_HOURS}");
        }
        if self.session_ttl_hours == 0 || self.session_ttl_hours > MAX_TTL_HOURS {
            anyhow::bail!("SESSION_TTL_HOURS must be between 1 and {MAX_TTL_HOURS}");
        }

        Ok(())
    }

    /// Parsed `PUBLIC_ORIGIN`.
    pub fn public_origin(&self) -> anyhow::Result<Url> {
        let url = Url::parse(&self.public_origin)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => anyhow::bail!("PUBLIC_ORIGIN must use http or https, got {other}"),
        }
    }

    /// Staff credentials to seed at startup, when both halves are present.
    pub fn bootstrap_staff(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_staff_email, &self.bootstrap_staff_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            server_port: default_port(),
            public_origin: default_public_origin(),
            customer_link_ttl_hours: default_link_ttl_hours(),
            upsize_surcharge_cents: default_upsize_surcharge(),
            session_ttl_hours: default_session_ttl_hours(),
            business_utc_offset_hours: default_utc_offset_hours(),
            bootstrap_staff_email: None,
            bootstrap_staff_password: None,
        }
    }
}
