use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;

use crate::store::is_sql_identifier;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,
    pub database_name: String,
    pub database_max_connections: u32,

    // HTTP
    pub allowed_origins: Vec<HeaderValue>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_name =
            std::env::var("DATABASE_NAME").unwrap_or_else(|_| "kelma".to_string());
        if !is_sql_identifier(&database_name) {
            bail!(
                "DATABASE_NAME '{}' must be letters, digits and underscores",
                database_name
            );
        }

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            // Database - postgres:// URL, or memory:// for the in-process store
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            database_name,
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            // HTTP
            allowed_origins: parse_origins(&allowed_origins)?,
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
        })
    }
}

/// Split a comma-separated origin list, skipping blanks.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid origin in ALLOWED_ORIGINS: {}", origin))
        })
        .collect()
}
