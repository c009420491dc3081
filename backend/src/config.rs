// src/config.rs

use std::env;
use dotenvy::dotenv;

use crate::models::review::ReviewOrder;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without it the in-memory store is used.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub review_order: ReviewOrder,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set".to_string())?;

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        let review_order = match env::var("REVIEW_ORDER") {
            Ok(v) => v.parse::<ReviewOrder>()?,
            Err(_) => ReviewOrder::default(),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
            cors_origins,
            review_order,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
