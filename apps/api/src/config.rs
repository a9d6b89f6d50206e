use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which `RoutineStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dynamodb" | "dynamo" => Ok(StoreBackend::DynamoDb),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => bail!("STORE_BACKEND must be 'dynamodb' or 'memory', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub store_backend: StoreBackend,
    /// Endpoint override for DynamoDB Local and similar emulators.
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            table_name: require_env("TABLE_NAME")?,
            store_backend: optional_env("STORE_BACKEND")
                .unwrap_or_else(|| "dynamodb".to_string())
                .parse()?,
            dynamodb_endpoint: optional_env("DYNAMODB_ENDPOINT"),
            aws_region: optional_env("AWS_REGION"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
