//! Router options: endpoint, allowlist, CORS origin, transport, id format.

use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Identifier format accepted in `/<resource>/<id>` paths.
#[derive(Clone, Debug, Default)]
pub enum IdFormat {
    #[default]
    Integer,
    Uuid,
    Any,
    Pattern(Regex),
}

impl IdFormat {
    pub fn is_valid(&self, id: &str) -> bool {
        match self {
            IdFormat::Integer => id.parse::<i64>().is_ok(),
            IdFormat::Uuid => uuid::Uuid::parse_str(id).is_ok(),
            IdFormat::Any => !id.is_empty(),
            IdFormat::Pattern(re) => re.is_match(id),
        }
    }
}

impl std::str::FromStr for IdFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(pattern) = s.strip_prefix("pattern:") {
            let re = Regex::new(pattern).map_err(|e| ConfigError::InvalidIdFormat(e.to_string()))?;
            return Ok(IdFormat::Pattern(re));
        }
        match s.to_lowercase().as_str() {
            "integer" | "int" => Ok(IdFormat::Integer),
            "uuid" => Ok(IdFormat::Uuid),
            "any" => Ok(IdFormat::Any),
            _ => Err(ConfigError::InvalidIdFormat(format!(
                "{} (expected integer, uuid, any or pattern:<regex>)",
                s
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Base path the resource routes are nested under.
    pub endpoint: String,
    /// Routable model names. `None` means every registered model.
    pub allowed: Option<Vec<String>>,
    pub allow_origin: String,
    /// Transport name: `json-api` or `json`.
    pub transport: String,
    /// `integer`, `uuid`, `any` or `pattern:<regex>`.
    pub id_format: String,
    pub max_body_bytes: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        RouterOptions {
            endpoint: "/api".into(),
            allowed: None,
            allow_origin: String::new(),
            transport: "json-api".into(),
            id_format: "integer".into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl RouterOptions {
    /// Read options from `RESOURCE_*` env vars (after loading `.env`), falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut opts = RouterOptions::default();
        if let Ok(v) = std::env::var("RESOURCE_ENDPOINT") {
            opts.endpoint = v;
        }
        if let Ok(v) = std::env::var("RESOURCE_ALLOWED") {
            let names: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            opts.allowed = Some(names);
        }
        if let Ok(v) = std::env::var("RESOURCE_ALLOW_ORIGIN") {
            opts.allow_origin = v;
        }
        if let Ok(v) = std::env::var("RESOURCE_TRANSPORT") {
            opts.transport = v;
        }
        if let Ok(v) = std::env::var("RESOURCE_ID_FORMAT") {
            opts.id_format = v;
        }
        if let Ok(v) = std::env::var("RESOURCE_MAX_BODY_BYTES") {
            opts.max_body_bytes = v
                .parse()
                .map_err(|_| ConfigError::Validation(format!("RESOURCE_MAX_BODY_BYTES: {}", v)))?;
        }
        opts.id_format()?;
        Ok(opts)
    }

    pub fn id_format(&self) -> Result<IdFormat, ConfigError> {
        self.id_format.parse()
    }

    /// Endpoint normalized to a leading slash and no trailing slash ("" for root).
    pub fn normalized_endpoint(&self) -> String {
        let trimmed = self.endpoint.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}
