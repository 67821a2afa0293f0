//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::helpers::{DateLocale, DateStyle};

/// Environment variable overriding `cms.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";

/// Environment variable overriding `cms.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    /// IANA timezone used to display publication dates; empty means UTC
    pub timezone: String,
    pub date_style: DateStyle,
    pub logo: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    pub cms: CmsConfig,
    pub listing: ListingConfig,
    pub paths: PathsConfig,
    pub server: ServerConfig,
    pub labels: LabelsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: String::new(),
            date_style: DateStyle::Medium,
            logo: "/images/logo.svg".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            cms: CmsConfig::default(),
            listing: ListingConfig::default(),
            paths: PathsConfig::default(),
            server: ServerConfig::default(),
            labels: LabelsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply CMS endpoint and credential from the environment
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.is_empty() {
                tracing::debug!("Using CMS endpoint from {}", ENDPOINT_ENV);
                self.cms.endpoint = endpoint;
            }
        }
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                self.cms.access_token = Some(token);
            }
        }
    }

    /// Locale used for date formatting
    pub fn locale(&self) -> DateLocale {
        DateLocale::from_tag(&self.language)
    }

    /// Display timezone, falling back to UTC for empty or unknown names
    pub fn tz(&self) -> chrono_tz::Tz {
        if self.timezone.is_empty() {
            return chrono_tz::UTC;
        }
        match self.timezone.parse::<chrono_tz::Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
                chrono_tz::UTC
            }
        }
    }
}

/// Headless CMS connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type of blog posts
    pub document_type: String,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "post".to_string(),
        }
    }
}

/// Which cursor "load more" reads its URL from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    /// Always the statically generated first cursor (repeated clicks refetch page two)
    #[default]
    Initial,
    /// The most recently merged cursor
    Latest,
}

/// Home page listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: u32,
    /// Fields of the post type to fetch, without the type prefix
    pub fields: Vec<String>,
    pub cursor: CursorMode,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 1,
            fields: vec![
                "title".to_string(),
                "subtitle".to_string(),
                "author".to_string(),
            ],
            cursor: CursorMode::Initial,
        }
    }
}

/// Detail page enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub page_size: u32,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { page_size: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listing sessions kept in memory before the oldest is dropped
    pub max_sessions: usize,
    /// Seconds before the fallback placeholder reloads itself
    pub fallback_refresh: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1024,
            fallback_refresh: 1,
        }
    }
}

/// User-facing strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub load_more: String,
    pub loading: String,
    pub reading_time_suffix: String,
    pub not_found: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            load_more: "Carregar mais posts".to_string(),
            loading: "Carregando...".to_string(),
            reading_time_suffix: "min".to_string(),
            not_found: "Post não encontrado".to_string(),
        }
    }
}
