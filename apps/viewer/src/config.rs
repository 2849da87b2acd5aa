use std::{env::var, path::PathBuf, str::FromStr};

use anyhow::{Context, Result, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Yahoo,
    Alpaca,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "alpaca" => Ok(ProviderKind::Alpaca),
            other => bail!("unknown provider '{other}', expected yahoo or alpaca"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlpacaCredentials {
    pub base_api: String,
    pub key_id: String,
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub yahoo_base_url: String,
    pub alpaca: Option<AlpacaCredentials>,
    pub preview_path: Option<PathBuf>,
    pub export_width: u32,
    pub export_height: u32,
    pub discard_stale: bool,
    pub version: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let provider = match get("VIEWER_PROVIDER") {
            Some(v) => v.parse()?,
            None => ProviderKind::Yahoo,
        };

        let alpaca = match provider {
            ProviderKind::Alpaca => {
                let required = |key: &str| {
                    get(key).with_context(|| format!("{key} environment variable not set"))
                };
                Some(AlpacaCredentials {
                    base_api: required("APCA_API_BASE_URL")?,
                    key_id: required("APCA_API_KEY_ID")?,
                    secret: required("APCA_API_SECRET_KEY")?,
                })
            }
            ProviderKind::Yahoo => None,
        };

        let parse_u32 = |key: &str, default: u32| -> Result<u32> {
            get(key)
                .map(|v| v.trim().parse::<u32>().with_context(|| format!("{key} must be a positive integer")))
                .transpose()
                .map(|v| v.unwrap_or(default))
        };

        let discard_stale = match get("VIEWER_DISCARD_STALE") {
            Some(v) => parse_bool(&v).with_context(|| "VIEWER_DISCARD_STALE must be true or false")?,
            None => true,
        };

        Ok(Self {
            provider,
            yahoo_base_url: get("YAHOO_BASE_URL")
                .unwrap_or_else(|| stock::providers::YAHOO_BASE_URL.to_string()),
            alpaca,
            preview_path: get("VIEWER_PREVIEW_PATH").map(PathBuf::from),
            export_width: parse_u32("VIEWER_EXPORT_WIDTH", 1500)?,
            export_height: parse_u32("VIEWER_EXPORT_HEIGHT", 900)?,
            discard_stale,
            version: get("APP_VERSION").unwrap_or_else(|| "Unknown".to_string()),
        })
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
