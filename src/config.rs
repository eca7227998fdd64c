// src/config.rs

use color_eyre::eyre::{Result, WrapErr};
use std::net::SocketAddr;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_POLL_SECS: u64 = 60;
pub const DEFAULT_PAGE_LEN: usize = 20;

/// FOFA search API credentials, read from the environment. The FOFA scanner
/// is skipped entirely when they are absent.
#[derive(Debug, Clone)]
pub struct FofaCredentials {
    pub email: String,
    pub key: String,
}

/// Runtime configuration, environment-driven with sensible defaults. CLI
/// flags override individual fields after loading.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the gateway binds to in the `serve` role.
    pub bind: SocketAddr,
    /// Base URL the dashboard talks to in the `dash` role.
    pub server_url: String,
    /// Period of the dashboard's aggregate status poll.
    pub poll_secs: u64,
    /// Page length of the domain table.
    pub page_len: usize,
    pub fofa: Option<FofaCredentials>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind = std::env::var("OUTPOST_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .wrap_err("OUTPOST_BIND is not a valid socket address")?;

        let server_url = std::env::var("OUTPOST_SERVER")
            .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let poll_secs = match std::env::var("OUTPOST_POLL_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .wrap_err("OUTPOST_POLL_SECS is not a number")?,
            Err(_) => DEFAULT_POLL_SECS,
        };

        let page_len = match std::env::var("OUTPOST_PAGE_LEN") {
            Ok(raw) => raw
                .parse::<usize>()
                .wrap_err("OUTPOST_PAGE_LEN is not a number")?,
            Err(_) => DEFAULT_PAGE_LEN,
        };

        // Both halves of the credential pair are required for the scanner to
        // be usable at all.
        let fofa = match (std::env::var("FOFA_EMAIL"), std::env::var("FOFA_KEY")) {
            (Ok(email), Ok(key)) if !email.is_empty() && !key.is_empty() => {
                Some(FofaCredentials { email, key })
            }
            _ => None,
        };

        Ok(Self {
            bind,
            server_url,
            poll_secs,
            page_len,
            fofa,
        })
    }
}
