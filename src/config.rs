use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::util::{is_local_endpoint_url, non_empty_env, query_param};

pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_DASHBOARD_PATH: &str = "/dashboard";
pub const LOGIN_PATH: &str = "/Login";
pub const DEFAULT_HISTORY_LIMIT: usize = 400;
const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the auth provider project, e.g. `https://xyz.supabase.co`.
    pub auth_url: String,
    pub anon_key: Option<String>,
    /// Public URL of the site; provider redirects land under it.
    pub site_url: String,
    pub dashboard_path: String,
    pub prefs_path: Option<PathBuf>,
    pub progress_interval: Duration,
    pub request_timeout: Duration,
    pub history_limit: usize,
    /// One-time code carried by the URL the console was opened from.
    pub reset_code: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let auth_url = non_empty_env("PORTX_AUTH_URL").context("PORTX_AUTH_URL not set")?;
        let anon_key = non_empty_env("PORTX_AUTH_ANON_KEY");
        let site_url =
            non_empty_env("PORTX_SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
        let dashboard_path = non_empty_env("PORTX_DASHBOARD_PATH")
            .unwrap_or_else(|| DEFAULT_DASHBOARD_PATH.to_string());
        let prefs_path = non_empty_env("PORTX_PREFS_PATH").map(PathBuf::from);

        let progress_ms = non_empty_env("PORTX_PROGRESS_INTERVAL_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PROGRESS_INTERVAL_MS)
            .clamp(50, 2000);
        let timeout_secs = non_empty_env("PORTX_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .max(1);
        let history_limit = non_empty_env("PORTX_HISTORY_LIMIT")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_HISTORY_LIMIT);

        let reset_code =
            non_empty_env("PORTX_LAUNCH_URL").and_then(|launch| query_param(&launch, "code"));

        Ok(Self {
            auth_url: auth_url.trim_end_matches('/').to_string(),
            anon_key,
            site_url: site_url.trim_end_matches('/').to_string(),
            dashboard_path,
            prefs_path,
            progress_interval: Duration::from_millis(progress_ms),
            request_timeout: Duration::from_secs(timeout_secs),
            history_limit,
            reset_code,
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("PORTX_AUTH_URL", &self.auth_url),
            ("PORTX_SITE_URL", &self.site_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("Invalid {name} '{url}': expected http:// or https:// URL");
            }
        }

        if !self.is_local_endpoint() && self.anon_key.is_none() {
            bail!(
                "PORTX_AUTH_ANON_KEY must be set for non-local endpoints (url: '{}')",
                self.auth_url
            );
        }

        if !self.dashboard_path.starts_with('/') {
            bail!(
                "Invalid PORTX_DASHBOARD_PATH '{}': expected an absolute path",
                self.dashboard_path
            );
        }

        Ok(())
    }

    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.site_url)
    }

    pub fn update_password_url(&self) -> String {
        format!("{}/auth/update-password", self.site_url)
    }

    fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.auth_url)
    }
}
