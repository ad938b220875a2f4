use crate::auth::AuthGateway;
use crate::config::{DEFAULT_DASHBOARD_PATH, LOGIN_PATH};
use reqwest::Url;


/// Inbound request to the OAuth/email-confirmation callback.
#[derive(Debug, Clone)]
pub struct CallbackRequest {
    /// Full callback URL including `code` and optional `next` parameters.
    pub url: String,
    /// Value of `x-forwarded-host` when running behind a proxy.
    pub forwarded_host: Option<String>,
    /// Development mode: always redirect back to the request origin.
    pub local_env: bool,
}

/// Exchange the callback code for a session and pick the redirect target.
///
/// Missing code, a failed exchange, or an unparsable URL all land on the
/// login page.
pub async fn resolve_callback(gateway: &dyn AuthGateway, request: &CallbackRequest) -> String {
    let Ok(url) = Url::parse(request.url.trim()) else {
        tracing::warn!(url = %request.url, "unparsable callback url");
        return LOGIN_PATH.to_string();
    };
    let origin = url.origin().ascii_serialization();

    let mut code = None;
    let mut next = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "next" => next = Some(value.into_owned()),
            _ => {}
        }
    }
    let next = next
        .filter(|path| path.starts_with('/'))
        .unwrap_or_else(|| DEFAULT_DASHBOARD_PATH.to_string());

    if let Some(code) = code {
        let result = gateway.exchange_code_for_session(&code).await;
        if result.is_success() {
            tracing::info!(next = %next, "callback exchange succeeded");
            return match (&request.forwarded_host, request.local_env) {
                (_, true) | (None, false) => format!("{origin}{next}"),
                (Some(host), false) => format!("https://{host}{next}"),
            };
        }
        tracing::warn!(error = ?result.error, "callback exchange failed");
    }

    format!("{origin}{LOGIN_PATH}")
}
