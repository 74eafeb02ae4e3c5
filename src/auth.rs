//! Credential parsing and request headers.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::types::{Capability, RelayContext};
use crate::{Error, ErrorContext, Result};

/// Separator between app id and token in a composite credential.
pub const CREDENTIAL_DELIMITER: char = '|';

/// App identity for capabilities that authenticate with an app/token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct AppCredential {
    pub app_id: String,
    pub token: String,
}

impl std::fmt::Debug for AppCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredential")
            .field("app_id", &self.app_id)
            .field("token", &redact(&self.token))
            .finish()
    }
}

/// Split `"<app_id>|<token>"`. Exactly two non-empty parts are accepted.
pub fn parse_app_credential(raw: &str) -> Result<AppCredential> {
    let parts: Vec<&str> = raw.split(CREDENTIAL_DELIMITER).collect();
    match parts.as_slice() {
        [app_id, token] if !app_id.is_empty() && !token.is_empty() => Ok(AppCredential {
            app_id: (*app_id).to_string(),
            token: (*token).to_string(),
        }),
        _ => Err(Error::auth_with_context(
            "invalid credential format, expected appid|token",
            ErrorContext::new()
                .with_details(format!("{} part(s)", parts.len()))
                .with_source("auth"),
        )),
    }
}

/// Short, log-safe prefix of a secret.
pub fn redact(secret: &str) -> String {
    const KEEP: usize = 4;
    match secret.char_indices().nth(KEEP) {
        Some((idx, _)) => format!("{}...", &secret[..idx]),
        None if secret.is_empty() => String::new(),
        None => "...".to_string(),
    }
}

/// Outbound headers for the vendor call.
///
/// Audio synthesis authenticates with `Bearer;<token>` (the vendor's own
/// delimiter). Everything else, image edits included, sends JSON content type
/// and a plain bearer credential.
pub fn request_headers(ctx: &RelayContext) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let authorization = if ctx.capability.needs_app_credential() {
        let cred = parse_app_credential(&ctx.credential)?;
        format!("Bearer;{}", cred.token)
    } else {
        if ctx.capability == Capability::ImageEdit {
            tracing::debug!("image edit: forcing JSON content type on multipart body");
        }
        format!("Bearer {}", ctx.credential)
    };

    let mut value = HeaderValue::from_str(&authorization).map_err(|_| {
        Error::auth_with_context(
            "credential contains characters not allowed in a header",
            ErrorContext::new().with_source("auth"),
        )
    })?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}
