//! One-time notices carried to the next rendered page in a signed cookie.

use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::HttpRequest;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::session::read_signed;

pub const FLASH_COOKIE: &str = "_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Message,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Message,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

/// Cookie holding `messages`, unsigned. Sign it before sending.
///
/// The JSON is URL-safe base64, which request parsing passes through
/// untouched, so the signature checks against the same bytes it was made over.
pub fn flash_cookie(messages: &[FlashMessage], secure: bool) -> Cookie<'static> {
    let json = serde_json::to_string(messages).unwrap_or_else(|_| "[]".to_string());
    Cookie::build(FLASH_COOKIE, URL_SAFE_NO_PAD.encode(json))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish()
}

/// Pending flash messages on the request. Tampered or garbled cookies
/// read as empty.
pub fn read_flashes(req: &HttpRequest, key: &Key) -> Vec<FlashMessage> {
    let Some(cookie) = read_signed(req, key, FLASH_COOKIE) else {
        return Vec::new();
    };

    URL_SAFE_NO_PAD
        .decode(cookie.value())
        .ok()
        .and_then(|json| serde_json::from_slice(&json).ok())
        .unwrap_or_default()
}
