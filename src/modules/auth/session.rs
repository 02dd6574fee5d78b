//! Session cookie handling and the request extractors built on it.
//!
//! The cookie carries a signed session token; the token maps to a row in
//! the `sessions` table, which maps to a user.

use std::future::{ready, Ready};

use actix_web::cookie::{time, Cookie, CookieJar, Key, SameSite};
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::storage::User;

pub const SESSION_COOKIE: &str = "session";

/// Sign `cookie` with `key`.
pub fn sign(key: &Key, cookie: Cookie<'static>) -> Cookie<'static> {
    let name = cookie.name().to_string();
    let mut jar = CookieJar::new();
    jar.signed_mut(key).add(cookie.clone());
    jar.get(&name).cloned().unwrap_or(cookie)
}

/// Read cookie `name` and verify its signature.
pub fn read_signed(req: &HttpRequest, key: &Key, name: &str) -> Option<Cookie<'static>> {
    let cookie = req.cookie(name)?;
    let mut jar = CookieJar::new();
    jar.add_original(cookie);
    jar.signed(key).get(name)
}

/// Session cookie for `token`. `SameSite=Lax` keeps it off cross-site form
/// posts; `secure` restricts it to HTTPS.
pub fn session_cookie(token: &str, ttl_hours: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::hours(ttl_hours))
        .finish()
}

/// Expired cookie telling the browser to drop `name`.
pub fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(name.to_string(), "")
        .path("/")
        .max_age(time::Duration::seconds(0))
        .finish()
}

pub fn session_token(req: &HttpRequest, key: &Key) -> Option<String> {
    read_signed(req, key, SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Resolve the caller's user from the session cookie.
pub fn load_user(req: &HttpRequest) -> AppResult<Option<User>> {
    let ctx = req
        .app_data::<web::Data<AppContext>>()
        .ok_or_else(|| AppError::Config("application context is not registered".to_string()))?;

    let Some(token) = session_token(req, &ctx.key) else {
        return Ok(None);
    };

    let db = ctx.db()?;
    Ok(db.get_session_user(&token, ctx.session_ttl())?)
}

/// The caller, if logged in.
pub struct Viewer(pub Option<User>);

impl FromRequest for Viewer {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(load_user(req).map(Viewer))
    }
}

/// A logged-in caller. Rejects anonymous requests with 401.
pub struct AuthUser(pub User);

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(match load_user(req) {
            Ok(Some(user)) => Ok(AuthUser(user)),
            Ok(None) => Err(AppError::Unauthorized),
            Err(e) => Err(e),
        })
    }
}

/// The administrator. Anyone else, logged in or not, gets 403.
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(match load_user(req) {
            Ok(Some(user)) if user.is_admin() => Ok(AdminUser(user)),
            Ok(Some(user)) => {
                log::warn!("User {} denied access to {}", user.id, req.path());
                Err(AppError::Forbidden)
            }
            Ok(None) => Err(AppError::Forbidden),
            Err(e) => Err(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_signed_session_token() {
        let key = Key::generate();
        let cookie = sign(&key, session_cookie("abc-123", 24, false));
        assert_ne!(cookie.value(), "abc-123");

        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(session_token(&req, &key).as_deref(), Some("abc-123"));

        let other_key = Key::generate();
        assert!(session_token(&req, &other_key).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc-123", 24, false);
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));

        let secure = session_cookie("abc-123", 24, true);
        assert_eq!(secure.secure(), Some(true));
    }

    #[test]
    fn test_removal_cookie_expires() {
        let cookie = removal_cookie(SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
