//! Cookie sessions backed by signed JWTs.
//!
//! The token lives in an HttpOnly `session` cookie. "Remember me" logins get
//! a 30-day expiry, others a day.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

pub fn issue(secret: &str, account_id: i64, username: &str, remember: bool) -> anyhow::Result<String> {
    let lifetime = if remember {
        chrono::Duration::days(30)
    } else {
        chrono::Duration::days(1)
    };
    let claims = Claims {
        sub: account_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + lifetime).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// The signed-in user for this request, if the cookie holds a valid token.
pub fn current(jar: &CookieJar, secret: &str) -> Option<Claims> {
    let cookie = jar.get(SESSION_COOKIE)?;
    verify(secret, cookie.value())
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_verify_roundtrip() {
        let token = issue("secret", 7, "ada", false).unwrap();
        let claims = verify("secret", &token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "ada");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = issue("secret", 7, "ada", false).unwrap();
        assert!(verify("other", &token).is_none());
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(verify("secret", "not.a.jwt").is_none());
    }

    #[test]
    fn remember_extends_expiry() {
        let short = issue("secret", 7, "ada", false).unwrap();
        let long = issue("secret", 7, "ada", true).unwrap();
        let short_exp = verify("secret", &short).unwrap().exp;
        let long_exp = verify("secret", &long).unwrap().exp;
        assert!(long_exp > short_exp);
    }
}
