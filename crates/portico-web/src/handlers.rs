//! Route handlers for the session gateway.
//!
//! Registration itself happens in the chat bot; `/register` only points
//! there. Pages are minimal inline HTML — this gateway exists to exercise
//! the account store and credential service, not to be pretty.

use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use portico_db::models::AccountRow;

use crate::AppState;
use crate::session;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Checkbox: present ("on") when ticked.
    pub remember: Option<String>,
}

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Response {
    match session::current(&jar, &state.secret) {
        Some(claims) => Redirect::to(&format!("/account/{}", claims.username)).into_response(),
        None => Html(login_form()).into_response(),
    }
}

/// Registration happens in the chat, so this just points at the bot.
pub async fn register_redirect(State(state): State<AppState>) -> Redirect {
    Redirect::to(&format!("https://t.me/{}", state.bot_name))
}

pub async fn login_page() -> Redirect {
    Redirect::to("/")
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, StatusCode> {
    let account = state
        .db
        .find_by_email(&form.email)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let Some(account) = account else {
        warn!(email = %form.email, "login attempt for unknown email");
        return Ok(Redirect::to("/").into_response());
    };

    if !portico_credentials::verify_password(&form.password, &account.password) {
        warn!(email = %form.email, "login attempt with bad password");
        return Ok(Redirect::to("/").into_response());
    }

    let remember = form.remember.is_some();
    let token = session::issue(&state.secret, account.id, &account.username, remember)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    info!(account_id = account.id, "login");
    let jar = jar.add(session::session_cookie(token));
    Ok((jar, Redirect::to(&format!("/account/{}", account.username))).into_response())
}

pub async fn account(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(username): Path<String>,
) -> Result<Response, StatusCode> {
    let Some(claims) = session::current(&jar, &state.secret) else {
        return Ok(Redirect::to("/").into_response());
    };

    let account = state
        .db
        .find_by_username(&username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let Some(account) = account else {
        return Ok(not_found().await.into_response());
    };

    // Profiles are self-only.
    if claims.sub != account.id {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(Html(account_page(&account)).into_response())
}

pub async fn logout(jar: CookieJar) -> Response {
    let jar = jar.remove(session::clear_cookie());
    (jar, Redirect::to("/")).into_response()
}

pub async fn delete(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, StatusCode> {
    let Some(claims) = session::current(&jar, &state.secret) else {
        return Ok(Redirect::to("/").into_response());
    };

    // Only your own account.
    if claims.sub != id {
        return Ok(Redirect::to("/").into_response());
    }

    let removed = state
        .db
        .delete_account(id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if removed {
        info!(account_id = id, "account deleted");
    }

    let jar = jar.remove(session::clear_cookie());
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Html(page(
            "Page not found",
            "<h1>404</h1><p>Page not found. <a href=\"/\">Home</a></p>",
        )),
    )
}

/// Minimal HTML escaping for user-supplied text. Chat-profile names and
/// emails are arbitrary input and must not reach the page verbatim.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body>{body}</body></html>"
    )
}

fn login_form() -> String {
    page(
        "Portico",
        "<h1>Sign in</h1>\
         <form method=\"post\" action=\"/login\">\
         <label>Email <input type=\"email\" name=\"email\" required></label><br>\
         <label>Password <input type=\"password\" name=\"password\" required></label><br>\
         <label><input type=\"checkbox\" name=\"remember\"> Remember me</label><br>\
         <button type=\"submit\">Sign in</button>\
         </form>\
         <p>No account yet? <a href=\"/register\">Register via the bot</a></p>",
    )
}

fn account_page(account: &AccountRow) -> String {
    let image = account
        .image
        .as_deref()
        .map(|path| {
            format!(
                "<img src=\"/static/{}\" alt=\"profile photo\" width=\"160\">",
                escape(path)
            )
        })
        .unwrap_or_default();
    let name = escape(format!("{} {}", account.first_name, account.last_name).trim());
    let username = escape(&account.username);

    page(
        &username,
        &format!(
            "<h1>{username}</h1>{image}\
             <p>{name}</p>\
             <p>Email: {email}</p>\
             <p><a href=\"/logout\">Log out</a> · \
             <a href=\"/delete/{id}\">Delete account</a></p>",
            email = escape(&account.email),
            id = account.id,
        ),
    )
}
