//! Web session gateway: login, profile view, logout, deletion.
//!
//! Reads the same account table the registration bot writes; passwords are
//! checked through portico-credentials and sessions ride a JWT cookie.

pub mod handlers;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use portico_db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    /// JWT signing secret for session cookies.
    pub secret: String,
    /// Bot username the `/register` route points at.
    pub bot_name: String,
}

pub fn router(state: AppState, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/register", get(handlers::register_redirect))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/account/{username}", get(handlers::account))
        .route("/logout", get(handlers::logout))
        .route("/delete/{id}", get(handlers::delete))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
