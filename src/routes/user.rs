//! User route definitions

use axum::{routing::get, Router};

use crate::handlers::user::{get_profile, update_profile};
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user/profile", get(get_profile).put(update_profile))
}
