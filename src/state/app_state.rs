//! Application state shared across handlers

use std::sync::Arc;

use crate::auth::{AuthService, TokenIssuer};
use crate::user::UserService;

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub token_issuer: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>, user_service: Arc<UserService>) -> Self {
        let token_issuer = auth_service.tokens().clone();
        Self {
            auth_service,
            user_service,
            token_issuer,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<UserService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.user_service.clone()
    }
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.token_issuer.clone()
    }
}
