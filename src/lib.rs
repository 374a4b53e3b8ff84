//! Wallet Auth Server Library
//!
//! Wallet signature login: a client asks for a one-time challenge, signs it
//! with its ed25519 wallet key and exchanges the signature for a session
//! token. Authenticated clients can then read and edit their profile.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod user;
