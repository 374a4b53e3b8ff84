//! User directory: wallet-keyed user records and their profiles

mod repository;
mod service;

pub use repository::{InMemoryUserRepository, PgUserRepository, RepositoryError, UserRepository};
pub use service::{UserError, UserService};
