pub mod auth;
pub mod error;
pub mod server;
pub mod types;

pub use auth::{GoogleTokenVerifier, StaticTokenVerifier};
pub use error::ApiError;
pub use server::{router, AppState, AuthUser, GatewayServer};
