//! Bearer-token authentication for the single demo identity

pub mod middleware;
pub mod models;
pub mod token_store;

pub use middleware::{auth_middleware, bearer_token};
pub use models::{AuthenticatedUser, OptionalUser};
pub use token_store::{Authenticator, Session, TokenStore};
