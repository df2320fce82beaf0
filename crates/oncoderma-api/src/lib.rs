//! OncoDerma API Library
//!
//! HTTP handlers, middleware and application setup for the analysis service.

pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod middleware;
pub mod setup;
pub mod state;
mod utils;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
