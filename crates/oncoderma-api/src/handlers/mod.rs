pub mod analysis;
pub mod auth;
pub mod root;
