pub mod error;
pub mod filter;
pub mod post;
pub mod user;
pub mod validation;
