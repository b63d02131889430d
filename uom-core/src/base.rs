//! Core trait seams.
mod env;
pub use env::Env;
