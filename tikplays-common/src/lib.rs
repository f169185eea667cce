// File: tikplays-common/src/lib.rs
pub mod error;
pub mod models;
pub mod traits;
pub mod sanitize;

pub use error::{Error, ProfileError};
