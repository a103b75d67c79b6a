pub mod client;
pub mod error;
pub mod models;
pub mod payload;

pub use client::ApiClient;
pub use error::ApiError;
