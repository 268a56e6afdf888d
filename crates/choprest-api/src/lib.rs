// choprest-api: Async Rust client for the choprest restaurant REST API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::RestaurantClient;
pub use error::Error;
pub use models::Restaurant;
pub use transport::TransportConfig;
