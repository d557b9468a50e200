// idcon-api: Async Rust client for the identity repository REST API

pub mod auth;
pub mod error;
pub mod rest;
pub mod transport;

pub use auth::{Credentials, DEFAULT_DOMAIN};
pub use error::{ClientException, Error};
pub use rest::models::*;
pub use rest::{ListQuery, RestClient};
pub use transport::{TlsMode, TransportConfig};
