//! HTTP client for the todo API
//!
//! The caller owns the [`Session`] and passes it to every protected call, so
//! several independent sessions can share one [`ApiClient`].

pub mod http;
pub mod session;

pub use http::{ApiClient, ClientError};
pub use session::{Session, SessionStore};
