//! todoapp - a todo-list service with bearer-token sessions
//!
//! The server side lives in [`core`] and is assembled by [`app`]; [`client`] is a
//! typed HTTP client for the same API.

pub mod app;
pub mod client;
pub mod core;
