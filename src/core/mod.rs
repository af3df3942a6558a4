//! Domain logic and HTTP endpoints

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod todos;
pub mod validation;
