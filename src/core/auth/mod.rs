//! Authentication module for todoapp
//!
//! - JWT session token issue and verification
//! - User registration and login
//! - The `AuthUser` extractor that gates protected routes
//! - REST API endpoints for auth operations

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod service;

pub use api::auth_api_router;
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::{AuthUser, bearer_token};
pub use service::{AuthError, AuthResponse, AuthService, LoginRequest, RegisterRequest};
