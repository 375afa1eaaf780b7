//! Middleware modules for the API
//!
//! This module contains middleware for authentication, logging, and other
//! cross-cutting concerns.

pub mod auth;
pub mod logging;
