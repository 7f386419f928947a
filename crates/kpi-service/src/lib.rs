//! kpid library
//!
//! REST surface of the indicator governance engine:
//! - caller context from gateway headers
//! - monthly grid, bulk save, submit/validate/reject, annual matrix
//! - catalog administration and audit read-out

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use api::create_router;
pub use api::rest::state::AppState;
pub use config::ServiceConfig;
pub use error::{ApiError, ServiceError};
pub use server::{bootstrap, Server};
