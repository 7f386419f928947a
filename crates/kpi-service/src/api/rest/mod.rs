//! REST API under `/api/v1`

pub mod caller;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;
