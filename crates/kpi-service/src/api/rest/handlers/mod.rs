//! REST API handlers

mod catalog;
mod grid;
mod health;
mod matrix;
mod submissions;

pub use catalog::*;
pub use grid::*;
pub use health::*;
pub use matrix::*;
pub use submissions::*;
