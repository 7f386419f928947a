//! Domain types for periodic indicator governance
//!
//! Performance indicators belong to organizational processes and are
//! collected every month. Values for one process and one month live in a
//! single **submission** that moves through a small approval workflow and
//! is later rolled up into an annual matrix.
//!
//! # Key Concepts
//!
//! - **Indicator**: a catalog entry with a numeric target, a unit, an owning
//!   process and a collection [`Frequency`].
//! - **Period**: a calendar month (`month`, `year`) the submissions are keyed by.
//! - **SubmissionAggregate**: the per-(process, period) bucket holding every
//!   [`IndicatorEntry`] and one shared [`SubmissionStatus`].
//! - **Actor**: the caller identity, role and tenant; what an actor may do is
//!   expressed as [`Capability`] checks rather than role comparisons.
//! - **AnnualMatrixRow**: a derived twelve-month view of one indicator.

#![deny(unsafe_code)]

mod actor;
mod errors;
mod ids;
mod indicator;
mod period;
mod submission;
mod views;

pub use actor::*;
pub use errors::*;
pub use ids::*;
pub use indicator::*;
pub use period::*;
pub use submission::*;
pub use views::*;
