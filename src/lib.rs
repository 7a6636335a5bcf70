//! Domovik Engine - booking schedule and price preview engine
//!
//! Embedded library behind the booking wizard and the admin verification
//! screen. Validates candidate occurrence times, manages chosen time point
//! sets, builds recurrence descriptors, reconciles price previews across
//! three external pricing operations, and prioritizes the unverified booking
//! queue. Transport, persistence and authentication stay with the host
//! application behind the traits in [`services::pricing`].

pub mod config;
pub mod defaults;
pub mod error;
pub mod services;
pub mod types;

pub use config::{BookingRules, BusinessHours};
pub use error::{PreviewError, ValidationError};
