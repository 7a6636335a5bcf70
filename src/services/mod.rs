//! Business logic services

pub mod preview;
pub mod pricing;
pub mod recurrence;
pub mod time_points;
pub mod verification;
