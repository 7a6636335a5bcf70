//! Type definitions

pub mod draft;
pub mod pricing;
pub mod queue;
pub mod recurrence;
pub mod schedule;

pub use draft::*;
pub use pricing::*;
pub use queue::*;
pub use recurrence::*;
pub use schedule::*;
