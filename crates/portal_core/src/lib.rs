//! # portal_core - shared primitives
//!
//! Zero-dependency building blocks used by every other portal crate:
//! - **Ids**: generational identifiers and typed handle newtypes
//! - **Timers**: interval timers driven by the host loop's clock
//!
//! Nothing in here touches a platform API. The host loop owns time and
//! passes it in, which keeps every consumer deterministic under test.

pub mod id;
pub mod timer;

pub use id::{Id, IdGenerator};
pub use timer::{IntervalTimer, TimerHandle};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::id::{Id, IdGenerator};
    pub use crate::timer::{IntervalTimer, TimerHandle};
}
