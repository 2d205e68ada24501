//! Worker runtime primitives shared by the reckon crates.
//!
//! Everything that puts work on a tokio runtime goes through [`spawn`] or
//! [`spawn_blocking`] so tasks carry a [`TaskClass`] in their trace events and
//! land on the caller's runtime when one is active.

mod class;
mod panic;
mod slot;
mod spawn;
mod token;

pub use class::TaskClass;
pub use panic::join_error_panic_message;
pub use slot::{PendingSlot, SlotOffer};
pub use spawn::{spawn, spawn_blocking};
pub use token::{GenerationClock, GenerationScope, GenerationToken};
