pub mod clock;
pub mod durable_tier;
pub mod keys;
pub mod memory_tier;
pub mod types;
mod core;

pub use clock::{Clock, ManualClock, SystemClock};
pub use core::TieredCache;
pub use durable_tier::DurableTier;
pub use keys::cache_key;
pub use memory_tier::MemoryTier;
pub use types::*;
