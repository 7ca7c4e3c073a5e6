//! Per-second rate tracking.

mod clock;
mod counter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use counter::{RateCounter, RETAINED_SECONDS, SWEEP_INTERVAL};
