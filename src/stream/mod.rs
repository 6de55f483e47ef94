//! Stream combinators for monitor subscriptions

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
