//! Progress throttling for bucket transfers.
//!
//! Transports report every chunk; subscribers only need a few updates per
//! second.

mod throttle;

pub use throttle::ProgressThrottle;
