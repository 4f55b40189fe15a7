//! Logging shims.
//!
//! `debug!` and `warn!` forward to `tracing` when the `tracing` feature is on.
//! Without it they swallow their arguments, so call sites need no `cfg`.

#[cfg(feature = "tracing")]
pub use tracing::{debug, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($tokens:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($tokens:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub use crate::{debug, warn};
