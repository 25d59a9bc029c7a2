//! # carpark-core - Core Domain Types
//!
//! Foundation crate for carpark. Provides domain types, error handling and
//! logging setup shared by the runner, the server and the binary.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, uuid, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`LogMessage`] - One line of process output with its timestamp
//! - [`CommandResult`] - Final result of a successful command invocation
//! - [`InvocationId`] - Unique identifier of one command invocation
//! - [`InvocationPhase`] - Lifecycle phase of an invocation
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `recoverable` classification
//! - [`ErrorKind`] - Coarse error category carried on the wire
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ### Logging (`logging`)
//! - [`logging::init()`] - Install the global tracing subscriber
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use carpark_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all carpark crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use types::{CommandResult, InvocationId, InvocationPhase, LogMessage};
