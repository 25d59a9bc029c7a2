//! # carpark-runner - Script Process Management
//!
//! Resolves command names to external programs and runs them, exposing stdout
//! as an ordered sequence of lines and capturing stderr for diagnostics.
//!
//! Depends on [`carpark_core`] for error handling.
//!
//! ## Public API
//!
//! ### Resolution
//! - [`ScriptResolver`] - Static table of command name to [`LaunchSpec`]
//! - [`LaunchSpec`] - Program, arguments and working directory of one command
//!
//! ### Process Management
//! - [`ScriptProcess`] - A running child process read line by line
//! - [`ProcessExit`] - Exit information of a successful run

pub mod process;
pub mod resolver;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use process::{ProcessExit, ScriptProcess};
pub use resolver::{LaunchSpec, ScriptResolver};
